use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::HarnessConfig;
use crate::git::Git;
use crate::workdir::WorkDir;

#[derive(Debug, Clone)]
pub struct CloneOptions {
    pub local_path: PathBuf,
    /// Falls back to the configured remote name.
    pub remote_name: Option<String>,
    /// Where to put the bare clone; a temporary directory when absent.
    pub remote_path: Option<PathBuf>,
    pub set_upstream_branches: bool,
}

impl CloneOptions {
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_name: None,
            remote_path: None,
            set_upstream_branches: true,
        }
    }
}

/// Bare-clones `local_path`, registers the clone as a remote of `local_path`
/// and fetches it. With `set_upstream_branches`, every local branch then
/// tracks its namesake on the new remote.
pub fn clone_remote(cfg: &HarnessConfig, opts: &CloneOptions) -> Result<WorkDir> {
    let remote = match &opts.remote_path {
        Some(path) => WorkDir::borrowed(path),
        None => WorkDir::allocate().context("failed to allocate remote directory")?,
    };
    let remote_name = opts.remote_name.as_deref().unwrap_or(&cfg.remote_name);
    let local = Git::new(&opts.local_path);
    debug!(
        local = %opts.local_path.display(),
        remote = %remote.path().display(),
        remote_name,
        "cloning bare remote"
    );

    // git resolves relative paths against the local repository, not our cwd.
    let remote_path = std::path::absolute(remote.path())
        .with_context(|| format!("failed to resolve {}", remote.path().display()))?;
    local.clone_bare(&remote_path)?;
    local.add_remote(remote_name, &remote_path)?;
    local.fetch_remote(remote_name)?;

    if opts.set_upstream_branches {
        for branch in local.local_branches()? {
            local.set_upstream(&branch, remote_name)?;
        }
    }
    Ok(remote)
}
