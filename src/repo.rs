use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::HarnessConfig;
use crate::git::Git;
use crate::workdir::WorkDir;

#[derive(Debug, Clone, Copy)]
pub struct CommitOptions<'a> {
    pub cwd: &'a Path,
    pub message: Option<&'a str>,
    pub tag: Option<&'a str>,
}

impl<'a> CommitOptions<'a> {
    pub fn new(cwd: &'a Path) -> Self {
        Self {
            cwd,
            message: None,
            tag: None,
        }
    }

    pub fn message(mut self, message: &'a str) -> Self {
        self.message = Some(message);
        self
    }

    pub fn tag(mut self, tag: &'a str) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// Initializes a repository with the fixed identity and merge-tool settings
/// and gives it a root commit.
///
/// Without `cwd` a fresh temporary directory is allocated. With
/// `default_branch` the root commit lands on that branch instead of whatever
/// the ambient `init.defaultBranch` says.
pub fn git_init(
    cfg: &HarnessConfig,
    cwd: Option<&Path>,
    default_branch: Option<&str>,
) -> Result<WorkDir> {
    let workdir = match cwd {
        Some(path) => {
            std::fs::create_dir_all(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            WorkDir::borrowed(path)
        }
        None => WorkDir::allocate().context("failed to allocate repository directory")?,
    };
    debug!(path = %workdir.path().display(), "initializing repository");

    let git = Git::new(workdir.path());
    git.init()?;
    git.set_config("user.email", &cfg.author_email)?;
    git.set_config("user.name", &cfg.author_name)?;
    git.set_config("merge.tool", &cfg.merge_tool)?;
    git.set_config(
        "mergetool.keepBackup",
        if cfg.merge_tool_keep_backup {
            "true"
        } else {
            "false"
        },
    )?;
    git.set_config("commit.gpgsign", "false")?;
    git.set_config("core.excludesFile", "")?;

    if let Some(branch) = default_branch
        && git.current_branch()? != branch
    {
        git.create_and_switch(branch)?;
    }

    commit(cfg, CommitOptions::new(workdir.path()))?;
    Ok(workdir)
}

/// Stages everything and commits, even when nothing changed, so every call
/// yields exactly one new commit.
pub fn commit(cfg: &HarnessConfig, opts: CommitOptions<'_>) -> Result<()> {
    let git = Git::new(opts.cwd);
    let message = opts.message.unwrap_or(&cfg.init_commit_message);

    git.add_all()?;
    git.commit_allow_empty(message)?;
    if let Some(tag) = opts.tag {
        git.tag(tag)?;
    }
    Ok(())
}
