use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::GitCommandFailed;

/// Runs git inside one working directory. Every call blocks until git exits.
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn init(&self) -> Result<()> {
        self.run(["init"])
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.run(["config", key, value])
    }

    pub fn config_value(&self, key: &str) -> Result<Option<String>> {
        let output = Command::new("git")
            .current_dir(&self.root)
            .args(["config", "--get", key])
            .output()
            .with_context(|| format!("failed to read {key}"))?;
        if !output.status.success() {
            return Ok(None);
        }
        let value = String::from_utf8(output.stdout)?.trim().to_string();
        Ok(Some(value))
    }

    /// Creates `name` at the current HEAD (or as the unborn branch) and switches to it.
    pub fn create_and_switch(&self, name: &str) -> Result<()> {
        self.run(["checkout", "-b", name])
    }

    pub fn checkout(&self, rev: &str) -> Result<()> {
        self.run(["checkout", "-q", rev])
    }

    pub fn add_all(&self) -> Result<()> {
        self.run(["add", "-A"])
    }

    pub fn commit_allow_empty(&self, message: &str) -> Result<()> {
        self.run(["commit", "--allow-empty", "-m", message])
    }

    pub fn tag(&self, name: &str) -> Result<()> {
        self.run(["tag", name])
    }

    /// Deletes tracked and untracked content, leaving `.git` in place.
    pub fn remove_all(&self) -> Result<()> {
        self.run(["rm", "-r", "-q", "--ignore-unmatch", "--", "."])?;
        self.run(["clean", "-f", "-d", "-x", "-q"])
    }

    pub fn current_branch(&self) -> Result<String> {
        self.capture(["branch", "--show-current"])
            .map(|s| s.trim().to_string())
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        let out = self.capture(["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(out
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Raw `git branch` output, current branch starred.
    pub fn branch_listing(&self) -> Result<String> {
        self.capture(["branch"])
    }

    pub fn last_commit(&self) -> Result<String> {
        self.capture(["log", "-1"])
    }

    pub fn status_porcelain(&self) -> Result<String> {
        self.capture(["status", "--porcelain"])
    }

    pub fn head_sha(&self, rev: &str) -> Result<String> {
        self.capture(["rev-parse", rev])
            .map(|s| s.trim().to_string())
    }

    pub fn tags(&self) -> Result<Vec<String>> {
        let out = self.capture(["tag", "--list"])?;
        Ok(out.lines().map(|l| l.trim().to_string()).collect())
    }

    /// Bare-clones this repository into `destination` (absolute, or relative to `root`).
    pub fn clone_bare(&self, destination: &Path) -> Result<()> {
        let destination = destination.to_string_lossy().to_string();
        self.run(["clone", "--bare", "-q", ".", &destination])
    }

    pub fn add_remote(&self, name: &str, url: &Path) -> Result<()> {
        let url = url.to_string_lossy().to_string();
        self.run(["remote", "add", name, &url])
    }

    pub fn fetch_remote(&self, remote: &str) -> Result<()> {
        self.run(["fetch", "-q", remote])
    }

    pub fn set_upstream(&self, branch: &str, remote: &str) -> Result<()> {
        let upstream = format!("{remote}/{branch}");
        self.run(["branch", "-q", &format!("--set-upstream-to={upstream}"), branch])
    }

    pub fn upstream_of(&self, branch: &str) -> Result<Option<String>> {
        let upstream = self.capture([
            "for-each-ref",
            "--format=%(upstream:short)",
            &format!("refs/heads/{branch}"),
        ])?;
        let upstream = upstream.trim();
        if upstream.is_empty() {
            return Ok(None);
        }
        Ok(Some(upstream.to_string()))
    }

    pub fn capture<const N: usize>(&self, args: [&str; N]) -> Result<String> {
        debug!(cwd = %self.root.display(), "git {}", args.join(" "));
        let output = Command::new("git")
            .current_dir(&self.root)
            .args(args)
            .output()
            .with_context(|| format!("failed to run git {:?}", args))?;
        if !output.status.success() {
            return Err(GitCommandFailed {
                args: args.iter().map(|a| a.to_string()).collect(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }
            .into());
        }
        let stdout = String::from_utf8(output.stdout)?;
        debug!("{}", stdout.trim_end());
        Ok(stdout)
    }

    pub fn run<const N: usize>(&self, args: [&str; N]) -> Result<()> {
        self.capture(args).map(|_| ())
    }
}
