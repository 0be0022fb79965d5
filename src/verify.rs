use std::path::PathBuf;

use anyhow::{Context, Result};
use predicates::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::config::HarnessConfig;
use crate::error::{AssertionFailed, FatalMarkerFound};
use crate::git::Git;

/// How a subject run ended, before verification.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// The subject reported a problem on stderr; inspectable by the test.
    HandledFailure(String),
    /// The run itself broke (spawn failure, timeout, ...). Never inspectable.
    Fatal(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verified<T> {
    Result(T),
    Stderr(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult<T> {
    #[serde(flatten)]
    pub outcome: Verified<T>,
    /// `git status --porcelain`, present unless git checks were skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl<T> VerificationResult<T> {
    pub fn result(&self) -> Option<&T> {
        match &self.outcome {
            Verified::Result(value) => Some(value),
            Verified::Stderr(_) => None,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match &self.outcome {
            Verified::Stderr(text) => Some(text),
            Verified::Result(_) => None,
        }
    }
}

/// Where and what to check once a subject has exited.
#[derive(Debug, Clone)]
pub struct ExitCheck {
    pub cwd: PathBuf,
    pub commit_message: String,
    pub no_git: bool,
}

impl ExitCheck {
    pub fn new(cwd: impl Into<PathBuf>, commit_message: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            commit_message: commit_message.into(),
            no_git: false,
        }
    }

    pub fn no_git(mut self, no_git: bool) -> Self {
        self.no_git = no_git;
        self
    }
}

/// Turns an outcome into a verification result.
///
/// Handled failures must not contain a fatal marker. Unless `no_git` is set,
/// the latest commit must carry the fixture author and `commit_message`, the
/// repository must sit on the secondary branch with the default branch
/// intact, and the working-tree status is attached.
pub fn process_exit<T>(
    cfg: &HarnessConfig,
    outcome: Outcome<T>,
    check: &ExitCheck,
) -> Result<VerificationResult<T>> {
    let outcome = match outcome {
        Outcome::Success(value) => Verified::Result(value),
        Outcome::HandledFailure(stderr) => {
            check_fatal_markers(cfg, &stderr)?;
            Verified::Stderr(stderr)
        }
        Outcome::Fatal(err) => return Err(err.context("subject run failed")),
    };

    if check.no_git {
        return Ok(VerificationResult {
            outcome,
            status: None,
        });
    }

    let git = Git::new(&check.cwd);
    assert_last_commit(cfg, &git, &check.commit_message)?;
    assert_branch_state(cfg, &git)?;
    let status = git.status_porcelain()?;
    debug!(%status, "post-run working tree status");

    Ok(VerificationResult {
        outcome,
        status: Some(status),
    })
}

pub fn check_fatal_markers(cfg: &HarnessConfig, stderr: &str) -> Result<()> {
    for marker in &cfg.fatal_markers {
        if predicate::str::contains(marker.as_str()).eval(stderr) {
            return Err(FatalMarkerFound {
                marker: marker.clone(),
                stderr: stderr.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

pub fn assert_last_commit(cfg: &HarnessConfig, git: &Git, commit_message: &str) -> Result<()> {
    let log = git.last_commit()?;
    ensure(
        predicate::str::contains(cfg.author_line()),
        &log,
        "last commit author",
    )?;
    ensure(
        predicate::str::contains(commit_message),
        &log,
        "last commit message",
    )
}

pub fn assert_branch_state(cfg: &HarnessConfig, git: &Git) -> Result<()> {
    let listing = git.branch_listing()?;
    ensure(branch_state_predicate(cfg)?, &listing, "branch listing")
}

/// Matches `git branch` output in which the secondary branch is current and
/// the default branch is present. Other branches may appear anywhere.
pub fn branch_state_predicate(cfg: &HarnessConfig) -> Result<impl Predicate<str> + use<>> {
    let current = predicate::str::is_match(format!(
        r"(?m)^\* {}\r?$",
        regex::escape(&cfg.secondary_branch)
    ))
    .context("invalid secondary branch pattern")?;
    let default = predicate::str::is_match(format!(
        r"(?m)^  {}\r?$",
        regex::escape(&cfg.default_branch)
    ))
    .context("invalid default branch pattern")?;
    Ok(current.and(default))
}

fn ensure<P>(predicate: P, actual: &str, what: &str) -> Result<()>
where
    P: Predicate<str>,
{
    if predicate.eval(actual) {
        return Ok(());
    }
    Err(AssertionFailed {
        what: what.to_string(),
        expected: predicate.to_string(),
        actual: actual.to_string(),
    }
    .into())
}
