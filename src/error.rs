use std::time::Duration;

use thiserror::Error;

use crate::tree::TreeDifference;

/// A git invocation exited unsuccessfully. `stderr` is the raw text git wrote.
#[derive(Debug, Error)]
#[error("git command failed {args:?}: {stderr}")]
pub struct GitCommandFailed {
    pub args: Vec<String>,
    pub stderr: String,
}

/// Captured stderr of a subject process contained a crash marker.
#[derive(Debug, Error)]
#[error("stderr contains fatal marker {marker:?}:\n{stderr}")]
pub struct FatalMarkerFound {
    pub marker: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
#[error("subject process timed out after {timeout:?}")]
pub struct ProcessTimedOut {
    pub timeout: Duration,
}

#[derive(Debug, Error)]
#[error("assertion failed: {what}\n  expected: {expected}\n  actual: {actual}")]
pub struct AssertionFailed {
    pub what: String,
    pub expected: String,
    pub actual: String,
}

/// Two fixture trees were not equal after normalization.
#[derive(Debug, Error)]
#[error("fixture trees differ:\n{}", render_differences(.differences))]
pub struct TreeMismatch {
    pub differences: Vec<TreeDifference>,
}

fn render_differences(differences: &[TreeDifference]) -> String {
    differences
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}
