use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fixed identities, branch names and scripted responses shared by every
/// component. One value is built per test (or per CLI invocation) and passed
/// by reference; nothing here is mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub author_name: String,
    pub author_email: String,
    pub merge_tool: String,
    pub merge_tool_keep_backup: bool,
    pub default_branch: String,
    pub secondary_branch: String,
    pub init_commit_message: String,
    pub empty_dir_placeholder: String,
    pub dirty_file_name: String,
    pub dirty_file_contents: String,
    pub fatal_markers: Vec<String>,
    pub ignored_entries: Vec<String>,
    pub remote_name: String,
    pub bin_dir: PathBuf,
    pub interpreter: String,
    pub local_bin_dirs: Vec<PathBuf>,
    pub normal_conflict_signal: String,
    pub normal_conflict_response: Vec<String>,
    pub deleted_conflict_signal: String,
    pub deleted_conflict_response: Vec<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            author_name: "Your Name".to_string(),
            author_email: "you@example.com".to_string(),
            merge_tool: "vimdiff".to_string(),
            merge_tool_keep_backup: false,
            default_branch: "master".to_string(),
            secondary_branch: "foo".to_string(),
            init_commit_message: "initial commit".to_string(),
            empty_dir_placeholder: ".gitkeep".to_string(),
            dirty_file_name: "a-random-new-file".to_string(),
            dirty_file_contents: "foo".to_string(),
            fatal_markers: vec![
                "Error:".to_string(),
                "fatal:".to_string(),
                "Command failed".to_string(),
            ],
            ignored_entries: vec![".git".to_string(), "node_modules".to_string()],
            remote_name: "origin".to_string(),
            bin_dir: PathBuf::from("bin"),
            interpreter: "sh".to_string(),
            local_bin_dirs: vec![PathBuf::from("target/debug")],
            normal_conflict_signal: "Normal merge conflict".to_string(),
            normal_conflict_response: vec![":%diffg 3".to_string(), ":wqa".to_string()],
            deleted_conflict_signal: "Deleted merge conflict".to_string(),
            deleted_conflict_response: vec!["d".to_string()],
            timeout_secs: None,
        }
    }
}

impl HarnessConfig {
    /// Loads overrides from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid harness config in {}", path.display()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// `Author: Name <email>` as printed by `git log`.
    pub fn author_line(&self) -> String {
        format!("Author: {} <{}>", self.author_name, self.author_email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("harness.json");
        std::fs::write(&path, r#"{ "secondary_branch": "work", "timeout_secs": 30 }"#)
            .expect("write config");

        let cfg = HarnessConfig::from_json_file(&path).expect("load config");
        assert_eq!(cfg.secondary_branch, "work");
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.default_branch, "master");
        assert_eq!(cfg.fatal_markers.len(), 3);
    }

    #[test]
    fn author_line_matches_git_log_format() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.author_line(), "Author: Your Name <you@example.com>");
    }

    #[test]
    fn malformed_config_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write config");

        let err = HarnessConfig::from_json_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
