use std::path::PathBuf;

use git_fixtures::TreeDifference;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PathView {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareView {
    pub equal: bool,
    pub differences: Vec<TreeDifference>,
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
