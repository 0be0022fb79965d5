use anyhow::Result;
use git_fixtures::read_tree;

use crate::cli::ReadArgs;
use crate::views::print_json;

/// Always JSON; a fixture tree has no friendlier rendering.
pub fn run(args: &ReadArgs) -> Result<()> {
    let tree = read_tree(&args.dir)?;
    print_json(&tree)
}
