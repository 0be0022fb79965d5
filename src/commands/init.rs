use anyhow::Result;
use git_fixtures::{HarnessConfig, git_init};

use crate::cli::InitArgs;
use crate::views::{PathView, print_json};

pub fn run(cfg: &HarnessConfig, args: &InitArgs, porcelain: bool) -> Result<()> {
    let workdir = git_init(cfg, args.dir.as_deref(), args.branch.as_deref())?;
    let path = workdir.keep();
    if porcelain {
        return print_json(&PathView { path });
    }
    println!("{}", path.display());
    Ok(())
}
