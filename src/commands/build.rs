use anyhow::Result;
use git_fixtures::{BuildOptions, HarnessConfig, build_tmp};

use crate::cli::BuildArgs;
use crate::views::{PathView, print_json};

pub fn run(cfg: &HarnessConfig, args: &BuildArgs, porcelain: bool) -> Result<()> {
    let opts = BuildOptions {
        fixtures_path: args.fixtures.clone(),
        dirty: args.dirty,
        no_git: args.no_git,
        sub_dir: args.sub_dir.clone().unwrap_or_default(),
    };
    let path = build_tmp(cfg, &opts)?.keep();
    if porcelain {
        return print_json(&PathView { path });
    }
    println!("{}", path.display());
    Ok(())
}
