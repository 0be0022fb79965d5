use anyhow::Result;
use git_fixtures::{CloneOptions, HarnessConfig, clone_remote};

use crate::cli::CloneRemoteArgs;
use crate::views::{PathView, print_json};

pub fn run(cfg: &HarnessConfig, args: &CloneRemoteArgs, porcelain: bool) -> Result<()> {
    let opts = CloneOptions {
        local_path: args.local.clone(),
        remote_name: args.remote_name.clone(),
        remote_path: args.remote_path.clone(),
        set_upstream_branches: !args.no_upstream,
    };
    let path = clone_remote(cfg, &opts)?.keep();
    if porcelain {
        return print_json(&PathView { path });
    }
    println!("{}", path.display());
    Ok(())
}
