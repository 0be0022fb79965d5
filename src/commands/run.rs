use std::time::Duration;

use anyhow::{Result, bail};
use git_fixtures::{HarnessConfig, ProcessOptions, ProcessTarget, process_bin};

use crate::cli::RunArgs;
use crate::views::print_json;

pub fn run(cfg: &HarnessConfig, args: &RunArgs, porcelain: bool) -> Result<()> {
    let Some((program, program_args)) = args.command.split_first() else {
        bail!("no program given");
    };
    let target = if args.script {
        ProcessTarget::Script(program.into())
    } else {
        ProcessTarget::Bin(program.clone())
    };
    let mut opts = ProcessOptions::new(target, &args.cwd)
        .args(program_args.iter().cloned())
        .commit_message(args.commit_message.clone())
        .no_git(args.no_git);
    if let Some(secs) = args.timeout {
        opts = opts.timeout(Duration::from_secs(secs));
    }

    let verified = process_bin(cfg, opts)?.finish()?;

    if porcelain {
        return print_json(&verified);
    }
    if let Some(stderr) = verified.stderr()
        && !stderr.is_empty()
    {
        println!("stderr:\n{}", stderr.trim_end());
    }
    if let Some(status) = &verified.status {
        if status.is_empty() {
            println!("working tree clean");
        } else {
            println!("status:\n{}", status.trim_end());
        }
    }
    Ok(())
}
