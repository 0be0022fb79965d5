mod cli;
mod commands;
mod views;

use anyhow::Result;
use clap::Parser;
use git_fixtures::HarnessConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => HarnessConfig::from_json_file(path)?,
        None => HarnessConfig::default(),
    };

    match &cli.command {
        Commands::Init(args) => commands::init::run(&cfg, args, cli.porcelain),
        Commands::Build(args) => commands::build::run(&cfg, args, cli.porcelain),
        Commands::Run(args) => commands::run::run(&cfg, args, cli.porcelain),
        Commands::Compare(args) => commands::compare::run(&cfg, args, cli.porcelain),
        Commands::Read(args) => commands::read::run(args),
        Commands::CloneRemote(args) => commands::clone_remote::run(&cfg, args, cli.porcelain),
        Commands::Completions(args) => commands::completions::run(args.shell),
    }
}
