use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "git-fixtures",
    version,
    about = "Build git fixture repositories and verify tools run against them"
)]
pub struct Cli {
    #[arg(
        short = 'P',
        long,
        global = true,
        help = "Output machine-readable JSON"
    )]
    pub porcelain: bool,
    #[arg(long, global = true, help = "JSON file overriding harness defaults")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a repository with a root commit
    Init(InitArgs),
    /// Replay a directory of revisions into a fresh repository
    Build(BuildArgs),
    /// Run a subject program, answer its merge prompts and verify the result
    Run(RunArgs),
    /// Compare a directory against an expected fixture tree
    Compare(CompareArgs),
    /// Print a directory as a fixture tree
    Read(ReadArgs),
    /// Create a bare clone and register it as a remote
    CloneRemote(CloneRemoteArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(short = 'd', long, help = "Directory to initialize (default: new temp dir)")]
    pub dir: Option<PathBuf>,
    #[arg(short = 'b', long, help = "Branch for the root commit")]
    pub branch: Option<String>,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[arg(help = "Directory containing one subdirectory per revision")]
    pub fixtures: PathBuf,
    #[arg(long, help = "Leave an untracked file in the working tree")]
    pub dirty: bool,
    #[arg(long, help = "Remove .git from the result")]
    pub no_git: bool,
    #[arg(short = 's', long, help = "Subdirectory to replay revisions into")]
    pub sub_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(short = 'C', long, help = "Working directory for the subject")]
    pub cwd: PathBuf,
    #[arg(short = 'm', long, default_value = "", help = "Expected text of the latest commit message")]
    pub commit_message: String,
    #[arg(long, help = "Skip post-run git assertions")]
    pub no_git: bool,
    #[arg(short = 't', long, help = "Kill the subject after this many seconds")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Treat PROGRAM as a script under the configured bin directory")]
    pub script: bool,
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM",
        help = "Program to run, followed by its arguments"
    )]
    pub command: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[arg(help = "Directory produced by the tool")]
    pub actual: PathBuf,
    #[arg(help = "Expected fixture directory")]
    pub expected: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    #[arg(help = "Directory to read")]
    pub dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct CloneRemoteArgs {
    #[arg(help = "Repository to clone")]
    pub local: PathBuf,
    #[arg(short = 'n', long, help = "Remote name (default from config)")]
    pub remote_name: Option<String>,
    #[arg(short = 'p', long, help = "Where to create the bare clone (default: new temp dir)")]
    pub remote_path: Option<PathBuf>,
    #[arg(long, help = "Do not set upstreams for local branches")]
    pub no_upstream: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell to generate completions for")]
    pub shell: clap_complete::Shell,
}
