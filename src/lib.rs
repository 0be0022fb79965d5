//! Disposable git repositories for testing command-line tools.
//!
//! A test builds a working directory ([`git_init`] or [`build_tmp`]), runs
//! its subject against it ([`process_bin`]), verifies the exit
//! ([`RunningProcess::finish`] / [`process_exit`]) and finally compares the
//! resulting tree with an expected fixture ([`fixture_compare`]).

pub mod config;
pub mod error;
pub mod git;
pub mod history;
pub mod process;
pub mod remote;
pub mod repo;
pub mod tree;
pub mod verify;
pub mod workdir;

pub use config::HarnessConfig;
pub use error::{AssertionFailed, FatalMarkerFound, GitCommandFailed, ProcessTimedOut, TreeMismatch};
pub use git::Git;
pub use history::{BuildOptions, build_tmp};
pub use process::{ProcessOptions, ProcessTarget, RunningProcess, process_bin};
pub use remote::{CloneOptions, clone_remote};
pub use repo::{CommitOptions, commit, git_init};
pub use tree::{FixtureNode, FixtureTree, TreeDifference, fixture_compare, read_tree, read_tree_skipping};
pub use verify::{ExitCheck, Outcome, VerificationResult, Verified, process_exit};
pub use workdir::WorkDir;

/// Installs a `RUST_LOG`-driven subscriber that writes through the test
/// harness's captured output. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_test_writer()
        .try_init();
}
