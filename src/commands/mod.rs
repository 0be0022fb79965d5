pub mod build;
pub mod clone_remote;
pub mod compare;
pub mod completions;
pub mod init;
pub mod read;
pub mod run;
