use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::config::HarnessConfig;
use crate::git::Git;
use crate::repo::{CommitOptions, commit, git_init};
use crate::workdir::WorkDir;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Directory holding one subdirectory per revision.
    pub fixtures_path: PathBuf,
    /// Leave one untracked file behind after the history is built.
    pub dirty: bool,
    /// Strip `.git` from the target directory once the history is built.
    pub no_git: bool,
    /// Revisions are copied into this subdirectory of the repository; empty means the root.
    pub sub_dir: PathBuf,
}

impl BuildOptions {
    pub fn new(fixtures_path: impl Into<PathBuf>) -> Self {
        Self {
            fixtures_path: fixtures_path.into(),
            ..Self::default()
        }
    }
}

/// Replays every revision under `fixtures_path` as one commit tagged with the
/// revision's name, then parks the repository on the secondary branch.
///
/// Revisions are applied in lexical order of their names. Each revision after
/// the first starts from an empty working tree, so files absent from a
/// revision are deleted in its commit.
///
/// The returned [`WorkDir`] points at the target subdirectory; its root is the
/// temporary repository.
pub fn build_tmp(cfg: &HarnessConfig, opts: &BuildOptions) -> Result<WorkDir> {
    let repo = git_init(cfg, None, Some(&cfg.default_branch))?;
    let tmp_path = repo.path().to_path_buf();
    let target = if opts.sub_dir.as_os_str().is_empty() {
        tmp_path.clone()
    } else {
        tmp_path.join(&opts.sub_dir)
    };
    let git = Git::new(&tmp_path);

    let revisions = list_revisions(&opts.fixtures_path)?;
    for (index, revision) in revisions.iter().enumerate() {
        debug!(revision = %revision, "replaying fixture revision");
        if index != 0 {
            git.remove_all()?;
        }

        fs::create_dir_all(&target)
            .with_context(|| format!("failed to create {}", target.display()))?;
        let source = opts.fixtures_path.join(revision);
        if !is_placeholder_only(&source, &cfg.empty_dir_placeholder)? {
            copy_dir_contents(&source, &target)?;
        }

        commit(
            cfg,
            CommitOptions::new(&tmp_path).message(revision).tag(revision),
        )?;
    }

    git.create_and_switch(&cfg.secondary_branch)?;

    if opts.dirty {
        let dirty_path = tmp_path.join(&cfg.dirty_file_name);
        fs::write(&dirty_path, &cfg.dirty_file_contents)
            .with_context(|| format!("failed to write {}", dirty_path.display()))?;
    }

    if opts.no_git {
        let git_dir = target.join(".git");
        if git_dir.exists() {
            fs::remove_dir_all(&git_dir)
                .with_context(|| format!("failed to remove {}", git_dir.display()))?;
        }
    }

    Ok(repo.with_path(target))
}

/// Revision names under `fixtures_path`, sorted.
pub fn list_revisions(fixtures_path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(fixtures_path)
        .with_context(|| format!("failed reading fixtures {}", fixtures_path.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => bail!("revision name is not valid UTF-8: {raw:?}"),
        }
    }
    names.sort();
    Ok(names)
}

fn is_placeholder_only(dir: &Path, placeholder: &str) -> Result<bool> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed reading revision {}", dir.display()))?;
    let Some(first) = entries.next() else {
        return Ok(false);
    };
    Ok(first?.file_name() == placeholder && entries.next().is_none())
}

/// Copies everything inside `source_root` into `destination_root`, merging
/// with what is already there.
pub(crate) fn copy_dir_contents(source_root: &Path, destination_root: &Path) -> Result<()> {
    let mut queue: VecDeque<(PathBuf, PathBuf)> = VecDeque::new();
    queue.push_back((source_root.to_path_buf(), destination_root.to_path_buf()));

    while let Some((from_dir, to_dir)) = queue.pop_front() {
        for entry in fs::read_dir(&from_dir)
            .with_context(|| format!("failed reading source directory {}", from_dir.display()))?
        {
            let entry = entry?;
            let from_path = entry.path();
            let to_path = to_dir.join(entry.file_name());
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                fs::create_dir_all(&to_path)
                    .with_context(|| format!("failed creating directory {}", to_path.display()))?;
                queue.push_back((from_path, to_path));
            } else {
                fs::copy(&from_path, &to_path).with_context(|| {
                    format!(
                        "failed copying {} to {}",
                        from_path.display(),
                        to_path.display()
                    )
                })?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    #[test]
    fn revisions_are_sorted_and_skip_plain_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("v2")).expect("mkdir");
        fs::create_dir(dir.path().join("v1")).expect("mkdir");
        write(&dir.path().join("README"), "not a revision");

        assert_eq!(list_revisions(dir.path()).expect("list"), vec!["v1", "v2"]);
    }

    #[test]
    fn placeholder_only_requires_exactly_one_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let only = dir.path().join("only");
        write(&only.join(".gitkeep"), "");
        let mixed = dir.path().join("mixed");
        write(&mixed.join(".gitkeep"), "");
        write(&mixed.join("a.txt"), "a");
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).expect("mkdir");

        assert!(is_placeholder_only(&only, ".gitkeep").expect("only"));
        assert!(!is_placeholder_only(&mixed, ".gitkeep").expect("mixed"));
        assert!(!is_placeholder_only(&empty, ".gitkeep").expect("empty"));
    }

    #[test]
    fn copy_merges_nested_directories() {
        let src = tempfile::tempdir().expect("src");
        let dst = tempfile::tempdir().expect("dst");
        write(&src.path().join("a/b/c.txt"), "c");
        write(&dst.path().join("a/keep.txt"), "keep");

        copy_dir_contents(src.path(), dst.path()).expect("copy");

        assert_eq!(
            fs::read_to_string(dst.path().join("a/b/c.txt")).expect("read"),
            "c"
        );
        assert!(dst.path().join("a/keep.txt").exists());
    }
}
