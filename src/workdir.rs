use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

/// A working directory handed back by the fixture builders.
///
/// When the harness allocated the directory itself, the [`TempDir`] rides
/// along and the whole tree is removed on drop. `path` may point below the
/// temporary root (see `BuildOptions::sub_dir`).
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    tmp: Option<TempDir>,
}

impl WorkDir {
    pub(crate) fn borrowed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tmp: None,
        }
    }

    pub(crate) fn allocate() -> anyhow::Result<Self> {
        let tmp = tempfile::tempdir()?;
        Ok(Self {
            path: tmp.path().to_path_buf(),
            tmp: Some(tmp),
        })
    }

    pub(crate) fn with_path(self, path: PathBuf) -> Self {
        Self { path, ..self }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The temporary root this directory lives in, or `path` itself when the
    /// caller supplied the directory.
    pub fn root(&self) -> &Path {
        self.tmp.as_ref().map(TempDir::path).unwrap_or(self.path.as_path())
    }

    pub fn is_temporary(&self) -> bool {
        self.tmp.is_some()
    }

    /// Disowns the temporary root so it outlives this value; returns `path`.
    pub fn keep(self) -> PathBuf {
        if let Some(tmp) = self.tmp {
            let root = tmp.keep();
            debug!(root = %root.display(), "keeping temporary directory");
        }
        self.path
    }
}

impl AsRef<Path> for WorkDir {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
