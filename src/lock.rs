//! Advisory locking of the archive directory.
//!
//! Two runs sharing an archive would race on its artifacts, so a run holds an
//! exclusive `flock` on `<archive>/.lock` until it ends.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};

const LOCK_FILE: &str = ".lock";

/// Holds the archive lock; released on drop.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to take the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] if another run holds it, or an I/O error if
    /// the lock file cannot be opened.
    pub fn acquire(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE);

        // create+read+write without truncate: no race between create and lock
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| Error::Locked(path.clone()))?;

        tracing::debug!(path = ?path, "acquired archive lock");
        Ok(Self { _file: file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
