//! Durable archive of previously fetched remote bodies.
//!
//! Each remote locator owns three artifacts in the archive directory, keyed
//! by a hash of the URL:
//!
//! ```text
//! <key>.body   last fetched body
//! <key>.etag   ETag of that response, if any
//! <key>.size   Content-Length of that response, if any
//! ```
//!
//! Entries are never evicted.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use reqwest::Url;
use tempfile::NamedTempFile;

const BODY_EXT: &str = "body";
const ETAG_EXT: &str = "etag";
const SIZE_EXT: &str = "size";

/// Error type for archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// I/O error on one of the archive artifacts.
    #[error("archive I/O error for {path:?}: {source}")]
    Io {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Stable key of an archived locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveKey(String);

impl ArchiveKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A previously fetched body and its validators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub body: Vec<u8>,
    pub etag: Option<String>,
    pub size: Option<u64>,
}

impl ArchiveEntry {
    /// Length the remote is expected to report if the body is unchanged.
    ///
    /// Falls back to the archived body length when no size was recorded.
    #[must_use]
    pub fn expected_size(&self) -> u64 {
        self.size.unwrap_or(self.body.len() as u64)
    }
}

/// Filesystem-backed archive.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    dir: PathBuf,
}

impl ArchiveStore {
    /// Open the archive rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ArchiveError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Key for a remote locator.
    #[must_use]
    pub fn key_for(url: &Url) -> ArchiveKey {
        ArchiveKey(blake3::hash(url.as_str().as_bytes()).to_hex().to_string())
    }

    /// Read an archived entry.
    ///
    /// Returns `Ok(None)` when no body was ever archived for `key`. Missing or
    /// unreadable validators are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the body exists but cannot be read.
    pub fn get(&self, key: &ArchiveKey) -> Result<Option<ArchiveEntry>, ArchiveError> {
        let body_path = self.artifact(key, BODY_EXT);
        let body = match fs::read(&body_path) {
            Ok(body) => body,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ArchiveError::Io {
                    path: body_path,
                    source,
                });
            }
        };

        let etag = self
            .read_validator(key, ETAG_EXT)
            .filter(|etag| !etag.is_empty());
        let size = self
            .read_validator(key, SIZE_EXT)
            .and_then(|size| size.parse::<u64>().ok());

        Ok(Some(ArchiveEntry { body, etag, size }))
    }

    /// Store a body and its validators, replacing any previous entry.
    ///
    /// Old validators are removed first and every artifact is written to a
    /// temporary file then renamed into place, so an interrupted update never
    /// pairs a stale validator with a newer body.
    ///
    /// # Errors
    ///
    /// Returns an error if any artifact cannot be removed or written.
    pub fn put(
        &self,
        key: &ArchiveKey,
        body: &[u8],
        etag: Option<&str>,
        size: Option<u64>,
    ) -> Result<(), ArchiveError> {
        self.remove_artifact(key, ETAG_EXT)?;
        self.remove_artifact(key, SIZE_EXT)?;

        self.write_artifact(key, BODY_EXT, body)?;
        if let Some(etag) = etag {
            self.write_artifact(key, ETAG_EXT, etag.as_bytes())?;
        }
        if let Some(size) = size {
            self.write_artifact(key, SIZE_EXT, size.to_string().as_bytes())?;
        }

        tracing::debug!(key = key.as_str(), bytes = body.len(), "archived body");
        Ok(())
    }

    fn artifact(&self, key: &ArchiveKey, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{ext}", key.as_str()))
    }

    fn read_validator(&self, key: &ArchiveKey, ext: &str) -> Option<String> {
        let path = self.artifact(key, ext);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value.trim().to_string()),
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = ?path, error = %err, "ignoring unreadable validator");
                }
                None
            }
        }
    }

    fn remove_artifact(&self, key: &ArchiveKey, ext: &str) -> Result<(), ArchiveError> {
        let path = self.artifact(key, ext);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArchiveError::Io { path, source }),
        }
    }

    fn write_artifact(&self, key: &ArchiveKey, ext: &str, content: &[u8]) -> Result<(), ArchiveError> {
        let path = self.artifact(key, ext);
        let io_err = |source| ArchiveError::Io {
            path: path.clone(),
            source,
        };

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        temp_file.write_all(content).map_err(io_err)?;
        temp_file.as_file().sync_all().map_err(io_err)?;
        temp_file.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

/// Returns the default archive directory.
///
/// - Linux: `~/.cache/hostsgen/archive/`
/// - macOS: `~/Library/Caches/hostsgen/archive/`
/// - Windows: `{FOLDERID_LocalAppData}\hostsgen\archive\`
///
/// Falls back to `./cache/archive` if the cache directory cannot be determined.
#[must_use]
pub fn default_archive_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || PathBuf::from("./cache/archive"),
        |p| p.join("hostsgen").join("archive"),
    )
}
