//! Source acquisition.
//!
//! Resolves each [`SourceLocator`] to raw bytes. Local files are read as is.
//! Remote URLs go through the archive when it is enabled:
//!
//! 1. If a body was archived before, probe the remote with the archived
//!    validator (ETag, else size). An unchanged remote reuses the archive.
//! 2. Otherwise download the body once and archive it with whatever
//!    validators the response exposed.
//! 3. If the download fails, fall back to the archived body when one exists.
//!
//! At most one download is attempted per source and nothing is retried.

pub mod archive;
pub mod loader;
mod locator;
pub mod remote;

use std::path::PathBuf;

use reqwest::Url;

pub use archive::{ArchiveEntry, ArchiveKey, ArchiveStore};
pub use locator::{SourceLocator, parse_source_list};
pub use remote::{Download, Probe, RemoteFetcher};

use loader::FileLoader;

/// Per-source failure. Never fatal to a run: the source is skipped.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network failure or non-success HTTP status.
    #[error("{locator} is unreachable: {reason}")]
    Unreachable {
        /// URL that was requested.
        locator: String,
        /// Short description of the failure.
        reason: String,
    },

    /// Connect or total time budget exceeded.
    #[error("timeout fetching {locator}")]
    Timeout {
        /// URL that timed out.
        locator: String,
    },

    /// A local source could not be read.
    #[error("failed to read {path:?}: {source}")]
    LocalReadFailed {
        /// Path of the local source.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// How the bytes of a source were obtained.
#[derive(Debug)]
pub enum FetchOrigin {
    /// Read from a local file.
    Local,
    /// Downloaded from the remote.
    Downloaded,
    /// Archived body confirmed current by a validator probe.
    Reused,
    /// Download failed; the archived body was used instead.
    Degraded(FetchError),
}

/// Raw bytes of one source.
#[derive(Debug)]
pub struct Fetched {
    pub body: Vec<u8>,
    pub origin: FetchOrigin,
}

/// Resolves locators to bytes, consulting the archive for remote sources.
#[derive(Debug)]
pub struct SourceFetcher {
    remote: RemoteFetcher,
    archive: Option<ArchiveStore>,
}

impl SourceFetcher {
    /// Create a fetcher. Passing no archive disables reuse and fallback.
    #[must_use]
    pub const fn new(remote: RemoteFetcher, archive: Option<ArchiveStore>) -> Self {
        Self { remote, archive }
    }

    /// Fetch a single source.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the source yields no bytes at all, i.e.
    /// the read or download failed and no archived body could stand in.
    pub async fn fetch(&self, locator: &SourceLocator) -> Result<Fetched, FetchError> {
        match locator {
            SourceLocator::Local(path) => {
                tracing::debug!(path = ?path, "loading local source");
                let body = FileLoader::load(path).await?;
                Ok(Fetched {
                    body,
                    origin: FetchOrigin::Local,
                })
            }
            SourceLocator::Remote(url) => {
                tracing::debug!(url = %url, "loading remote source");
                self.fetch_remote(url).await
            }
        }
    }

    async fn fetch_remote(&self, url: &Url) -> Result<Fetched, FetchError> {
        let Some(store) = &self.archive else {
            let download = self.remote.download(url).await?;
            return Ok(Fetched {
                body: download.body,
                origin: FetchOrigin::Downloaded,
            });
        };

        let key = ArchiveStore::key_for(url);
        let archived = store.get(&key).unwrap_or_else(|err| {
            tracing::warn!(url = %url, error = %err, "ignoring unreadable archive entry");
            None
        });

        let archived = match archived {
            Some(entry) => {
                let probe = self.remote.probe_validator(url, &entry).await;
                tracing::debug!(url = %url, ?probe, etag = ?entry.etag, "probed archived validator");
                if probe == Probe::Unchanged {
                    return Ok(Fetched {
                        body: entry.body,
                        origin: FetchOrigin::Reused,
                    });
                }
                Some(entry)
            }
            None => {
                tracing::debug!(url = %url, "nothing archived yet, fetching unconditionally");
                None
            }
        };

        match self.remote.download(url).await {
            Ok(download) => {
                // Best effort: a failed archive write must not lose the download.
                if let Err(err) = store.put(
                    &key,
                    &download.body,
                    download.etag.as_deref(),
                    download.size,
                ) {
                    tracing::warn!(url = %url, error = %err, "failed to archive body");
                }
                Ok(Fetched {
                    body: download.body,
                    origin: FetchOrigin::Downloaded,
                })
            }
            Err(err) => match archived {
                Some(entry) => {
                    tracing::warn!(url = %url, error = %err, "download failed, using archived copy");
                    Ok(Fetched {
                        body: entry.body,
                        origin: FetchOrigin::Degraded(err),
                    })
                }
                None => Err(err),
            },
        }
    }
}
