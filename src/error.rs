//! Error types for hostsgen runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::source::archive::ArchiveError;

/// Main error type for a hostsgen run.
///
/// Per-source failures never reach this type: they are absorbed by the
/// pipeline and reported through the run log. Only conditions that abort the
/// whole run end up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no usable input: no source could be fetched and no blacklist was supplied")]
    NoUsableInput,

    #[error("failed to write output file {path:?}: {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("another run already holds the archive lock at {0:?}")]
    Locked(PathBuf),

    #[error("run interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Validation errors for configuration values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("sources path cannot be empty")]
    EmptySourcesPath,

    #[error("output path cannot be empty")]
    EmptyOutputPath,

    #[error("http.{field} must be greater than 0")]
    ZeroTimeout { field: &'static str },

    #[error("archive.dir cannot be empty when the archive is enabled")]
    EmptyArchiveDir,
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
