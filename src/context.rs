//! Per-run state: the run log and the scratch area.
//!
//! A [`RunContext`] is created at the start of a run and handed to every
//! stage. Dropping it deletes the scratch area, whichever way the run ends.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Severity of a run log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Ok,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// Append-only, human readable log of a run.
///
/// Every line is also emitted as a `tracing` event.
#[derive(Debug, Default)]
pub struct RunLog {
    file: Option<File>,
}

impl RunLog {
    /// Open (or create) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Some(file) })
    }

    /// A run log that only forwards to `tracing`.
    #[must_use]
    pub const fn tracing_only() -> Self {
        Self { file: None }
    }

    pub fn ok(&self, message: impl fmt::Display) {
        self.write(LogLevel::Ok, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.write(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.write(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.write(LogLevel::Error, message);
    }

    /// Append one timestamped line.
    pub fn write(&self, level: LogLevel, message: impl fmt::Display) {
        match level {
            LogLevel::Ok | LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }

        let Some(mut file) = self.file.as_ref() else {
            return;
        };

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Err(err) = writeln!(file, "{timestamp} [{level}] {message}") {
            tracing::warn!(error = %err, "failed to append to run log");
        }
    }
}

/// State owned by a single run.
#[derive(Debug)]
pub struct RunContext {
    pub log: RunLog,
    scratch: TempDir,
}

impl RunContext {
    /// Create the scratch area and wrap the run log.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directory cannot be created.
    pub fn new(log: RunLog) -> io::Result<Self> {
        let scratch = tempfile::Builder::new().prefix("hostsgen-").tempdir()?;
        tracing::debug!(path = ?scratch.path(), "created scratch area");
        Ok(Self { log, scratch })
    }

    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Stage the raw body of the `index`-th source in the scratch area.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn stage(&self, index: usize, body: &[u8]) -> io::Result<PathBuf> {
        let path = self.scratch.path().join(format!("source-{index}.txt"));
        std::fs::write(&path, body)?;
        Ok(path)
    }
}
