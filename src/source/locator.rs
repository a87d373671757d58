//! Source list parsing.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;

/// Markers that turn a source list line into a comment.
const COMMENT_MARKERS: &[&str] = &["#", "//"];

/// Where a list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// An `http` or `https` URL.
    Remote(Url),
    /// A file on the local filesystem.
    Local(PathBuf),
}

impl SourceLocator {
    /// Classify a single source list entry.
    ///
    /// Anything that is not an `http`/`https` URL is taken as a path.
    ///
    /// # Example
    ///
    /// ```
    /// use hostsgen::source::SourceLocator;
    ///
    /// assert!(matches!(
    ///     SourceLocator::parse("https://example.com/hosts"),
    ///     SourceLocator::Remote(_)
    /// ));
    /// assert!(matches!(
    ///     SourceLocator::parse("/etc/hostsgen/local.txt"),
    ///     SourceLocator::Local(_)
    /// ));
    /// ```
    #[must_use]
    pub fn parse(entry: &str) -> Self {
        match Url::parse(entry) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::Local(PathBuf::from(entry)),
        }
    }

    /// Resolve a relative local path against `base`, the directory holding
    /// the source list. Remote and absolute locators are returned as is.
    #[must_use]
    pub fn resolve_relative_to(self, base: &Path) -> Self {
        match self {
            Self::Local(path) if path.is_relative() => Self::Local(base.join(path)),
            other => other,
        }
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse a source list, one locator per line.
///
/// Blank lines and lines starting with a comment marker are ignored. Order is
/// preserved.
#[must_use]
pub fn parse_source_list(content: &str) -> Vec<SourceLocator> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !COMMENT_MARKERS.iter().any(|marker| line.starts_with(marker)))
        .map(SourceLocator::parse)
        .collect()
}
