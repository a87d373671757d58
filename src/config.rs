//! Configuration loading and validation.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::blocklist::WhitelistPolicy;
use crate::error::{ConfigError, Result, ValidationError};
use crate::source::archive::default_archive_dir;

/// Main configuration for a hostsgen run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Source list file: one URL or local path per line.
    pub sources: PathBuf,

    /// Domains that are always emitted, whatever the whitelist says.
    pub blacklist: Option<PathBuf>,

    /// Domains removed from the aggregated set according to `whitelist_policy`.
    pub whitelist: Option<PathBuf>,

    /// Static header emitted verbatim before the generated entries.
    pub header: Option<PathBuf>,

    /// Generated hosts file.
    pub output: PathBuf,

    /// Append-only, human readable run log.
    pub log_file: Option<PathBuf>,

    /// How whitelist entries match aggregated domains.
    #[serde(default)]
    pub whitelist_policy: WhitelistPolicy,

    /// Address every blocked domain is mapped to.
    #[serde(
        default = "default_blocking_address",
        deserialize_with = "deserialize_ip_addr"
    )]
    pub blocking_address: IpAddr,

    /// Archive of previously fetched remote bodies.
    #[serde(default)]
    pub archive: ArchiveSettings,

    /// HTTP time budgets.
    #[serde(default)]
    pub http: HttpSettings,
}

/// Settings for the durable archive of remote bodies.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSettings {
    /// When disabled, remote sources are always downloaded and never fall back.
    #[serde(default = "default_archive_enabled")]
    pub enabled: bool,

    /// Archive directory. If None, a per-user cache directory is used.
    pub dir: Option<PathBuf>,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            enabled: default_archive_enabled(),
            dir: None,
        }
    }
}

impl ArchiveSettings {
    /// Returns the configured archive directory or the default one.
    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_archive_dir)
    }
}

/// Connect and total time budgets for network calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overall budget for a full download.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Overall budget for a validator probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

const fn default_archive_enabled() -> bool {
    true
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_timeout() -> u64 {
    60
}

const fn default_probe_timeout() -> u64 {
    15
}

const fn default_blocking_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn deserialize_ip_addr<'de, D>(deserializer: D) -> std::result::Result<IpAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Relative paths are resolved against the directory holding the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.sources.as_os_str().is_empty() {
            return Err(ValidationError::EmptySourcesPath);
        }

        if self.output.as_os_str().is_empty() {
            return Err(ValidationError::EmptyOutputPath);
        }

        if self.http.connect_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout {
                field: "connect_timeout_secs",
            });
        }

        if self.http.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout {
                field: "timeout_secs",
            });
        }

        if self.http.probe_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout {
                field: "probe_timeout_secs",
            });
        }

        if self.archive.enabled
            && let Some(dir) = &self.archive.dir
            && dir.as_os_str().is_empty()
        {
            return Err(ValidationError::EmptyArchiveDir);
        }

        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.sources);
        resolve(&mut self.output);
        for path in [
            &mut self.blacklist,
            &mut self.whitelist,
            &mut self.header,
            &mut self.log_file,
            &mut self.archive.dir,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            sources = "sources.list"
            output = "hosts"
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.sources, PathBuf::from("sources.list"));
        assert_eq!(config.output, PathBuf::from("hosts"));
        assert!(config.blacklist.is_none());
        assert!(config.whitelist.is_none());
        assert!(config.header.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_default_values() {
        let toml = r#"
            sources = "sources.list"
            output = "hosts"
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.whitelist_policy, WhitelistPolicy::Exact);
        assert_eq!(config.blocking_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(config.archive.enabled);
        assert!(config.archive.dir.is_none());
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.http.timeout(), Duration::from_secs(60));
        assert_eq!(config.http.probe_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            sources = "sources.list"
            blacklist = "black.txt"
            whitelist = "white.txt"
            header = "hosts.header"
            output = "hosts"
            log_file = "run.log"
            whitelist_policy = "ancestor_inclusive"
            blocking_address = "127.0.0.1"

            [archive]
            enabled = false
            dir = "/tmp/archive"

            [http]
            connect_timeout_secs = 3
            timeout_secs = 30
            probe_timeout_secs = 5
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.whitelist_policy, WhitelistPolicy::AncestorInclusive);
        assert_eq!(config.blocking_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!config.archive.enabled);
        assert_eq!(config.archive.dir(), PathBuf::from("/tmp/archive"));
        assert_eq!(config.http.connect_timeout_secs, 3);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.probe_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_blocking_address() {
        let toml = r#"
            sources = "sources.list"
            output = "hosts"
            blocking_address = "not-an-address"
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let toml = r#"
            sources = "sources.list"
            output = "hosts"
            whitelist_policy = "fuzzy"
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let toml = r#"
            sources = "sources.list"
            output = "hosts"

            [http]
            timeout_secs = 0
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_empty_output_rejected() {
        let toml = r#"
            sources = "sources.list"
            output = ""
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
            sources = "sources.list"
            output = "hosts"
            unknown_field = "value"
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_missing_sources_rejected() {
        let toml = r#"
            output = "hosts"
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn should_resolve_relative_paths_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostsgen.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"sources = "sources.list""#).unwrap();
        writeln!(file, r#"output = "/abs/hosts""#).unwrap();
        writeln!(file, r#"whitelist = "white.txt""#).unwrap();
        file.flush().unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.sources, dir.path().join("sources.list"));
        assert_eq!(config.output, PathBuf::from("/abs/hosts"));
        assert_eq!(config.whitelist, Some(dir.path().join("white.txt")));
    }
}
