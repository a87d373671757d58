//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;

use crate::blocklist::WhitelistPolicy;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "hostsgen")]
#[command(author, version, about = "Build a hosts blocklist from many sources")]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "HOSTSGEN_CONFIG", default_value = "hostsgen.toml")]
    pub config: PathBuf,

    /// Whitelist matching policy, overrides the config file
    #[arg(long, value_enum)]
    pub policy: Option<WhitelistPolicy>,

    /// Always download remote sources, never reuse or fall back to the archive
    #[arg(long)]
    pub no_archive: bool,

    /// Output file, overrides the config file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quiet mode (for cron/systemd timer)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(policy) = self.policy {
            config.whitelist_policy = policy;
        }
        if self.no_archive {
            config.archive.enabled = false;
        }
        if let Some(output) = &self.output {
            config.output.clone_from(output);
        }
    }
}
