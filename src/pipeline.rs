//! Run driver.
//!
//! A run is strictly linear:
//!
//! ```text
//! LoadBlacklist -> FetchSources -> Aggregate -> Filter -> Sort -> Emit
//! ```
//!
//! Per-source failures are absorbed here and only show up in the run log and
//! the [`RunSummary`]. The run aborts only when there is no usable input at
//! all, or when the output cannot be written.

use std::path::{Path, PathBuf};

use crate::blocklist::{AggregatedSet, Domain, Normalizer, Whitelist};
use crate::config::Config;
use crate::context::RunContext;
use crate::emitter;
use crate::error::{ConfigError, Error, Result};
use crate::lock::RunLock;
use crate::source::{
    ArchiveStore, FetchOrigin, RemoteFetcher, SourceFetcher, SourceLocator, parse_source_list,
};

/// What happened to one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Local,
    Downloaded,
    Reused,
    /// Download failed, archived body used.
    Degraded,
    /// Nothing usable; the source contributed no domains.
    Skipped,
}

impl SourceStatus {
    #[must_use]
    pub const fn is_usable(self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Per-source line of the run summary.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub locator: String,
    pub status: SourceStatus,
    /// Domain tokens extracted, duplicates included.
    pub domains: usize,
}

/// Where a fetched body waits until aggregation.
#[derive(Debug)]
enum Staged {
    File(PathBuf),
    /// The scratch area refused the write.
    Memory(Vec<u8>),
}

/// Counters describing a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
    pub blacklisted: usize,
    pub aggregated: usize,
    pub removed_by_whitelist: usize,
    pub emitted: usize,
}

impl RunSummary {
    #[must_use]
    pub fn sources_ok(&self) -> usize {
        self.count(SourceStatus::is_usable)
    }

    #[must_use]
    pub fn sources_degraded(&self) -> usize {
        self.count(|status| status == SourceStatus::Degraded)
    }

    #[must_use]
    pub fn sources_failed(&self) -> usize {
        self.count(|status| status == SourceStatus::Skipped)
    }

    fn count(&self, predicate: impl Fn(SourceStatus) -> bool) -> usize {
        self.sources
            .iter()
            .filter(|report| predicate(report.status))
            .count()
    }
}

/// A configured run, ready to execute.
///
/// Holds the archive lock for as long as it lives.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    fetcher: SourceFetcher,
    _lock: Option<RunLock>,
}

impl Pipeline {
    /// Build the HTTP client and open the archive if it is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, the archive
    /// directory cannot be created, or another run holds the archive lock.
    pub fn new(config: Config) -> Result<Self> {
        let remote = RemoteFetcher::new(&config.http).map_err(ConfigError::HttpClient)?;

        let (archive, lock) = if config.archive.enabled {
            let dir = config.archive.dir();
            let lock = RunLock::acquire(&dir)?;
            (Some(ArchiveStore::open(dir)?), Some(lock))
        } else {
            (None, None)
        };

        Ok(Self {
            config,
            fetcher: SourceFetcher::new(remote, archive),
            _lock: lock,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the run and write the output file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoUsableInput`] when no source could be fetched and
    /// no blacklist was supplied, [`Error::OutputWriteFailed`] when the output
    /// cannot be written. Scratch area failures never abort the run.
    pub async fn run(&self, ctx: &RunContext) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        // LoadBlacklist
        let blacklist = match &self.config.blacklist {
            Some(path) => self.load_blacklist(ctx, path).await,
            None => None,
        };
        let blacklist_supplied = blacklist.is_some();

        // FetchSources
        let locators = self.load_source_list(ctx).await;
        let mut staged: Vec<(usize, Staged)> = Vec::with_capacity(locators.len());
        for (index, locator) in locators.iter().enumerate() {
            let status = match self.fetcher.fetch(locator).await {
                Ok(fetched) => {
                    let status = log_fetched(ctx, locator, &fetched.origin);
                    let stage = ctx.stage(index, &fetched.body);
                    match stage {
                        Ok(path) => staged.push((index, Staged::File(path))),
                        Err(err) => {
                            ctx.log.warn(format_args!(
                                "{locator}: staging failed ({err}), keeping body in memory"
                            ));
                            staged.push((index, Staged::Memory(fetched.body)));
                        }
                    }
                    status
                }
                Err(err) => {
                    ctx.log.warn(format_args!("{locator}: skipped ({err})"));
                    SourceStatus::Skipped
                }
            };
            summary.sources.push(SourceReport {
                locator: locator.to_string(),
                status,
                domains: 0,
            });
        }

        // Aggregate
        let mut aggregated = AggregatedSet::with_blacklist(blacklist.unwrap_or_default());
        for (index, body) in staged {
            let report = &mut summary.sources[index];
            let text = match body {
                Staged::File(path) => match read_text(&path).await {
                    Ok(text) => text,
                    Err(err) => {
                        ctx.log.warn(format_args!(
                            "{}: skipped, staged copy unreadable ({err})",
                            report.locator
                        ));
                        report.status = SourceStatus::Skipped;
                        continue;
                    }
                },
                Staged::Memory(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            report.domains = aggregated.extend_source(Normalizer::new(&text));
        }
        summary.blacklisted = aggregated.blacklisted_len();
        summary.aggregated = aggregated.len();

        if summary.sources_ok() == 0 && !blacklist_supplied {
            ctx.log.error(format_args!(
                "no usable input: {} source(s) listed, none fetched, no blacklist",
                locators.len()
            ));
            return Err(Error::NoUsableInput);
        }

        ctx.log.info(format_args!(
            "{}/{} source(s) usable ({} degraded), {} unique domain(s)",
            summary.sources_ok(),
            locators.len(),
            summary.sources_degraded(),
            summary.aggregated
        ));

        // Filter
        let whitelist = self.load_whitelist(ctx).await;
        let filtered = whitelist.filter(aggregated);
        summary.removed_by_whitelist = summary.aggregated - filtered.len();

        // Sort + Emit
        let header = self.load_header(ctx).await;
        let sorted = emitter::sort_domains(filtered);
        summary.emitted = sorted.len();
        let rendered = emitter::render(&header, &sorted, self.config.blocking_address);

        if let Err(err) = emitter::write_output(&self.config.output, &rendered) {
            ctx.log.error(&err);
            return Err(err);
        }

        ctx.log.ok(format_args!(
            "wrote {} domain(s) to {} ({} removed by whitelist)",
            summary.emitted,
            self.config.output.display(),
            summary.removed_by_whitelist
        ));

        Ok(summary)
    }

    /// Returns `None` when the configured blacklist cannot be read, which
    /// counts as no blacklist supplied.
    async fn load_blacklist(&self, ctx: &RunContext, path: &Path) -> Option<Vec<Domain>> {
        match read_text(path).await {
            Ok(text) => {
                let domains: Vec<Domain> = Normalizer::new(&text).into_iter().collect();
                ctx.log.info(format_args!(
                    "blacklist {}: {} domain(s)",
                    path.display(),
                    domains.len()
                ));
                Some(domains)
            }
            Err(err) => {
                ctx.log.warn(format_args!("blacklist {}: ignored ({err})", path.display()));
                None
            }
        }
    }

    async fn load_source_list(&self, ctx: &RunContext) -> Vec<SourceLocator> {
        let path = &self.config.sources;
        match read_text(path).await {
            Ok(text) => {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                parse_source_list(&text)
                    .into_iter()
                    .map(|locator| locator.resolve_relative_to(base))
                    .collect()
            }
            Err(err) => {
                ctx.log.warn(format_args!("source list {}: unreadable ({err})", path.display()));
                Vec::new()
            }
        }
    }

    async fn load_whitelist(&self, ctx: &RunContext) -> Whitelist {
        let policy = self.config.whitelist_policy;
        let Some(path) = &self.config.whitelist else {
            return Whitelist::empty(policy);
        };

        match read_text(path).await {
            Ok(text) => {
                let whitelist = Whitelist::new(Normalizer::new(&text), policy);
                ctx.log.info(format_args!(
                    "whitelist {}: {} domain(s), {policy:?} policy",
                    path.display(),
                    whitelist.len()
                ));
                whitelist
            }
            Err(err) => {
                ctx.log.warn(format_args!("whitelist {}: ignored ({err})", path.display()));
                Whitelist::empty(policy)
            }
        }
    }

    async fn load_header(&self, ctx: &RunContext) -> String {
        let Some(path) = &self.config.header else {
            return String::new();
        };

        read_text(path).await.unwrap_or_else(|err| {
            ctx.log.warn(format_args!("header {}: ignored ({err})", path.display()));
            String::new()
        })
    }
}

fn log_fetched(ctx: &RunContext, locator: &SourceLocator, origin: &FetchOrigin) -> SourceStatus {
    match origin {
        FetchOrigin::Local => {
            ctx.log.ok(format_args!("{locator}: read"));
            SourceStatus::Local
        }
        FetchOrigin::Downloaded => {
            ctx.log.ok(format_args!("{locator}: downloaded"));
            SourceStatus::Downloaded
        }
        FetchOrigin::Reused => {
            ctx.log.info(format_args!("{locator}: unchanged, reused archived copy"));
            SourceStatus::Reused
        }
        FetchOrigin::Degraded(err) => {
            ctx.log.warn(format_args!("{locator}: {err}, using archived copy (offline)"));
            SourceStatus::Degraded
        }
    }
}

async fn read_text(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
