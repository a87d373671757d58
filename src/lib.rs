//! Hostsgen - A hosts blocklist builder.
//!
//! Hostsgen fetches many third-party domain lists, merges them with a local
//! blacklist, removes whitelisted entries and writes a single sorted hosts
//! file mapping every remaining domain to a sink address.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`]: Configuration loading and validation
//! - [`source`]: Source locators, fetching and the archive of remote bodies
//! - [`blocklist`]: Normalization, aggregation and whitelist filtering
//! - [`emitter`]: Hosts file rendering and atomic output
//! - [`pipeline`]: Run orchestration
//! - [`context`]: Run log and scratch area
//! - [`lock`]: Archive lock shared by concurrent runs
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```rust
//! use hostsgen::blocklist::{Normalizer, aggregate};
//! use hostsgen::emitter::{render, sort_domains};
//!
//! let source = "0.0.0.0 b.example.com\n0.0.0.0 a.example.com # tracker\n";
//! let aggregated = aggregate(Vec::new(), [Normalizer::new(source)]);
//! let (domains, _) = aggregated.into_parts();
//!
//! let output = render("", &sort_domains(domains), "0.0.0.0".parse().unwrap());
//! assert!(output.ends_with("0.0.0.0 a.example.com\n0.0.0.0 b.example.com\n"));
//! ```

pub mod blocklist;
pub mod cli;
pub mod config;
pub mod context;
pub mod emitter;
pub mod error;
pub mod lock;
pub mod pipeline;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunSummary};
