//! Domain list processing.
//!
//! Raw list text goes through three stages before it is emitted:
//!
//! - **Normalization**: every line is cleaned up and scanned for domain
//!   tokens, see [`Normalizer`].
//! - **Aggregation**: the blacklist and all source sequences are merged into a
//!   deduplicated [`AggregatedSet`].
//! - **Whitelisting**: entries are removed according to a [`WhitelistPolicy`],
//!   blacklisted entries excepted.
//!
//! # Example
//!
//! ```
//! use hostsgen::blocklist::{Normalizer, Whitelist, WhitelistPolicy, aggregate};
//!
//! let source = "0.0.0.0 ads.example.com\n0.0.0.0 x.ads.example.com # tracker";
//! let aggregated = aggregate(Vec::new(), [Normalizer::new(source)]);
//!
//! let whitelist = Whitelist::new(Normalizer::new("ads.example.com"), WhitelistPolicy::Exact);
//! let kept = whitelist.filter(aggregated);
//! assert_eq!(kept.len(), 1);
//! ```

mod aggregator;
mod normalizer;
mod whitelist;

use std::borrow::Borrow;
use std::fmt;

pub use aggregator::{AggregatedSet, aggregate};
pub use normalizer::{Domains, LineSkip, Normalizer, parse_line};
pub use whitelist::{Whitelist, WhitelistPolicy};

/// A canonical domain token extracted from list text.
///
/// Tokens are stored lowercase; equality is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Domain(String);

impl Domain {
    pub(crate) fn from_token(token: &str) -> Self {
        Self(token.to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the proper ancestors of this domain, closest first.
    ///
    /// `x.ads.example.com` yields `ads.example.com`, `example.com`, `com`.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        let mut rest = self.0.as_str();
        std::iter::from_fn(move || {
            let (_, parent) = rest.split_once('.')?;
            rest = parent;
            Some(parent)
        })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_lowercase_tokens() {
        let domain = Domain::from_token("Ads.Example.COM");
        assert_eq!(domain.as_str(), "ads.example.com");
    }

    #[test]
    fn should_list_ancestors_closest_first() {
        let domain = Domain::from_token("x.ads.example.com");
        let ancestors: Vec<_> = domain.ancestors().collect();
        assert_eq!(ancestors, vec!["ads.example.com", "example.com", "com"]);
    }

    #[test]
    fn should_have_no_ancestors_for_single_label() {
        let domain = Domain::from_token("localhost");
        assert_eq!(domain.ancestors().count(), 0);
    }

    #[test]
    fn should_order_lexicographically() {
        let mut domains = vec![
            Domain::from_token("b.example.com"),
            Domain::from_token("a.example.com"),
            Domain::from_token("a.example.co"),
        ];
        domains.sort();
        let sorted: Vec<_> = domains.iter().map(Domain::as_str).collect();
        assert_eq!(sorted, vec!["a.example.co", "a.example.com", "b.example.com"]);
    }
}
