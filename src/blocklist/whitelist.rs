//! Whitelist filtering with a selectable matching policy.

use std::collections::HashSet;

use serde::Deserialize;

use super::{AggregatedSet, Domain};

/// How whitelist entries match aggregated domains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WhitelistPolicy {
    /// A domain is removed only if it is itself whitelisted.
    #[default]
    Exact,
    /// A domain is removed if it or any of its ancestors is whitelisted.
    AncestorInclusive,
}

/// A set of whitelisted domains bound to a policy.
///
/// Blacklisted domains are never removed, whatever the policy.
#[derive(Debug, Clone)]
pub struct Whitelist {
    entries: HashSet<Domain>,
    policy: WhitelistPolicy,
}

impl Whitelist {
    pub fn new<I>(entries: I, policy: WhitelistPolicy) -> Self
    where
        I: IntoIterator<Item = Domain>,
    {
        Self {
            entries: entries.into_iter().collect(),
            policy,
        }
    }

    /// A whitelist that removes nothing.
    #[must_use]
    pub fn empty(policy: WhitelistPolicy) -> Self {
        Self::new(std::iter::empty(), policy)
    }

    #[must_use]
    pub const fn policy(&self) -> WhitelistPolicy {
        self.policy
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether the policy matches `domain`, ignoring blacklist precedence.
    #[must_use]
    pub fn is_whitelisted(&self, domain: &Domain) -> bool {
        if self.entries.contains(domain) {
            return true;
        }

        match self.policy {
            WhitelistPolicy::Exact => false,
            WhitelistPolicy::AncestorInclusive => domain
                .ancestors()
                .any(|ancestor| self.entries.contains(ancestor)),
        }
    }

    /// Remove whitelisted domains from the aggregated set.
    ///
    /// Domains that came from the blacklist are always kept.
    #[must_use]
    pub fn filter(&self, aggregated: AggregatedSet) -> HashSet<Domain> {
        let (mut domains, blacklisted) = aggregated.into_parts();
        if self.entries.is_empty() {
            return domains;
        }

        let before = domains.len();
        domains.retain(|domain| blacklisted.contains(domain) || !self.is_whitelisted(domain));

        tracing::debug!(
            policy = ?self.policy,
            removed = before - domains.len(),
            kept = domains.len(),
            "applied whitelist"
        );

        domains
    }
}
