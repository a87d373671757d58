//! Merging of the blacklist and every source into one deduplicated set.

use std::collections::HashSet;

use super::Domain;

/// Unique domains gathered for one run.
///
/// Blacklisted domains are remembered separately so that filtering can never
/// drop them.
#[derive(Debug, Clone, Default)]
pub struct AggregatedSet {
    domains: HashSet<Domain>,
    blacklisted: HashSet<Domain>,
}

impl AggregatedSet {
    /// Start a set seeded with the blacklist.
    pub fn with_blacklist<B>(blacklist: B) -> Self
    where
        B: IntoIterator<Item = Domain>,
    {
        let blacklisted: HashSet<Domain> = blacklist.into_iter().collect();
        Self {
            domains: blacklisted.clone(),
            blacklisted,
        }
    }

    /// Insert every domain of one source, consuming it lazily.
    ///
    /// Returns the number of tokens the source yielded, duplicates included.
    pub fn extend_source<I>(&mut self, source: I) -> usize
    where
        I: IntoIterator<Item = Domain>,
    {
        let mut yielded = 0;
        for domain in source {
            yielded += 1;
            self.domains.insert(domain);
        }
        yielded
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    #[must_use]
    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    #[must_use]
    pub fn is_blacklisted(&self, domain: &str) -> bool {
        self.blacklisted.contains(domain)
    }

    /// Number of distinct blacklist entries.
    #[must_use]
    pub fn blacklisted_len(&self) -> usize {
        self.blacklisted.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }

    /// Split into the full domain set and its blacklisted subset.
    #[must_use]
    pub fn into_parts(self) -> (HashSet<Domain>, HashSet<Domain>) {
        (self.domains, self.blacklisted)
    }
}

/// Merge the blacklist and all source sequences.
///
/// Blacklist domains go in first, then every source in order. Duplicates
/// collapse.
pub fn aggregate<B, S, I>(blacklist: B, sources: S) -> AggregatedSet
where
    B: IntoIterator<Item = Domain>,
    S: IntoIterator<Item = I>,
    I: IntoIterator<Item = Domain>,
{
    let mut set = AggregatedSet::with_blacklist(blacklist);
    let raw: usize = sources
        .into_iter()
        .map(|source| set.extend_source(source))
        .sum();

    tracing::debug!(
        blacklisted = set.blacklisted_len(),
        raw_source_domains = raw,
        unique = set.len(),
        "aggregated domains"
    );

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::Normalizer;

    fn domains(content: &str) -> Vec<Domain> {
        Normalizer::new(content).into_iter().collect()
    }

    #[test]
    fn should_collapse_duplicates_across_sources() {
        let first = domains("0.0.0.0 a.example.com\n0.0.0.0 b.example.com");
        let second = domains("b.example.com\nc.example.com\na.example.com");

        let set = aggregate(Vec::new(), [first, second]);

        assert_eq!(set.len(), 3);
        assert!(set.contains("a.example.com"));
        assert!(set.contains("b.example.com"));
        assert!(set.contains("c.example.com"));
    }

    #[test]
    fn should_include_blacklist_without_any_source() {
        let blacklist = domains("pinned.example.com");

        let set = aggregate(blacklist, Vec::<Vec<Domain>>::new());

        assert_eq!(set.len(), 1);
        assert!(set.contains("pinned.example.com"));
        assert!(set.is_blacklisted("pinned.example.com"));
    }

    #[test]
    fn should_track_blacklisted_subset_only() {
        let blacklist = domains("pinned.example.com");
        let source = domains("pinned.example.com\nother.example.com");

        let set = aggregate(blacklist, [source]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.blacklisted_len(), 1);
        assert!(set.is_blacklisted("pinned.example.com"));
        assert!(!set.is_blacklisted("other.example.com"));
    }

    #[test]
    fn should_be_empty_without_input() {
        let set = aggregate(Vec::new(), Vec::<Vec<Domain>>::new());
        assert!(set.is_empty());
    }

    #[test]
    fn should_count_tokens_per_source_incrementally() {
        let mut set = AggregatedSet::with_blacklist(domains("pinned.example.com"));

        let first = set.extend_source(Normalizer::new("a.example.com\na.example.com"));
        let second = set.extend_source(Normalizer::new("pinned.example.com b.example.com"));

        assert_eq!(first, 2);
        assert_eq!(second, 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.blacklisted_len(), 1);
    }

    #[test]
    fn should_accept_lazy_normalizers() {
        let text = "x.example.com\ny.example.com";
        let set = aggregate(Vec::new(), [Normalizer::new(text), Normalizer::new(text)]);
        assert_eq!(set.len(), 2);
    }
}
