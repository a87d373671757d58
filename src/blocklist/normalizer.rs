//! Line normalization and domain token extraction.
//!
//! Accepts hosts files, plain domain lists and most free-form text. The
//! extractor is deliberately loose: every substring shaped like a domain is
//! taken, whatever surrounds it.

use std::net::Ipv4Addr;
use std::str::Lines;
use std::sync::LazyLock;

use regex::{Matches, Regex};

use super::Domain;

/// One or more labels each followed by a dot, then a final label of at least
/// two letters.
static DOMAIN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[A-Za-z0-9_-]+\.)+[A-Za-z]{2,}").expect("domain token pattern is valid")
});

/// Loopback addresses used as the target column of hosts-style lists.
const LOOPBACK_PREFIXES: &[&str] = &["0.0.0.0", "127.0.0.1"];

/// Comment markers; everything from the first one to the end of line is dropped.
const COMMENT_MARKERS: &[&str] = &["#", "//"];

/// Why a line produced no content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSkip {
    /// Blank, or nothing left once the comment was removed.
    Empty,
    /// The whole line is an IPv4 literal.
    BareIpv4,
}

/// Clean up a single line of list text.
///
/// Steps, in order: strip the trailing comment, trim whitespace, drop empty
/// lines, strip a leading loopback address, drop bare IPv4 literals, strip a
/// trailing carriage return.
///
/// # Errors
///
/// Returns the [`LineSkip`] reason when the line carries no content.
///
/// # Example
///
/// ```
/// use hostsgen::blocklist::parse_line;
///
/// let content = parse_line("  0.0.0.0 tracker.example.net   # comment\r").unwrap();
/// assert_eq!(content, "tracker.example.net");
/// ```
pub fn parse_line(line: &str) -> Result<&str, LineSkip> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Err(LineSkip::Empty);
    }

    let line = strip_loopback(line);

    if line.parse::<Ipv4Addr>().is_ok() {
        return Err(LineSkip::BareIpv4);
    }

    Ok(line.trim_end_matches('\r'))
}

fn strip_comment(line: &str) -> &str {
    COMMENT_MARKERS
        .iter()
        .filter_map(|marker| line.find(marker))
        .min()
        .map_or(line, |idx| &line[..idx])
}

fn strip_loopback(line: &str) -> &str {
    for prefix in LOOPBACK_PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix)
            && rest.starts_with(char::is_whitespace)
        {
            return rest.trim_start();
        }
    }
    line
}

/// Lazy, restartable sequence of domain tokens over a borrowed text.
///
/// Iterating twice over the same `Normalizer` (via `&normalizer`) yields the
/// same tokens in the same order.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    text: &'a str,
}

impl<'a> Normalizer<'a> {
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Start a fresh pass over the text.
    #[must_use]
    pub fn iter(&self) -> Domains<'a> {
        Domains {
            lines: self.text.lines(),
            tokens: None,
        }
    }
}

impl<'a> IntoIterator for Normalizer<'a> {
    type Item = Domain;
    type IntoIter = Domains<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &Normalizer<'a> {
    type Item = Domain;
    type IntoIter = Domains<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`Normalizer::iter`].
#[derive(Debug)]
pub struct Domains<'a> {
    lines: Lines<'a>,
    tokens: Option<Matches<'static, 'a>>,
}

impl Iterator for Domains<'_> {
    type Item = Domain;

    fn next(&mut self) -> Option<Domain> {
        loop {
            if let Some(tokens) = self.tokens.as_mut()
                && let Some(token) = tokens.next()
            {
                return Some(Domain::from_token(token.as_str()));
            }

            let line = self.lines.next()?;
            self.tokens = parse_line(line).ok().map(|content| DOMAIN_TOKEN.find_iter(content));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(content: &str) -> Vec<String> {
        Normalizer::new(content).into_iter().map(String::from).collect()
    }

    #[test]
    fn test_hosts_line_with_comment_and_carriage_return() {
        let domains = normalize("  0.0.0.0 tracker.example.net   # comment\r");
        assert_eq!(domains, vec!["tracker.example.net"]);
    }

    #[test]
    fn test_plain_domain_list() {
        let domains = normalize("example.com\ntest.org\nanother.net");
        assert_eq!(domains, vec!["example.com", "test.org", "another.net"]);
    }

    #[test]
    fn test_127_prefix() {
        let domains = normalize("127.0.0.1 ads.example.com");
        assert_eq!(domains, vec!["ads.example.com"]);
    }

    #[test]
    fn test_multiple_domains_per_line() {
        let domains = normalize("0.0.0.0 ads.example.com tracker.example.com");
        assert_eq!(domains, vec!["ads.example.com", "tracker.example.com"]);
    }

    #[test]
    fn test_tabs() {
        let domains = normalize("0.0.0.0\tads.example.com\ttracker.example.com");
        assert_eq!(domains, vec!["ads.example.com", "tracker.example.com"]);
    }

    #[test]
    fn test_double_slash_comment() {
        let domains = normalize("ads.example.com // added by hand\n// whole line");
        assert_eq!(domains, vec!["ads.example.com"]);
    }

    #[test]
    fn test_url_scheme_counts_as_comment() {
        let domains = normalize("ads.example.com https://ignored.example.org");
        assert_eq!(domains, vec!["ads.example.com"]);
    }

    #[test]
    fn test_first_comment_marker_wins() {
        let domains = normalize("a.example.com # note // b.example.com");
        assert_eq!(domains, vec!["a.example.com"]);
    }

    #[test]
    fn test_comments_and_empty_lines() {
        let domains = normalize("# Comment\n\n   \n0.0.0.0 ads.example.com\n# Another comment\n");
        assert_eq!(domains, vec!["ads.example.com"]);
    }

    #[test]
    fn test_ignores_bare_ip_lines() {
        let domains = normalize("0.0.0.0\n192.168.1.1\n0.0.0.0 0.0.0.0\n0.0.0.0 ads.example.com");
        assert_eq!(domains, vec!["ads.example.com"]);
    }

    #[test]
    fn test_ignores_single_label_hosts() {
        let domains = normalize("127.0.0.1 localhost\n255.255.255.255 broadcasthost");
        assert!(domains.is_empty());
    }

    #[test]
    fn test_extracts_from_arbitrary_text() {
        let domains = normalize("see www.example.org/path?q=1 and mirror.example.net");
        assert_eq!(domains, vec!["www.example.org", "mirror.example.net"]);
    }

    #[test]
    fn test_lowercases_tokens() {
        let domains = normalize("0.0.0.0 Ads.Example.COM");
        assert_eq!(domains, vec!["ads.example.com"]);
    }

    #[test]
    fn test_final_label_needs_two_letters() {
        let domains = normalize("host.x\nhost.c1\nexample.io");
        assert_eq!(domains, vec!["example.io"]);
    }

    #[test]
    fn test_windows_line_endings() {
        let domains = normalize("0.0.0.0 ads.example.com\r\n0.0.0.0 tracker.example.com\r\n");
        assert_eq!(domains, vec!["ads.example.com", "tracker.example.com"]);
    }

    #[test]
    fn test_loopback_prefix_needs_whitespace() {
        assert_eq!(parse_line("0.0.0.0.example.com"), Ok("0.0.0.0.example.com"));
    }

    #[test]
    fn test_parse_line_reasons() {
        assert_eq!(parse_line(""), Err(LineSkip::Empty));
        assert_eq!(parse_line("   # only a comment"), Err(LineSkip::Empty));
        assert_eq!(parse_line("10.0.0.1"), Err(LineSkip::BareIpv4));
        assert_eq!(parse_line("127.0.0.1 10.0.0.1"), Err(LineSkip::BareIpv4));
        assert_eq!(parse_line("0.0.0.0 ads.example.com"), Ok("ads.example.com"));
    }

    #[test]
    fn test_normalizer_is_restartable() {
        let normalizer = Normalizer::new("a.example.com\nb.example.com");
        let first: Vec<_> = normalizer.iter().collect();
        let second: Vec<_> = (&normalizer).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_steven_black_sample() {
        let content = r"
# Title: StevenBlack/hosts
# Date: 2024-01-01
#
# This hosts file is a merged collection
# ==========================================

127.0.0.1 localhost
127.0.0.1 localhost.localdomain
127.0.0.1 local
255.255.255.255 broadcasthost
::1 localhost ip6-localhost ip6-loopback

# Start of blocklist
0.0.0.0 0.0.0.0
0.0.0.0 1-1ads.com
0.0.0.0 101com.com 101order.com
0.0.0.0 123found.com
";
        let domains = normalize(content);
        assert_eq!(
            domains,
            vec![
                "localhost.localdomain",
                "1-1ads.com",
                "101com.com",
                "101order.com",
                "123found.com"
            ]
        );
    }
}
