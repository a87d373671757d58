//! Hosts file rendering.
//!
//! Output layout:
//!
//! ```text
//! <static header, verbatim>
//!
//! # Blocked domains
//! 0.0.0.0 a.example.com
//! 0.0.0.0 b.example.com
//! ```

use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::net::IpAddr;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::blocklist::Domain;
use crate::error::{Error, Result};

/// Comment line separating the header from the generated entries.
pub const ENTRIES_MARKER: &str = "# Blocked domains";

/// Sort domains in plain lexicographic order.
#[must_use]
pub fn sort_domains(domains: HashSet<Domain>) -> Vec<Domain> {
    let mut sorted: Vec<Domain> = domains.into_iter().collect();
    sorted.sort_unstable();
    sorted
}

/// Render the full output: header, blank line, marker, one mapping per domain.
///
/// `domains` are emitted in the given order; callers pass them through
/// [`sort_domains`] first.
#[must_use]
pub fn render(header: &str, domains: &[Domain], address: IpAddr) -> String {
    let mut output = String::with_capacity(header.len() + domains.len() * 32);

    output.push_str(header);
    if !header.is_empty() && !header.ends_with('\n') {
        output.push('\n');
    }
    output.push('\n');
    output.push_str(ENTRIES_MARKER);
    output.push('\n');

    for domain in domains {
        // Writing to a String cannot fail.
        let _ = writeln!(output, "{address} {domain}");
    }

    tracing::info!(count = domains.len(), "rendered hosts entries");
    output
}

/// Write the rendered output in one step.
///
/// Content goes to a temporary file next to `path` which is then renamed
/// over it, so readers never see a partial file.
///
/// # Errors
///
/// Returns [`Error::OutputWriteFailed`] if any step fails.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    let io_err = |source| Error::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(io_err)?;

    let mut temp_file = NamedTempFile::new_in(parent).map_err(io_err)?;
    temp_file.write_all(content.as_bytes()).map_err(io_err)?;
    temp_file.as_file().sync_all().map_err(io_err)?;
    temp_file.persist(path).map_err(|err| io_err(err.error))?;

    tracing::debug!(path = ?path, bytes = content.len(), "wrote output file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::Normalizer;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    const SINK: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

    fn domains(content: &str) -> HashSet<Domain> {
        Normalizer::new(content).into_iter().collect()
    }

    #[test]
    fn should_sort_lexicographically() {
        let sorted = sort_domains(domains("b.example.com\na.example.org\na.example.com"));
        let sorted: Vec<&str> = sorted.iter().map(Domain::as_str).collect();
        assert_eq!(sorted, vec!["a.example.com", "a.example.org", "b.example.com"]);
    }

    #[test]
    fn should_render_header_marker_and_entries() {
        let sorted = sort_domains(domains("b.example.com\na.example.com"));

        let output = render("127.0.0.1 localhost\n", &sorted, SINK);

        assert_eq!(
            output,
            "127.0.0.1 localhost\n\n# Blocked domains\n0.0.0.0 a.example.com\n0.0.0.0 b.example.com\n"
        );
    }

    #[test]
    fn should_terminate_header_without_trailing_newline() {
        let output = render("# header", &[], SINK);
        assert_eq!(output, "# header\n\n# Blocked domains\n");
    }

    #[test]
    fn should_render_without_header() {
        let sorted = sort_domains(domains("a.example.com"));
        let output = render("", &sorted, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(output, "\n# Blocked domains\n127.0.0.1 a.example.com\n");
    }

    #[test]
    fn should_replace_existing_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("hosts");

        write_output(&path, "first\n").unwrap();
        write_output(&path, "second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn should_fail_when_output_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let result = write_output(&blocker.join("hosts"), "content");

        assert!(matches!(result, Err(Error::OutputWriteFailed { .. })));
    }
}
