//! Remote list fetching and validator probing.
//!
//! Deciding whether an archived body is still current is a two-step
//! protocol: a cheap `HEAD` probe first ([`RemoteFetcher::probe_validator`]),
//! then a full download only if the probe did not prove the archive current
//! ([`RemoteFetcher::download`]).

use std::time::Duration;

use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, ETAG, HeaderMap, IF_NONE_MATCH};
use reqwest::{Client, StatusCode, Url};

use super::FetchError;
use super::archive::ArchiveEntry;
use crate::config::HttpSettings;

/// User-Agent header value for HTTP requests.
const USER_AGENT: &str = concat!("hostsgen/", env!("CARGO_PKG_VERSION"));

/// Outcome of a validator probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The remote confirmed the archived body is current.
    Unchanged,
    /// The remote reported a different version.
    Changed,
    /// The probe failed or the remote exposed nothing to compare.
    Unknown,
}

/// A fully downloaded body with the validators its response exposed.
#[derive(Debug, Clone)]
pub struct Download {
    pub body: Vec<u8>,
    pub etag: Option<String>,
    pub size: Option<u64>,
}

/// HTTP side of source fetching.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
    probe_timeout: Duration,
}

impl RemoteFetcher {
    /// Create a fetcher with the configured time budgets.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.timeout())
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            probe_timeout: settings.probe_timeout(),
        })
    }

    /// Ask the remote whether `archived` is still current.
    ///
    /// With an ETag this is a conditional `HEAD`; without one the reported
    /// `Content-Length` is compared against [`ArchiveEntry::expected_size`].
    /// Failures never propagate: they yield [`Probe::Unknown`].
    ///
    /// The probe asks for the identity encoding: a compressed response would
    /// lose its `Content-Length`, and the archive holds decoded bytes.
    pub async fn probe_validator(&self, url: &Url, archived: &ArchiveEntry) -> Probe {
        let mut request = self
            .client
            .head(url.clone())
            .timeout(self.probe_timeout)
            .header(ACCEPT_ENCODING, "identity");
        if let Some(etag) = &archived.etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "validator probe failed");
                return Probe::Unknown;
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Probe::Unchanged;
        }
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "validator probe rejected");
            return Probe::Unknown;
        }

        let headers = response.headers();
        if let Some(archived_etag) = &archived.etag {
            return match header_etag(headers) {
                Some(etag) if etag == *archived_etag => Probe::Unchanged,
                _ => Probe::Changed,
            };
        }

        match header_length(headers) {
            Some(length) if length == archived.expected_size() => Probe::Unchanged,
            Some(_) => Probe::Changed,
            None => Probe::Unknown,
        }
    }

    /// Download the full body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Timeout`] when a time budget is exceeded and
    /// [`FetchError::Unreachable`] for any other network failure or a
    /// non-success status.
    pub async fn download(&self, url: &Url) -> Result<Download, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| request_error(url, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Unreachable {
                locator: url.to_string(),
                reason: format!("HTTP status {}", status.as_u16()),
            });
        }

        let etag = header_etag(response.headers());
        let size = header_length(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|err| request_error(url, &err))?
            .to_vec();

        Ok(Download { body, etag, size })
    }
}

fn request_error(url: &Url, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            locator: url.to_string(),
        }
    } else {
        FetchError::Unreachable {
            locator: url.to_string(),
            reason: err.to_string(),
        }
    }
}

fn header_etag(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

// Read from the header rather than the body size hint, which is empty for HEAD.
fn header_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
