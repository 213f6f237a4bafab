//! Document sources.
//!
//! The [`DocumentSource`] trait abstracts over where the HTML comes from (HTTP
//! or a local file) so the pipeline can run offline and tests never touch the
//! network. There are no retries: a failed fetch aborts the run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while retrieving a document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to read {path}: {reason}")]
    File { path: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Anything that can turn a locator into document text.
pub trait DocumentSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Retrieve the document identified by `locator`.
    fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}

/// Fetches documents over HTTP(S) with a blocking client.
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl DocumentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        tracing::debug!(url = %locator, "fetching document");
        let resp = self
            .client
            .get(locator)
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: locator.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(|e| FetchError::Body(e.to_string()))
    }
}

/// Reads documents from the local filesystem; the locator is a path.
#[derive(Debug, Default)]
pub struct FileSource;

impl DocumentSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        let path = PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator));
        std::fs::read_to_string(&path).map_err(|e| FetchError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// True when the locator should be fetched over the network.
pub fn is_remote(locator: &str) -> bool {
    let lower = locator.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Pick a source for a locator: HTTP for `http(s)://` URLs, the filesystem otherwise.
pub fn source_for(locator: &str) -> Result<Box<dyn DocumentSource>, FetchError> {
    if is_remote(locator) {
        Ok(Box::new(HttpSource::new()?))
    } else {
        Ok(Box::new(FileSource))
    }
}
