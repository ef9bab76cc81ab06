//! Driven port for fetching archive bytes from a remote URL.
//!
//! The domain owns the error contract so the ingestor can report transport
//! failures without knowing which HTTP client performed the request.

use async_trait::async_trait;
use url::Url;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while downloading a remote archive.
    pub enum ArchiveSourceError {
        /// Network transport failed before a full response was received.
        Transport { message: String } =>
            "archive download failed: {message}",
        /// The request exceeded the configured timeout.
        Timeout { message: String } =>
            "archive download timed out: {message}",
        /// The remote server answered with a non-success status.
        Status { status: u16, message: String } =>
            "archive download returned status {status}: {message}",
        /// The response body exceeded the configured size limit.
        TooLarge { limit: u64 } =>
            "archive download exceeds {limit} bytes",
    }
}

/// Port for retrieving archive bytes addressed by URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Download the complete archive body.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use csvmerge::domain::ports::{ArchiveSource, FixtureArchiveSource};
    ///
    /// let source = FixtureArchiveSource::new(b"PK\x05\x06".to_vec());
    /// let url = url::Url::parse("https://example.invalid/data.zip")?;
    /// let bytes = source.fetch_archive(&url).await?;
    /// assert_eq!(bytes.len(), 4);
    /// ```
    async fn fetch_archive(&self, url: &Url) -> Result<Vec<u8>, ArchiveSourceError>;
}

/// Fixture source returning a preset payload for every URL.
#[derive(Debug, Clone, Default)]
pub struct FixtureArchiveSource {
    payload: Vec<u8>,
}

impl FixtureArchiveSource {
    /// Build a fixture that answers every fetch with `payload`.
    #[must_use]
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl ArchiveSource for FixtureArchiveSource {
    async fn fetch_archive(&self, _url: &Url) -> Result<Vec<u8>, ArchiveSourceError> {
        Ok(self.payload.clone())
    }
}
