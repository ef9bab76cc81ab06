//! Reqwest-backed archive source adapter.
//!
//! This adapter owns transport details only: request timeout, body size limit
//! and HTTP error mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::ports::{ArchiveSource, ArchiveSourceError};

const DEFAULT_USER_AGENT: &str = "csvmerge/0.1";

/// Archive source performing HTTP GET requests.
pub struct HttpArchiveSource {
    client: Client,
    max_bytes: u64,
}

impl HttpArchiveSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// Bodies larger than `max_bytes` are rejected while streaming.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl ArchiveSource for HttpArchiveSource {
    async fn fetch_archive(&self, url: &Url) -> Result<Vec<u8>, ArchiveSourceError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(map_status_error(status, body.as_ref()));
        }
        if response
            .content_length()
            .is_some_and(|length| length > self.max_bytes)
        {
            return Err(ArchiveSourceError::too_large(self.max_bytes));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_transport_error)? {
            append_bounded(&mut body, &chunk, self.max_bytes)?;
        }
        Ok(body)
    }
}

fn append_bounded(body: &mut Vec<u8>, chunk: &[u8], limit: u64) -> Result<(), ArchiveSourceError> {
    let total = body.len().saturating_add(chunk.len());
    if u64::try_from(total).map_or(true, |total| total > limit) {
        return Err(ArchiveSourceError::too_large(limit));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

fn map_transport_error(error: reqwest::Error) -> ArchiveSourceError {
    if error.is_timeout() {
        ArchiveSourceError::timeout(error.to_string())
    } else {
        ArchiveSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ArchiveSourceError {
    let body_preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ArchiveSourceError::timeout(format!("status {}", status.as_u16()))
        }
        _ => ArchiveSourceError::status(status.as_u16(), body_preview),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
