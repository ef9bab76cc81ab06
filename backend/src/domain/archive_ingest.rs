//! Archive ingestion: obtain archive bytes from a URL or a direct upload.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::domain::Error;
use crate::domain::ports::{ArchiveSource, ArchiveSourceError, ArchiveUpload};

/// Reasons an upload could not produce archive bytes.
///
/// Every variant is a client-side problem and maps to an invalid request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// The `file` value is not an absolute URL.
    #[error("invalid archive URL {url:?}: {message}")]
    InvalidUrl {
        /// Value as submitted.
        url: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Downloading the archive failed.
    #[error(transparent)]
    Fetch(#[from] ArchiveSourceError),
    /// The uploaded file has no name or no content.
    #[error("no file selected")]
    EmptyUpload,
    /// The request carried neither a URL nor a file.
    #[error("no file part")]
    MissingPayload,
}

impl From<IngestError> for Error {
    fn from(error: IngestError) -> Self {
        Error::invalid_request(error.to_string())
    }
}

/// Resolves an [`ArchiveUpload`] into raw archive bytes.
#[derive(Clone)]
pub struct ArchiveIngestor<S> {
    source: Arc<S>,
}

impl<S> ArchiveIngestor<S> {
    /// Create an ingestor that downloads remote archives through `source`.
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

impl<S> ArchiveIngestor<S>
where
    S: ArchiveSource,
{
    /// Obtain the archive bytes for `upload`.
    pub async fn ingest(&self, upload: ArchiveUpload) -> Result<Vec<u8>, IngestError> {
        match upload {
            ArchiveUpload::RemoteUrl(raw) => {
                let url = Url::parse(raw.trim()).map_err(|err| IngestError::InvalidUrl {
                    url: raw.clone(),
                    message: err.to_string(),
                })?;
                let bytes = self.source.fetch_archive(&url).await.map_err(|err| {
                    warn!(url = %url, error = %err, "archive download failed");
                    IngestError::from(err)
                })?;
                debug!(url = %url, bytes = bytes.len(), "downloaded archive");
                Ok(bytes)
            }
            ArchiveUpload::Direct { file_name, bytes } => {
                let named = file_name.is_some_and(|name| !name.trim().is_empty());
                if !named || bytes.is_empty() {
                    return Err(IngestError::EmptyUpload);
                }
                debug!(bytes = bytes.len(), "received uploaded archive");
                Ok(bytes)
            }
            ArchiveUpload::Missing => Err(IngestError::MissingPayload),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Ingestion coverage for both upload forms.

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{FixtureArchiveSource, MockArchiveSource};
    use rstest::rstest;

    fn fixture_ingestor(payload: &[u8]) -> ArchiveIngestor<FixtureArchiveSource> {
        ArchiveIngestor::new(Arc::new(FixtureArchiveSource::new(payload.to_vec())))
    }

    #[tokio::test]
    async fn remote_url_is_fetched() {
        let bytes = fixture_ingestor(b"PK")
            .ingest(ArchiveUpload::RemoteUrl("https://example.com/a.zip".into()))
            .await
            .expect("fetch succeeds");
        assert_eq!(bytes, b"PK");
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_fetching() {
        let mut source = MockArchiveSource::new();
        source.expect_fetch_archive().never();
        let ingestor = ArchiveIngestor::new(Arc::new(source));

        let error = ingestor
            .ingest(ArchiveUpload::RemoteUrl("not a url".into()))
            .await
            .expect_err("invalid URL");
        assert!(matches!(error, IngestError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn fetch_failures_become_invalid_requests() {
        let mut source = MockArchiveSource::new();
        source
            .expect_fetch_archive()
            .times(1)
            .return_once(|_| Err(ArchiveSourceError::status(404_u16, "missing")));
        let ingestor = ArchiveIngestor::new(Arc::new(source));

        let error = ingestor
            .ingest(ArchiveUpload::RemoteUrl("https://example.com/gone.zip".into()))
            .await
            .expect_err("fetch fails");
        assert!(matches!(error, IngestError::Fetch(_)));

        let domain_error = Error::from(error);
        assert_eq!(domain_error.code(), ErrorCode::InvalidRequest);
        assert!(domain_error.message().contains("404"));
    }

    #[rstest]
    #[case(None, b"PK".to_vec())]
    #[case(Some("  ".to_owned()), b"PK".to_vec())]
    #[case(Some("data.zip".to_owned()), Vec::new())]
    #[tokio::test]
    async fn empty_direct_uploads_are_rejected(
        #[case] file_name: Option<String>,
        #[case] bytes: Vec<u8>,
    ) {
        let error = fixture_ingestor(b"")
            .ingest(ArchiveUpload::Direct { file_name, bytes })
            .await
            .expect_err("empty upload");
        assert_eq!(error, IngestError::EmptyUpload);
    }

    #[tokio::test]
    async fn direct_upload_passes_bytes_through() {
        let bytes = fixture_ingestor(b"")
            .ingest(ArchiveUpload::Direct {
                file_name: Some("data.zip".into()),
                bytes: b"PK\x03\x04".to_vec(),
            })
            .await
            .expect("direct upload");
        assert_eq!(bytes, b"PK\x03\x04");
    }

    #[tokio::test]
    async fn missing_payload_is_reported() {
        let error = fixture_ingestor(b"")
            .ingest(ArchiveUpload::Missing)
            .await
            .expect_err("missing");
        assert_eq!(error.to_string(), "no file part");
    }
}
