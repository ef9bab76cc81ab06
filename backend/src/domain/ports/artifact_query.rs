//! Driving port for reading the current merge artifact.

use async_trait::async_trait;

use crate::domain::Error;

/// The persisted merge artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeArtifact {
    /// File name offered to the client.
    pub file_name: String,
    /// UTF-8 (BOM) CSV bytes.
    pub contents: Vec<u8>,
}

/// Driving port for artifact downloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactQuery: Send + Sync {
    /// Return the artifact of the most recent successful merge.
    ///
    /// Fails with a not-found error when no merge has succeeded yet.
    async fn fetch_artifact(&self) -> Result<MergeArtifact, Error>;
}

/// Fixture query for a service that has never merged anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureArtifactQuery;

#[async_trait]
impl ArtifactQuery for FixtureArtifactQuery {
    async fn fetch_artifact(&self) -> Result<MergeArtifact, Error> {
        Err(Error::not_found("file not found"))
    }
}
