//! Merge domain service.
//!
//! Implements the driving ports by running ingestion, extraction and merging
//! in sequence, then serving the stored artifact on request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::Error;
use crate::domain::archive_ingest::ArchiveIngestor;
use crate::domain::entry_extractor::EntryExtractor;
use crate::domain::filename::FilenameDecoder;
use crate::domain::ports::{
    ArchiveReader, ArchiveSource, ArchiveUpload, ArtifactQuery, BlobKey, BlobStore,
    BlobStoreError, MERGED_ARTIFACT_KEY, MergeArtifact, MergeCommand, MergeOutcome,
    UPLOADED_ARCHIVE_KEY,
};
use crate::domain::table_merger::{DEFAULT_LABEL_COLUMN, TableMerger};

fn map_store_error(error: BlobStoreError) -> Error {
    Error::internal(format!("blob store error: {error}"))
}

fn fixed_key(raw: &str) -> Result<BlobKey, Error> {
    BlobKey::new(raw).map_err(|err| Error::internal(format!("invalid blob key {raw}: {err}")))
}

/// Tunables for a [`MergeService`].
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Decoder applied to entry names without the UTF-8 flag.
    pub filename_decoder: FilenameDecoder,
    /// Name of the provenance column added to each row.
    pub label_column: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            filename_decoder: FilenameDecoder::default(),
            label_column: DEFAULT_LABEL_COLUMN.to_owned(),
        }
    }
}

/// Merge service implementing [`MergeCommand`] and [`ArtifactQuery`].
pub struct MergeService<S, R, B> {
    ingestor: ArchiveIngestor<S>,
    extractor: EntryExtractor<R, B>,
    merger: TableMerger<B>,
    store: Arc<B>,
}

impl<S, R, B> MergeService<S, R, B> {
    /// Wire the service over its driven ports.
    pub fn new(source: Arc<S>, reader: Arc<R>, store: Arc<B>, config: MergeConfig) -> Self {
        Self {
            ingestor: ArchiveIngestor::new(source),
            extractor: EntryExtractor::new(reader, Arc::clone(&store), config.filename_decoder),
            merger: TableMerger::new(Arc::clone(&store), config.label_column),
            store,
        }
    }
}

#[async_trait]
impl<S, R, B> MergeCommand for MergeService<S, R, B>
where
    S: ArchiveSource,
    R: ArchiveReader + 'static,
    B: BlobStore,
{
    #[instrument(skip_all)]
    async fn merge(&self, upload: ArchiveUpload) -> Result<MergeOutcome, Error> {
        let archive = self.ingestor.ingest(upload).await?;

        self.store
            .put(&fixed_key(UPLOADED_ARCHIVE_KEY)?, archive.clone())
            .await
            .map_err(map_store_error)?;

        let entries = self.extractor.extract(archive).await?;
        let outcome = self.merger.merge(&entries).await?;
        info!(
            entries = entries.len(),
            merged = outcome.report.merged_count(),
            status = ?outcome.status,
            "merge run finished"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<S, R, B> ArtifactQuery for MergeService<S, R, B>
where
    S: ArchiveSource,
    R: ArchiveReader + 'static,
    B: BlobStore,
{
    async fn fetch_artifact(&self) -> Result<MergeArtifact, Error> {
        let contents = self
            .store
            .get(&fixed_key(MERGED_ARTIFACT_KEY)?)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found("file not found"))?;

        Ok(MergeArtifact {
            file_name: MERGED_ARTIFACT_KEY.to_owned(),
            contents,
        })
    }
}

#[cfg(test)]
#[path = "merge_service_tests.rs"]
mod tests;
