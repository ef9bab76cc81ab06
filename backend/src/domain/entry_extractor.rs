//! Entry extraction: unpack an archive into the `extracted/` namespace.
//!
//! The namespace is cleared first, so it always reflects the most recent
//! upload. Clearing and writing are not atomic as a whole; a concurrent reader
//! may observe an empty or partially populated namespace.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::filename::{FilenameDecoder, sanitize_entry_path};
use crate::domain::ports::{
    ArchiveReader, ArchiveReaderError, BlobKey, BlobStore, BlobStoreError, EXTRACTED_PREFIX,
};
use crate::domain::{Error, TraceId};

/// An extracted entry and where its bytes were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Repaired logical path inside the archive.
    pub path: String,
    /// Blob key holding the entry contents.
    pub key: BlobKey,
}

/// Failures that abort extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The archive could not be read.
    #[error(transparent)]
    Archive(#[from] ArchiveReaderError),
    /// Writing an entry or clearing the namespace failed.
    #[error(transparent)]
    Storage(#[from] BlobStoreError),
    /// The blocking archive reader did not complete.
    #[error("archive reader task failed: {message}")]
    Task {
        /// Join failure description.
        message: String,
    },
}

impl From<ExtractError> for Error {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::Archive(err) => Error::invalid_request(err.to_string()),
            ExtractError::Storage(err) => Error::internal(err.to_string()),
            ExtractError::Task { message } => Error::internal(message),
        }
    }
}

/// Unpacks archives and stores their file entries.
pub struct EntryExtractor<R, B> {
    reader: Arc<R>,
    store: Arc<B>,
    decoder: FilenameDecoder,
}

impl<R, B> Clone for EntryExtractor<R, B> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            store: Arc::clone(&self.store),
            decoder: self.decoder,
        }
    }
}

impl<R, B> EntryExtractor<R, B> {
    /// Create an extractor over the given reader and store.
    pub fn new(reader: Arc<R>, store: Arc<B>, decoder: FilenameDecoder) -> Self {
        Self {
            reader,
            store,
            decoder,
        }
    }
}

impl<R, B> EntryExtractor<R, B>
where
    R: ArchiveReader + 'static,
    B: BlobStore,
{
    /// Replace the `extracted/` namespace with the contents of `archive`.
    ///
    /// Directory markers are skipped, as are entries whose path is empty after
    /// sanitising. Entries are returned in archive order.
    pub async fn extract(&self, archive: Vec<u8>) -> Result<Vec<StoredEntry>, ExtractError> {
        let prefix = BlobKey::new(EXTRACTED_PREFIX)
            .map_err(|err| BlobStoreError::io(EXTRACTED_PREFIX, err.to_string()))?;
        self.store.remove_prefix(&prefix).await?;

        let reader = Arc::clone(&self.reader);
        let entries = tokio::task::spawn_blocking(TraceId::in_blocking_scope(move || {
            reader.read_entries(&archive)
        }))
        .await
        .map_err(|err| ExtractError::Task {
            message: err.to_string(),
        })??;

        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().filter(|entry| !entry.is_dir) {
            let repaired = self.decoder.repair(&entry.raw_name, entry.name_is_utf8);
            let Some(path) = sanitize_entry_path(&repaired) else {
                warn!(name = %repaired, "skipping archive entry with an empty path");
                continue;
            };
            let key = prefix.join(&path).map_err(|err| {
                BlobStoreError::io(path.clone(), format!("unusable entry path: {err}"))
            })?;
            self.store.put(&key, entry.contents).await?;
            debug!(path = %path, key = %key, "stored archive entry");
            stored.push(StoredEntry { path, key });
        }
        Ok(stored)
    }
}
