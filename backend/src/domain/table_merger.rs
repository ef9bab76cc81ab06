//! Table merging: parse every extracted `.csv` entry, label and union them.
//!
//! A file that fails to decode or parse is recorded as skipped and never
//! aborts the run. The artifact is written only when at least one table was
//! produced, so a run with nothing usable leaves the previous artifact intact.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entry_extractor::StoredEntry;
use crate::domain::filename::label_for_path;
use crate::domain::ports::{
    BlobKey, BlobStore, BlobStoreError, FileReport, FileStatus, MERGED_ARTIFACT_KEY, MergeOutcome,
    MergeReport, MergeStatus,
};
use crate::domain::table::{Table, TableParseError};
use crate::domain::text_encoding::{decode_strict, detect_encoding};
use crate::domain::Error;

/// Default name of the provenance column added to every row.
pub const DEFAULT_LABEL_COLUMN: &str = "日期";

/// Extension selecting the entries to merge. Matched case-sensitively.
const CSV_EXTENSION: &str = ".csv";

/// Failures that abort a merge after parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Reading an entry or writing the artifact failed.
    #[error(transparent)]
    Storage(#[from] BlobStoreError),
    /// The merged table could not be serialised.
    #[error("failed to serialise merged table: {message}")]
    Serialise {
        /// Writer diagnostic.
        message: String,
    },
}

impl From<MergeError> for Error {
    fn from(error: MergeError) -> Self {
        Error::internal(error.to_string())
    }
}

/// A parsed entry and the encoding it was decoded with.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    /// Parsed table.
    pub table: Table,
    /// Name of the detected encoding, for example `UTF-8` or `GBK`.
    pub encoding: &'static str,
}

/// Detect the encoding of `contents`, decode it strictly and parse a table.
pub fn parse_entry(contents: &[u8]) -> Result<ParsedEntry, TableParseError> {
    let encoding = detect_encoding(contents);
    let text = decode_strict(contents, encoding)?;
    let table = Table::parse_csv(&text)?;
    Ok(ParsedEntry {
        table,
        encoding: encoding.name(),
    })
}

/// Merges extracted CSV entries into the single artifact.
pub struct TableMerger<B> {
    store: Arc<B>,
    label_column: String,
}

impl<B> Clone for TableMerger<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            label_column: self.label_column.clone(),
        }
    }
}

impl<B> TableMerger<B> {
    /// Create a merger writing to `store` and labelling rows under `label_column`.
    pub fn new(store: Arc<B>, label_column: impl Into<String>) -> Self {
        Self {
            store,
            label_column: label_column.into(),
        }
    }

    /// Name of the provenance column.
    pub fn label_column(&self) -> &str {
        &self.label_column
    }
}

impl<B> TableMerger<B>
where
    B: BlobStore,
{
    /// Merge the `.csv` entries among `entries`, in order.
    pub async fn merge(&self, entries: &[StoredEntry]) -> Result<MergeOutcome, MergeError> {
        let mut report = MergeReport::default();
        let mut tables = Vec::new();

        for entry in entries
            .iter()
            .filter(|entry| entry.path.ends_with(CSV_EXTENSION))
        {
            let status = match self.store.get(&entry.key).await? {
                None => {
                    warn!(path = %entry.path, "extracted entry disappeared before merging");
                    FileStatus::Skipped {
                        reason: "entry missing from storage".to_owned(),
                    }
                }
                Some(contents) => match parse_entry(&contents) {
                    Ok(ParsedEntry { table, encoding }) => {
                        let rows = table.row_count();
                        let label = label_for_path(&entry.path);
                        tables.push(table.labeled(&self.label_column, &label));
                        FileStatus::Merged {
                            rows,
                            encoding: encoding.to_owned(),
                        }
                    }
                    Err(err) => {
                        warn!(path = %entry.path, error = %err, "skipping unparseable CSV entry");
                        FileStatus::Skipped {
                            reason: err.to_string(),
                        }
                    }
                },
            };
            report.files.push(FileReport {
                path: entry.path.clone(),
                status,
            });
        }

        if tables.is_empty() {
            warn!(candidates = report.files.len(), "no valid CSV files to merge");
            return Ok(MergeOutcome {
                status: MergeStatus::NoValidTables,
                artifact_key: MERGED_ARTIFACT_KEY.to_owned(),
                report,
            });
        }

        let merged = Table::concat(tables);
        let bytes = merged.to_csv_bytes().map_err(|err| MergeError::Serialise {
            message: err.to_string(),
        })?;
        let key = BlobKey::new(MERGED_ARTIFACT_KEY)
            .map_err(|err| BlobStoreError::io(MERGED_ARTIFACT_KEY, err.to_string()))?;
        self.store.put(&key, bytes).await?;
        info!(
            files = report.merged_count(),
            rows = merged.row_count(),
            columns = merged.columns().len(),
            "wrote merged artifact"
        );

        Ok(MergeOutcome {
            status: MergeStatus::Merged,
            artifact_key: key.to_string(),
            report,
        })
    }
}

#[cfg(test)]
#[path = "table_merger_tests.rs"]
mod tests;
