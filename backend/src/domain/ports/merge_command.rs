//! Driving port for one upload-and-merge run.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::Error;

/// How the archive reaches the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveUpload {
    /// Archive addressed by a URL the service downloads itself.
    RemoteUrl(String),
    /// Archive bytes posted by the client.
    Direct {
        /// File name supplied with the upload, if any.
        file_name: Option<String>,
        /// Raw archive bytes.
        bytes: Vec<u8>,
    },
    /// The request carried neither a URL nor a file.
    Missing,
}

/// Outcome for one CSV entry considered by the merger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// The file was parsed and its rows appended.
    Merged {
        /// Number of data rows contributed.
        rows: usize,
        /// Encoding used to decode the file.
        encoding: String,
    },
    /// The file could not be parsed and was left out.
    Skipped {
        /// Why parsing failed.
        reason: String,
    },
}

/// Per-file line in a [`MergeReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// Logical path of the entry inside the archive.
    pub path: String,
    /// What happened to the entry.
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Per-file results in processing order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MergeReport {
    /// One line per `.csv` entry.
    pub files: Vec<FileReport>,
}

impl MergeReport {
    /// Count the entries that contributed rows.
    #[must_use]
    pub fn merged_count(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.status, FileStatus::Merged { .. }))
            .count()
    }
}

/// Result status of a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    /// At least one table was merged and the artifact was replaced.
    Merged,
    /// No `.csv` entry could be parsed; the previous artifact is untouched.
    NoValidTables,
}

/// Command response for one merge run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// Whether an artifact was written.
    pub status: MergeStatus,
    /// Blob key of the artifact that downloads are served from.
    pub artifact_key: String,
    /// Per-file results.
    pub report: MergeReport,
}

/// Driving port for the upload-and-merge use case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MergeCommand: Send + Sync {
    /// Ingest, extract and merge one archive.
    async fn merge(&self, upload: ArchiveUpload) -> Result<MergeOutcome, Error>;
}

/// Fixture command that reports an empty successful merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureMergeCommand;

#[async_trait]
impl MergeCommand for FixtureMergeCommand {
    async fn merge(&self, _upload: ArchiveUpload) -> Result<MergeOutcome, Error> {
        Ok(MergeOutcome {
            status: MergeStatus::Merged,
            artifact_key: super::MERGED_ARTIFACT_KEY.to_owned(),
            report: MergeReport::default(),
        })
    }
}
