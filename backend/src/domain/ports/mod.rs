//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`MergeCommand`, `ArtifactQuery`) are called by inbound
//! adapters. Driven ports (`ArchiveSource`, `ArchiveReader`, `BlobStore`) are
//! implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod archive_reader;
mod archive_source;
mod artifact_query;
mod blob_store;
mod merge_command;

#[cfg(test)]
pub use archive_reader::MockArchiveReader;
pub use archive_reader::{ArchiveEntry, ArchiveReader, ArchiveReaderError, FixtureArchiveReader};
#[cfg(test)]
pub use archive_source::MockArchiveSource;
pub use archive_source::{ArchiveSource, ArchiveSourceError, FixtureArchiveSource};
#[cfg(test)]
pub use artifact_query::MockArtifactQuery;
pub use artifact_query::{ArtifactQuery, FixtureArtifactQuery, MergeArtifact};
#[cfg(test)]
pub use blob_store::MockBlobStore;
pub use blob_store::{
    BlobKey, BlobKeyError, BlobStore, BlobStoreError, EXTRACTED_PREFIX, InMemoryBlobStore,
    MERGED_ARTIFACT_KEY, UPLOADED_ARCHIVE_KEY,
};
#[cfg(test)]
pub use merge_command::MockMergeCommand;
pub use merge_command::{
    ArchiveUpload, FileReport, FileStatus, FixtureMergeCommand, MergeCommand, MergeOutcome,
    MergeReport, MergeStatus,
};
