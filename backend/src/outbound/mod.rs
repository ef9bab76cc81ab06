//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **archive_download**: reqwest-backed `ArchiveSource`
//! - **zip_archive**: `zip`-backed `ArchiveReader`
//! - **blob_store**: `cap-std` filesystem `BlobStore`
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod archive_download;
pub mod blob_store;
pub mod zip_archive;
