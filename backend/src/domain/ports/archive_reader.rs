//! Driven port that unpacks archive bytes into raw entries.
//!
//! Entry names are returned as stored bytes. Name repair is a domain concern
//! because the legacy filename encoding is configurable.

use super::define_port_error;

/// One record stored inside an archive, in archive iteration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name exactly as stored in the archive.
    pub raw_name: Vec<u8>,
    /// Whether the archive declared `raw_name` to be UTF-8.
    pub name_is_utf8: bool,
    /// Whether the record is a directory marker.
    pub is_dir: bool,
    /// Uncompressed content bytes. Empty for directory markers.
    pub contents: Vec<u8>,
}

impl ArchiveEntry {
    /// Build a file entry whose name is declared as UTF-8.
    #[must_use]
    pub fn file(name: &str, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_name: name.as_bytes().to_vec(),
            name_is_utf8: true,
            is_dir: false,
            contents: contents.into(),
        }
    }

    /// Build a file entry whose name uses a legacy, undeclared encoding.
    #[must_use]
    pub fn legacy_file(raw_name: &[u8], contents: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_name: raw_name.to_vec(),
            name_is_utf8: false,
            is_dir: false,
            contents: contents.into(),
        }
    }

    /// Build a directory marker entry.
    #[must_use]
    pub fn directory(name: &str) -> Self {
        Self {
            raw_name: name.as_bytes().to_vec(),
            name_is_utf8: true,
            is_dir: true,
            contents: Vec::new(),
        }
    }
}

define_port_error! {
    /// Errors raised while reading an archive container.
    pub enum ArchiveReaderError {
        /// The bytes are not a readable archive.
        Malformed { message: String } =>
            "archive is not a valid zip file: {message}",
        /// The archive holds encrypted entries that cannot be read.
        Encrypted { name: String } =>
            "archive entry {name} is encrypted",
        /// An entry could not be decompressed.
        Read { name: String, message: String } =>
            "failed to read archive entry {name}: {message}",
    }
}

/// Port for listing archive entries with their contents.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveReader: Send + Sync {
    /// Decode every record of the archive in iteration order.
    fn read_entries(&self, archive: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveReaderError>;
}

/// Fixture reader that ignores its input and returns preset entries.
#[derive(Debug, Clone, Default)]
pub struct FixtureArchiveReader {
    entries: Vec<ArchiveEntry>,
}

impl FixtureArchiveReader {
    /// Build a reader that always yields `entries`.
    #[must_use]
    pub fn new(entries: Vec<ArchiveEntry>) -> Self {
        Self { entries }
    }
}

impl ArchiveReader for FixtureArchiveReader {
    fn read_entries(&self, _archive: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveReaderError> {
        Ok(self.entries.clone())
    }
}
