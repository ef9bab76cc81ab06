//! Domain primitives and services for merging CSV archives.
//!
//! Purpose: turn an uploaded or downloaded ZIP archive into one labelled CSV
//! artifact. The pipeline is ingest, extract, merge; each stage talks to
//! infrastructure only through the ports in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Table / CellValue: schema-less tabular model.
//! - MergeService: implements the driving ports.

pub mod archive_ingest;
pub mod entry_extractor;
pub mod error;
pub mod filename;
pub mod merge_service;
pub mod ports;
pub mod table;
pub mod table_merger;
pub mod text_encoding;
pub mod trace_id;

pub use self::archive_ingest::{ArchiveIngestor, IngestError};
pub use self::entry_extractor::{EntryExtractor, ExtractError, StoredEntry};
pub use self::error::{Error, ErrorCode};
pub use self::filename::{
    DEFAULT_LEGACY_FILENAME_ENCODING, FilenameDecoder, UnknownEncodingError, label_for_path,
    sanitize_entry_path,
};
pub use self::merge_service::{MergeConfig, MergeService};
pub use self::table::{CellValue, RowWidthError, Table, TableParseError, UTF8_BOM};
pub use self::table_merger::{
    DEFAULT_LABEL_COLUMN, MergeError, ParsedEntry, TableMerger, parse_entry,
};
pub use self::text_encoding::{DecodeError, ENCODING_SAMPLE_BYTES, decode_strict, detect_encoding};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient result alias for driving port implementations.
///
/// # Examples
/// ```
/// use csvmerge::domain::{Error, MergeResult};
///
/// fn lookup() -> MergeResult<Vec<u8>> {
///     Err(Error::not_found("file not found"))
/// }
/// ```
pub type MergeResult<T> = Result<T, Error>;
