//! ZIP container outbound adapter.
//!
//! Implements the `ArchiveReader` port with the `zip` crate. Entry names are
//! passed through as stored bytes; repair happens in the domain.

mod reader;

pub use reader::{DEFAULT_MAX_EXTRACTED_BYTES, ZipArchiveReader};
