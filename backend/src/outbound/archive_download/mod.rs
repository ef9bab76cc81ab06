//! Archive download outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `ArchiveSource`
//! port.

mod http_source;

pub use http_source::HttpArchiveSource;
