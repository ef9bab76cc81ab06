//! Filesystem blob store adapter.
//!
//! Blobs live below a single storage root opened as a capability-scoped
//! `cap-std` directory, so keys can never address files outside it.

mod atomic_io;
mod cap_std_store;

pub use cap_std_store::CapStdBlobStore;
