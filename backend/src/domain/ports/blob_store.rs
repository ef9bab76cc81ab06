//! Driven port for the key-value blob store holding uploads and artifacts.
//!
//! Keys are logical, `/`-separated relative paths. The store layout is:
//!
//! ```text
//! uploaded.zip         most recent archive
//! extracted/<path>     entries of the most recent archive
//! merged.csv           most recent merge artifact
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::define_port_error;

/// Key holding the most recently uploaded archive.
pub const UPLOADED_ARCHIVE_KEY: &str = "uploaded.zip";
/// Namespace holding the extracted archive entries.
pub const EXTRACTED_PREFIX: &str = "extracted";
/// Key holding the merge artifact.
pub const MERGED_ARTIFACT_KEY: &str = "merged.csv";

/// Validation failures for [`BlobKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobKeyError {
    /// The key has no segments.
    #[error("blob key must not be empty")]
    Empty,
    /// A segment is empty, `.`, `..`, or contains a backslash.
    #[error("blob key segment {segment:?} is not allowed")]
    InvalidSegment {
        /// Offending segment.
        segment: String,
    },
}

/// Validated relative key into the blob store.
///
/// ## Invariants
/// - At least one segment.
/// - Segments are separated by `/` and are never empty, `.` or `..`.
///
/// # Examples
/// ```
/// use csvmerge::domain::ports::BlobKey;
///
/// let key = BlobKey::new("extracted").and_then(|base| base.join("q1/jan.csv"));
/// assert_eq!(key.map(|k| k.to_string()).as_deref(), Ok("extracted/q1/jan.csv"));
/// assert!(BlobKey::new("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobKey(String);

impl BlobKey {
    /// Validate and build a key.
    pub fn new(raw: impl Into<String>) -> Result<Self, BlobKeyError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(BlobKeyError::Empty);
        }
        if let Some(segment) = raw.split('/').find(|segment| !is_valid_segment(segment)) {
            return Err(BlobKeyError::InvalidSegment {
                segment: segment.to_owned(),
            });
        }
        Ok(Self(raw))
    }

    /// Append a relative path below this key.
    pub fn join(&self, relative: &str) -> Result<Self, BlobKeyError> {
        Self::new(format!("{}/{relative}", self.0))
    }

    /// Borrow the key as a `/`-separated string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Iterate over the key segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Whether this key equals `prefix` or lives below it.
    #[must_use]
    pub fn is_within(&self, prefix: &BlobKey) -> bool {
        self.0 == prefix.0
            || self
                .0
                .strip_prefix(prefix.0.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

define_port_error! {
    /// Errors raised by blob store adapters.
    pub enum BlobStoreError {
        /// Reading or writing the backing medium failed.
        Io { key: String, message: String } =>
            "blob store I/O failed for {key}: {message}",
        /// The store is unusable, for example after a panicked writer.
        Unavailable { message: String } =>
            "blob store unavailable: {message}",
    }
}

/// Port for storing named byte blobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `contents` under `key`, replacing any previous value.
    ///
    /// Readers observe either the old or the new value, never a partial one.
    async fn put(&self, key: &BlobKey, contents: Vec<u8>) -> Result<(), BlobStoreError>;

    /// Read the blob stored under `key`, or `None` when absent.
    async fn get(&self, key: &BlobKey) -> Result<Option<Vec<u8>>, BlobStoreError>;

    /// Remove `prefix` and every key stored below it.
    ///
    /// Removing an absent prefix succeeds.
    async fn remove_prefix(&self, prefix: &BlobKey) -> Result<(), BlobStoreError>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<BTreeMap<BlobKey, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the stored keys in lexical order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|blobs| blobs.keys().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    fn with_blobs<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<BlobKey, Vec<u8>>) -> T,
    ) -> Result<T, BlobStoreError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| BlobStoreError::unavailable("in-memory store lock poisoned"))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &BlobKey, contents: Vec<u8>) -> Result<(), BlobStoreError> {
        self.with_blobs(|blobs| {
            blobs.insert(key.clone(), contents);
        })
    }

    async fn get(&self, key: &BlobKey) -> Result<Option<Vec<u8>>, BlobStoreError> {
        self.with_blobs(|blobs| blobs.get(key).cloned())
    }

    async fn remove_prefix(&self, prefix: &BlobKey) -> Result<(), BlobStoreError> {
        self.with_blobs(|blobs| blobs.retain(|key, _| !key.is_within(prefix)))
    }
}

#[cfg(test)]
mod tests {
    //! Key validation and in-memory store behaviour.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("a//b")]
    #[case("../escape")]
    #[case("a/./b")]
    #[case("a\\b")]
    #[case("trailing/")]
    fn rejects_invalid_keys(#[case] raw: &str) {
        assert!(BlobKey::new(raw).is_err(), "{raw:?} should be rejected");
    }

    #[rstest]
    #[case("extracted", "extracted", true)]
    #[case("extracted/a.csv", "extracted", true)]
    #[case("extracted_old/a.csv", "extracted", false)]
    #[case("merged.csv", "extracted", false)]
    fn prefix_matching_respects_segment_boundaries(
        #[case] key: &str,
        #[case] prefix: &str,
        #[case] expected: bool,
    ) {
        let key = BlobKey::new(key).expect("valid key");
        let prefix = BlobKey::new(prefix).expect("valid prefix");
        assert_eq!(key.is_within(&prefix), expected);
    }

    #[tokio::test]
    async fn remove_prefix_keeps_unrelated_keys() {
        let store = InMemoryBlobStore::new();
        for key in ["extracted/a.csv", "extracted/q/b.csv", "merged.csv"] {
            store
                .put(&BlobKey::new(key).expect("key"), b"x".to_vec())
                .await
                .expect("put");
        }

        store
            .remove_prefix(&BlobKey::new(EXTRACTED_PREFIX).expect("prefix"))
            .await
            .expect("remove");

        assert_eq!(store.keys(), vec!["merged.csv".to_owned()]);
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_key() {
        let store = InMemoryBlobStore::new();
        let missing = store
            .get(&BlobKey::new(MERGED_ARTIFACT_KEY).expect("key"))
            .await
            .expect("get");
        assert!(missing.is_none());
    }
}
