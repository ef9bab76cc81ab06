//! `cap-std` directory implementation of the `BlobStore` port.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use super::atomic_io::write_atomic;
use crate::domain::TraceId;
use crate::domain::ports::{BlobKey, BlobStore, BlobStoreError};

/// Blob store rooted at one directory on the local filesystem.
#[derive(Clone)]
pub struct CapStdBlobStore {
    root: Arc<Dir>,
    root_path: Utf8PathBuf,
}

impl CapStdBlobStore {
    /// Open `root`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be created or opened.
    pub fn open(root: impl AsRef<Utf8Path>) -> io::Result<Self> {
        let root = root.as_ref();
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            root: Arc::new(dir),
            root_path: root.to_owned(),
        })
    }

    /// Directory this store writes below.
    #[must_use]
    pub fn root_path(&self) -> &Utf8Path {
        &self.root_path
    }

    async fn run_blocking<T, F>(&self, key: &BlobKey, op: F) -> Result<T, BlobStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        let key_label = key.to_string();
        tokio::task::spawn_blocking(TraceId::in_blocking_scope(move || op(&root)))
            .await
            .map_err(|err| BlobStoreError::unavailable(format!("blocking task failed: {err}")))?
            .map_err(|err| BlobStoreError::io(key_label, err.to_string()))
    }
}

fn put_blocking(root: &Dir, key: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let file_name = key.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("{key} has no file name"))
    })?;
    match key.parent().filter(|parent| !parent.as_str().is_empty()) {
        Some(parent) => {
            root.create_dir_all(parent)?;
            let parent_dir = root.open_dir(parent)?;
            write_atomic(&parent_dir, file_name, contents)
        }
        None => write_atomic(root, file_name, contents),
    }
}

fn get_blocking(root: &Dir, key: &Utf8Path) -> io::Result<Option<Vec<u8>>> {
    match root.read(key) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn remove_blocking(root: &Dir, prefix: &Utf8Path) -> io::Result<()> {
    let metadata = match root.symlink_metadata(prefix) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    if metadata.is_dir() {
        root.remove_dir_all(prefix)
    } else {
        root.remove_file(prefix)
    }
}

#[async_trait]
impl BlobStore for CapStdBlobStore {
    async fn put(&self, key: &BlobKey, contents: Vec<u8>) -> Result<(), BlobStoreError> {
        let path = Utf8PathBuf::from(key.as_str());
        let bytes = contents.len();
        self.run_blocking(key, move |root| put_blocking(root, &path, &contents))
            .await?;
        debug!(key = %key, bytes, "stored blob");
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<Option<Vec<u8>>, BlobStoreError> {
        let path = Utf8PathBuf::from(key.as_str());
        self.run_blocking(key, move |root| get_blocking(root, &path))
            .await
    }

    async fn remove_prefix(&self, prefix: &BlobKey) -> Result<(), BlobStoreError> {
        let path = Utf8PathBuf::from(prefix.as_str());
        self.run_blocking(prefix, move |root| remove_blocking(root, &path))
            .await?;
        debug!(prefix = %prefix, "removed blobs");
        Ok(())
    }
}
