//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use url::Url;

use crate::domain::ports::{
    ArtifactQuery, FixtureArtifactQuery, FixtureMergeCommand, MergeCommand,
};

/// Default cap on direct upload bodies: 256 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Parameter object bundling the port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub merge: Arc<dyn MergeCommand>,
    pub artifacts: Arc<dyn ArtifactQuery>,
}

impl Default for HttpStatePorts {
    fn default() -> Self {
        Self {
            merge: Arc::new(FixtureMergeCommand),
            artifacts: Arc::new(FixtureArtifactQuery),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub merge: Arc<dyn MergeCommand>,
    pub artifacts: Arc<dyn ArtifactQuery>,
    /// Base used for absolute download links; derived from the request when unset.
    pub public_base_url: Option<Url>,
    /// Largest accepted upload body.
    pub max_upload_bytes: usize,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from ports with default upload limits.
    ///
    /// # Examples
    /// ```
    /// use csvmerge::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts::default());
    /// assert!(state.public_base_url.is_none());
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        Self {
            merge: ports.merge,
            artifacts: ports.artifacts,
            public_base_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Use `base` when building download links.
    #[must_use]
    pub fn with_public_base_url(mut self, base: Option<Url>) -> Self {
        self.public_base_url = base;
        self
    }

    /// Override the upload size limit.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}
