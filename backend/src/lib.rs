//! Merge every CSV file inside a ZIP archive into one downloadable table.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the merge pipeline
//! and its ports, [`inbound`] exposes it over HTTP, and [`outbound`] adapts
//! the ports to HTTP downloads, ZIP containers and the filesystem.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
