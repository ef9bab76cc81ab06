//! HTTP inbound adapter exposing the upload, download and probe endpoints.

pub mod download;
pub mod error;
pub mod health;
pub mod state;
pub mod upload;

pub use error::ApiResult;
