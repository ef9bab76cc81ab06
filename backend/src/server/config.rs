//! Server settings loaded via OrthoConfig.
//!
//! Values come from `CSV_MERGE_*` environment variables, CLI flags, or a
//! config file; every field has a default so an empty environment starts a
//! working server.

use std::net::SocketAddr;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use csvmerge::domain::{DEFAULT_LABEL_COLUMN, DEFAULT_LEGACY_FILENAME_ENCODING};
use csvmerge::inbound::http::state::DEFAULT_MAX_UPLOAD_BYTES;
use csvmerge::outbound::zip_archive::DEFAULT_MAX_EXTRACTED_BYTES;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STORAGE_ROOT: &str = "uploads";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Failure to interpret a configured value.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// `public_base_url` is not an absolute URL.
    #[error("invalid public base URL {value:?}: {source}")]
    PublicBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Runtime settings for the merge server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CSV_MERGE")]
pub struct MergeSettings {
    /// Address the HTTP listener binds to.
    #[ortho_config(default = DEFAULT_BIND_ADDR.to_owned())]
    pub bind_addr: String,
    /// Directory holding `uploaded.zip`, `extracted/` and `merged.csv`.
    #[ortho_config(default = DEFAULT_STORAGE_ROOT.to_owned())]
    pub storage_root: String,
    /// Timeout for remote archive downloads, in seconds.
    #[ortho_config(default = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,
    /// Largest accepted archive, uploaded or downloaded.
    #[ortho_config(default = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
    /// Largest total size of the entries extracted from one archive.
    #[ortho_config(default = DEFAULT_MAX_EXTRACTED_BYTES)]
    pub max_extracted_bytes: u64,
    /// Encoding assumed for archive entry names without the UTF-8 flag.
    #[ortho_config(default = DEFAULT_LEGACY_FILENAME_ENCODING.to_owned())]
    pub legacy_filename_encoding: String,
    /// Name of the column carrying each row's source file stem.
    #[ortho_config(default = DEFAULT_LABEL_COLUMN.to_owned())]
    pub label_column: String,
    /// Public base for absolute download links.
    pub public_base_url: Option<String>,
}

impl MergeSettings {
    /// Parse the listener address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .parse()
            .map_err(|source| SettingsError::BindAddr {
                value: self.bind_addr.clone(),
                source,
            })
    }

    /// Return the storage directory.
    pub fn storage_root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.storage_root)
    }

    /// Return the remote fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Return the parsed public base URL, if configured.
    pub fn public_base_url(&self) -> Result<Option<Url>, SettingsError> {
        self.public_base_url
            .as_deref()
            .map(|value| {
                Url::parse(value).map_err(|source| SettingsError::PublicBaseUrl {
                    value: value.to_owned(),
                    source,
                })
            })
            .transpose()
    }
}
