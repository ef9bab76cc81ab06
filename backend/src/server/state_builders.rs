//! Builders wiring the outbound adapters into the HTTP state.

use std::io;
use std::sync::Arc;

use tracing::info;

use csvmerge::domain::{FilenameDecoder, MergeConfig, MergeService};
use csvmerge::inbound::http::state::{HttpState, HttpStatePorts};
use csvmerge::outbound::archive_download::HttpArchiveSource;
use csvmerge::outbound::blob_store::CapStdBlobStore;
use csvmerge::outbound::zip_archive::ZipArchiveReader;

use super::MergeSettings;

/// Open the storage root and build the merge service behind both driving ports.
///
/// # Errors
/// Returns [`io::Error`] when the storage root cannot be opened, the HTTP
/// client cannot be built, or a setting is invalid.
pub(super) fn build_http_state(settings: &MergeSettings) -> io::Result<HttpState> {
    let store = CapStdBlobStore::open(settings.storage_root())?;
    info!(storage_root = %store.root_path(), "storage root opened");

    let source = HttpArchiveSource::new(
        settings.fetch_timeout(),
        u64::try_from(settings.max_upload_bytes).unwrap_or(u64::MAX),
    )
    .map_err(|err| io::Error::other(format!("failed to build HTTP client: {err}")))?;

    let filename_decoder =
        FilenameDecoder::new(&settings.legacy_filename_encoding).map_err(io::Error::other)?;
    let config = MergeConfig {
        filename_decoder,
        label_column: settings.label_column.clone(),
    };

    let service = Arc::new(MergeService::new(
        Arc::new(source),
        Arc::new(ZipArchiveReader::new().with_max_extracted_bytes(settings.max_extracted_bytes)),
        Arc::new(store),
        config,
    ));
    let public_base_url = settings.public_base_url().map_err(io::Error::other)?;

    Ok(HttpState::new(HttpStatePorts {
        merge: service.clone(),
        artifacts: service,
    })
    .with_public_base_url(public_base_url)
    .with_max_upload_bytes(settings.max_upload_bytes))
}
