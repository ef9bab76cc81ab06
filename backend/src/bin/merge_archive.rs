//! Merge a local ZIP archive into a storage root without the HTTP server.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use csvmerge::domain::ports::{ArchiveUpload, FileStatus, MergeCommand, MergeStatus};
use csvmerge::domain::{
    DEFAULT_LABEL_COLUMN, DEFAULT_LEGACY_FILENAME_ENCODING, FilenameDecoder, MergeConfig,
    MergeService,
};
use csvmerge::outbound::archive_download::HttpArchiveSource;
use csvmerge::outbound::blob_store::CapStdBlobStore;
use csvmerge::outbound::zip_archive::{DEFAULT_MAX_EXTRACTED_BYTES, ZipArchiveReader};
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt};

/// `merge-archive` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "merge-archive",
    about = "Merge every CSV file in a ZIP archive into <storage-root>/merged.csv",
    version
)]
struct CliArgs {
    /// Path to the ZIP archive, or an http(s) URL to download it from.
    #[arg(value_name = "archive")]
    archive: String,
    /// Directory receiving `uploaded.zip`, `extracted/` and `merged.csv`.
    #[arg(long = "storage-root", value_name = "dir", default_value = "uploads")]
    storage_root: Utf8PathBuf,
    /// Name of the column carrying each row's source file stem.
    #[arg(long = "label-column", value_name = "name", default_value = DEFAULT_LABEL_COLUMN)]
    label_column: String,
    /// Encoding assumed for entry names without the UTF-8 flag.
    #[arg(
        long = "legacy-encoding",
        value_name = "label",
        default_value = DEFAULT_LEGACY_FILENAME_ENCODING
    )]
    legacy_encoding: String,
    /// Timeout for URL downloads, in seconds.
    #[arg(long = "fetch-timeout", value_name = "secs", default_value_t = 30)]
    fetch_timeout_secs: u64,
    /// Largest total decompressed size accepted from the archive, in bytes.
    #[arg(
        long = "max-extracted-bytes",
        value_name = "bytes",
        default_value_t = DEFAULT_MAX_EXTRACTED_BYTES
    )]
    max_extracted_bytes: u64,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init()
    {
        tracing::warn!(%error, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let upload = read_upload(&args.archive)?;

    let store = CapStdBlobStore::open(&args.storage_root)?;
    let source = HttpArchiveSource::new(Duration::from_secs(args.fetch_timeout_secs), u64::MAX)
        .map_err(|error| io::Error::other(format!("build HTTP client: {error}")))?;
    let filename_decoder = FilenameDecoder::new(&args.legacy_encoding).map_err(io::Error::other)?;
    let service = MergeService::new(
        Arc::new(source),
        Arc::new(ZipArchiveReader::new().with_max_extracted_bytes(args.max_extracted_bytes)),
        Arc::new(store),
        MergeConfig {
            filename_decoder,
            label_column: args.label_column,
        },
    );

    let outcome = service
        .merge(upload)
        .await
        .map_err(|error| io::Error::other(format!("merge failed: {error}")))?;

    let mut out = io::stdout().lock();
    for file in &outcome.report.files {
        match &file.status {
            FileStatus::Merged { rows, encoding } => {
                writeln!(out, "merged  {} rows={rows} encoding={encoding}", file.path)?;
            }
            FileStatus::Skipped { reason } => {
                writeln!(out, "skipped {} reason={reason}", file.path)?;
            }
        }
    }
    match outcome.status {
        MergeStatus::Merged => writeln!(
            out,
            "artifact={}",
            args.storage_root.join(&outcome.artifact_key)
        )?,
        MergeStatus::NoValidTables => writeln!(out, "no valid CSV files")?,
    }
    Ok(())
}

fn read_upload(archive: &str) -> io::Result<ArchiveUpload> {
    if archive.starts_with("http://") || archive.starts_with("https://") {
        return Ok(ArchiveUpload::RemoteUrl(archive.to_owned()));
    }
    let path = PathBuf::from(archive);
    let bytes = std::fs::read(&path)
        .map_err(|error| io::Error::other(format!("read {}: {error}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(ArchiveUpload::Direct { file_name, bytes })
}
