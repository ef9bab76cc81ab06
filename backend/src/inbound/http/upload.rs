//! Upload HTTP handlers.
//!
//! ```text
//! GET  /         HTML upload form
//! POST /upload   JSON {"file": "<url>"} or multipart field `file`
//! ```

use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, get, post, web};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::{ArchiveUpload, FileReport, FileStatus, MergeOutcome, MergeStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Multipart field carrying the archive.
const FILE_FIELD: &str = "file";
/// Body returned when no entry produced a table.
pub const NO_VALID_TABLES_MESSAGE: &str = "no valid CSV files";
/// Success message in the merge response.
pub const MERGE_COMPLETE_MESSAGE: &str = "CSV merge complete";

const UPLOAD_FORM: &str = r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>CSV merge</title></head>
  <body>
    <h1>Upload a ZIP archive of CSV files</h1>
    <form method="post" action="/upload" enctype="multipart/form-data">
      <input type="file" name="file" accept=".zip">
      <input type="submit" value="Upload">
    </form>
  </body>
</html>
"#;

/// JSON request body naming a remote archive.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RemoteArchiveBody {
    /// Absolute URL of the ZIP archive to download.
    #[schema(format = "uri")]
    pub file: Option<String>,
}

/// Multipart request body carrying the archive itself.
#[derive(ToSchema)]
pub struct UploadFormBody {
    /// ZIP archive contents.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Outcome for one CSV entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileReportBody {
    /// Logical path inside the archive.
    pub path: String,
    /// `merged` or `skipped`.
    pub status: String,
    /// Rows contributed, for merged files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Encoding the file was decoded with, for merged files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Why the file was left out, for skipped files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<FileReport> for FileReportBody {
    fn from(value: FileReport) -> Self {
        match value.status {
            FileStatus::Merged { rows, encoding } => Self {
                path: value.path,
                status: "merged".to_owned(),
                rows: Some(rows),
                encoding: Some(encoding),
                reason: None,
            },
            FileStatus::Skipped { reason } => Self {
                path: value.path,
                status: "skipped".to_owned(),
                rows: None,
                encoding: None,
                reason: Some(reason),
            },
        }
    }
}

/// Response body for a successful merge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MergeResponseBody {
    /// Always `CSV merge complete`.
    pub message: String,
    /// Absolute URL of the merged artifact.
    #[schema(format = "uri")]
    pub download_url: String,
    /// Per-file results in processing order.
    pub files: Vec<FileReportBody>,
}

/// Serve the HTML upload form.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "HTML upload form", content_type = "text/html")),
    tags = ["merge"],
    operation_id = "uploadForm"
)]
#[get("/")]
pub async fn upload_form() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(UPLOAD_FORM)
}

/// Ingest an archive, merge its CSV files and return a download link.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content(
        (RemoteArchiveBody = "application/json"),
        (UploadFormBody = "multipart/form-data")
    )),
    responses(
        (status = 200, description = "Merge complete, or plain text `no valid CSV files`", body = MergeResponseBody),
        (status = 400, description = "Invalid upload or archive", body = String, content_type = "text/plain"),
        (status = 500, description = "Storage failure", body = String, content_type = "text/plain")
    ),
    tags = ["merge"],
    operation_id = "uploadArchive"
)]
#[post("/upload")]
pub async fn upload(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let upload = read_upload(&req, payload, state.max_upload_bytes).await?;
    let outcome = state.merge.merge(upload).await?;
    Ok(merge_response(&req, &state, outcome))
}

fn merge_response(req: &HttpRequest, state: &HttpState, outcome: MergeOutcome) -> HttpResponse {
    match outcome.status {
        MergeStatus::NoValidTables => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(NO_VALID_TABLES_MESSAGE),
        MergeStatus::Merged => {
            let download_url = download_url(req, state.public_base_url.as_ref());
            info!(download_url = %download_url, "merge complete");
            HttpResponse::Ok().json(MergeResponseBody {
                message: MERGE_COMPLETE_MESSAGE.to_owned(),
                download_url,
                files: outcome
                    .report
                    .files
                    .into_iter()
                    .map(FileReportBody::from)
                    .collect(),
            })
        }
    }
}

/// Absolute `/download` link, preferring the configured public base URL.
pub(crate) fn download_url(req: &HttpRequest, public_base_url: Option<&Url>) -> String {
    if let Some(base) = public_base_url {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        if let Ok(joined) = base.join("download") {
            return joined.to_string();
        }
    }
    let info = req.connection_info();
    format!("{}://{}/download", info.scheme(), info.host())
}

async fn read_upload(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<ArchiveUpload, Error> {
    let mime = req
        .mime_type()
        .map_err(|err| Error::invalid_request(format!("invalid content type: {err}")))?;
    let essence = mime.as_ref().map(|mime| mime.essence_str().to_owned());
    match essence.as_deref() {
        Some("application/json") => read_json_upload(payload, limit).await,
        Some("multipart/form-data") => read_multipart_upload(req, payload, limit).await,
        _ => Ok(ArchiveUpload::Missing),
    }
}

async fn read_json_upload(
    mut payload: web::Payload,
    limit: usize,
) -> Result<ArchiveUpload, Error> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|err| Error::invalid_request(format!("failed to read body: {err}")))?;
        append_limited(&mut body, &chunk, limit)?;
    }
    let parsed: RemoteArchiveBody = serde_json::from_slice(&body)
        .map_err(|err| Error::invalid_request(format!("invalid JSON body: {err}")))?;
    Ok(parsed
        .file
        .map_or(ArchiveUpload::Missing, ArchiveUpload::RemoteUrl))
}

async fn read_multipart_upload(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<ArchiveUpload, Error> {
    let mut multipart = Multipart::new(req.headers(), payload);
    while let Some(field) = multipart.next().await {
        let mut field = field
            .map_err(|err| Error::invalid_request(format!("invalid multipart body: {err}")))?;
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_owned);
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|err| Error::invalid_request(format!("failed to read upload: {err}")))?;
            append_limited(&mut bytes, &chunk, limit)?;
        }
        return Ok(ArchiveUpload::Direct { file_name, bytes });
    }
    Ok(ArchiveUpload::Missing)
}

fn append_limited(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), Error> {
    if buffer.len().saturating_add(chunk.len()) > limit {
        return Err(Error::invalid_request(format!(
            "upload exceeds the {limit} byte limit"
        )));
    }
    buffer.extend_from_slice(chunk);
    Ok(())
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
