//! Download handler for the merged artifact.
//!
//! ```text
//! GET /download   merged.csv as an attachment, or 404 `file not found`
//! ```

use actix_web::http::header::{
    CONTENT_TYPE, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{HttpResponse, get, web};
use tracing::debug;

use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Stream the artifact of the most recent successful merge.
#[utoipa::path(
    get,
    path = "/download",
    responses(
        (status = 200, description = "Merged CSV (UTF-8 with BOM)", body = String, content_type = "text/csv"),
        (status = 404, description = "No merge has succeeded yet", body = String, content_type = "text/plain"),
        (status = 500, description = "Storage failure", body = String, content_type = "text/plain")
    ),
    tags = ["merge"],
    operation_id = "downloadMerged"
)]
#[get("/download")]
pub async fn download(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let artifact = state.artifacts.fetch_artifact().await?;
    debug!(
        file_name = %artifact.file_name,
        bytes = artifact.contents.len(),
        "serving merged artifact"
    );
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(artifact.file_name)],
    };
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, CSV_CONTENT_TYPE))
        .insert_header(disposition)
        .body(artifact.contents))
}
