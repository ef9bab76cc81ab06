//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the upload, download and health endpoints together
//! with the JSON bodies they exchange. The document backs Swagger UI in debug
//! builds and is printed by `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::inbound::http::upload::{
    FileReportBody, MergeResponseBody, RemoteArchiveBody, UploadFormBody,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CSV merge API",
        description = "Upload a ZIP archive of CSV files and download the merged table."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::upload::upload_form,
        crate::inbound::http::upload::upload,
        crate::inbound::http::download::download,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(RemoteArchiveBody, UploadFormBody, MergeResponseBody, FileReportBody)),
    tags(
        (name = "merge", description = "Archive upload and merged CSV download"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
