//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::MergeSettings;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use csvmerge::Trace;
#[cfg(debug_assertions)]
use csvmerge::doc::ApiDoc;
use csvmerge::inbound::http::download::download;
use csvmerge::inbound::http::health::{HealthState, live, ready};
use csvmerge::inbound::http::state::HttpState;
use csvmerge::inbound::http::upload::{upload, upload_form};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(upload_form)
        .service(upload)
        .service(download)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server from the loaded settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when a setting is invalid, the storage root
/// cannot be opened, or binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    settings: &MergeSettings,
) -> std::io::Result<Server> {
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let http_state = web::Data::new(build_http_state(settings)?);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
