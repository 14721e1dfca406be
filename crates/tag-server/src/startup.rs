//! Actix server startup + app wiring.
//!
//! Builds the shared state, routes, middleware, and OpenAPI endpoints.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::config;
use crate::openapi;
use crate::state::AppState;

const DEFAULT_BIND: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    8080,
);

/// Build server state and start the Actix HTTP server.
pub(crate) async fn run(args: crate::Args) -> Result<()> {
    let cfg = load_config(args.config.as_ref())?;
    let bind = resolve_bind(args.bind, &cfg)?;
    let media_dir = resolve_media_dir(args.media_dir, &cfg)?;
    let db_path = config::metadata_db_path_from_config(&cfg)
        .unwrap_or_else(|| tag_service::metadata_db::db_path_for(&media_dir));
    let read_only_formats = config::read_only_formats_from_config(&cfg);
    tracing::info!(
        bind = %bind,
        media_dir = %media_dir.display(),
        metadata_db = %db_path.display(),
        read_only_formats = ?read_only_formats,
        version = crate::VERSION,
        "starting tag-server"
    );

    let state = web::Data::new(AppState::open(&media_dir, &db_path, &read_only_formats)?);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default().exclude("/health"))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .service(api::tags_edit)
            .service(api::file_get)
            .service(api::file_register)
            .service(api::file_unregister)
            .service(api::health)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}

/// Load server config from disk, the executable's directory, or defaults.
fn load_config(path: Option<&PathBuf>) -> Result<config::ServerConfig> {
    match path {
        Some(path) => config::ServerConfig::load(path),
        None => config::ServerConfig::load_beside_exe(),
    }
}

/// Resolve the final bind address from args + config.
fn resolve_bind(bind: Option<SocketAddr>, cfg: &config::ServerConfig) -> Result<SocketAddr> {
    Ok(match bind {
        Some(addr) => addr,
        None => config::bind_from_config(cfg)?.unwrap_or(DEFAULT_BIND),
    })
}

/// Resolve the media directory from args + config.
fn resolve_media_dir(dir: Option<PathBuf>, cfg: &config::ServerConfig) -> Result<PathBuf> {
    Ok(match dir {
        Some(dir) => dir,
        None => config::media_dir_from_config(cfg)?,
    })
}
