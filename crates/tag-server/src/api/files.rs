//! Media file lookup and registration handlers.

use std::path::PathBuf;

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use tag_service::{MediaFileRecord, MediaIndex};

use crate::models::RegisterFileRequest;
use crate::state::AppState;

/// Fetch one indexed entry.
#[utoipa::path(
    get,
    path = "/files/{id}",
    params(("id" = i64, Path, description = "Media file id")),
    responses(
        (status = 200, description = "Indexed entry", body = MediaFileRecord),
        (status = 404, description = "Unknown id")
    )
)]
#[get("/files/{id}")]
pub async fn file_get(state: web::Data<AppState>, id: web::Path<i64>) -> impl Responder {
    let id = id.into_inner();
    match state.library.media_file(id) {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(err) => HttpResponse::InternalServerError().body(format!("{:#}", err)),
    }
}

/// Index a single file below the library root.
#[utoipa::path(
    post,
    path = "/files",
    request_body = RegisterFileRequest,
    responses(
        (status = 200, description = "Registered entry", body = MediaFileRecord),
        (status = 400, description = "Missing file or path outside the library root")
    )
)]
#[post("/files")]
pub async fn file_register(
    state: web::Data<AppState>,
    body: web::Json<RegisterFileRequest>,
) -> impl Responder {
    let path = PathBuf::from(body.into_inner().path);
    let library = state.library.clone();
    match web::block(move || library.register_file(&path)).await {
        Ok(Ok(record)) => HttpResponse::Ok().json(record),
        Ok(Err(err)) => {
            tracing::warn!(error = %format!("{:#}", err), "file registration failed");
            HttpResponse::BadRequest().body(format!("{:#}", err))
        }
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Drop a file from the index. The file on disk is left alone.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(("id" = i64, Path, description = "Media file id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Unknown id")
    )
)]
#[delete("/files/{id}")]
pub async fn file_unregister(state: web::Data<AppState>, id: web::Path<i64>) -> impl Responder {
    let id = id.into_inner();
    let library = state.library.clone();
    match web::block(move || library.unregister(id)).await {
        Ok(Ok(true)) => HttpResponse::NoContent().finish(),
        Ok(Ok(false)) => HttpResponse::NotFound().finish(),
        Ok(Err(err)) => HttpResponse::InternalServerError().body(format!("{:#}", err)),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}
