//! Tag edit handler.

use actix_web::{post, web, HttpResponse, Responder};
use tag_service::TagEditRequest;

use crate::state::AppState;

/// Apply a tag edit to one media file.
///
/// The body is the outcome as plain text: `UPDATED`, `SKIPPED`, or a
/// human-readable failure message.
#[utoipa::path(
    post,
    path = "/tags/edit",
    request_body = TagEditRequest,
    responses(
        (status = 200, description = "Edit outcome", body = String, content_type = "text/plain"),
        (status = 500, description = "Edit could not be scheduled")
    )
)]
#[post("/tags/edit")]
pub async fn tags_edit(
    state: web::Data<AppState>,
    body: web::Json<TagEditRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let id = request.id;
    let service = state.tags.clone();
    match web::block(move || service.set_tags(&request)).await {
        Ok(outcome) => {
            tracing::debug!(id, outcome = %outcome, "tag edit finished");
            HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(outcome.to_string())
        }
        Err(err) => {
            tracing::error!(id, error = %err, "tag edit task failed");
            HttpResponse::InternalServerError().body(err.to_string())
        }
    }
}
