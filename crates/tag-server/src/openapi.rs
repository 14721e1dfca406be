use utoipa::OpenApi;

use crate::api;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::tags::tags_edit,
        api::files::file_get,
        api::files::file_register,
        api::files::file_unregister,
        api::health::health,
    ),
    components(
        schemas(
            tag_service::TagEditRequest,
            tag_service::MediaFileRecord,
            tag_service::MediaKind,
            models::RegisterFileRequest,
            api::health::HealthResponse,
        )
    ),
    tags(
        (name = "tag-server", description = "Media tag editing API")
    )
)]
pub struct ApiDoc;
