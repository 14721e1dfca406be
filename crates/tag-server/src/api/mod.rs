//! HTTP API handlers.
//!
//! Defines the Actix routes for tag edits, file lookup and health.

pub mod files;
pub mod health;
pub mod tags;

pub use files::{file_get, file_register, file_unregister};
pub use health::*;
pub use tags::tags_edit;

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use tag_service::{MediaFileRecord, MediaKind, TagEditRequest};

    use crate::api;
    use crate::models::RegisterFileRequest;
    use crate::state::AppState;

    fn make_state() -> (tempfile::TempDir, web::Data<AppState>) {
        let dir = tempfile::tempdir().expect("temp dir");
        let media_dir = dir.path().join("music");
        std::fs::create_dir_all(&media_dir).expect("create media dir");
        let db_path = tag_service::metadata_db::db_path_for(dir.path());
        let state = AppState::open(&media_dir, &db_path, &[]).expect("app state");
        (dir, web::Data::new(state))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .service(api::tags_edit)
                    .service(api::file_get)
                    .service(api::file_register)
                    .service(api::file_unregister)
                    .service(api::health),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let (_dir, state) = make_state();
        let app = app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: api::HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, "ok");
    }

    #[actix_web::test]
    async fn file_get_missing_returns_404() {
        let (_dir, state) = make_state();
        let app = app!(state);

        let req = test::TestRequest::get().uri("/files/42").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn register_then_get_round_trip() {
        let (_dir, state) = make_state();
        let path = state.library.root().join("notes.txt");
        std::fs::write(&path, b"hello").expect("write file");
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/files")
            .set_json(&RegisterFileRequest {
                path: "notes.txt".to_string(),
            })
            .to_request();
        let registered: MediaFileRecord = test::call_and_read_body_json(&app, req).await;
        assert_eq!(registered.kind, MediaKind::File);
        assert_eq!(registered.format.as_deref(), Some("TXT"));

        let req = test::TestRequest::get()
            .uri(&format!("/files/{}", registered.id))
            .to_request();
        let fetched: MediaFileRecord = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, registered);
    }

    #[actix_web::test]
    async fn register_outside_root_is_bad_request() {
        let (dir, state) = make_state();
        let outside = dir.path().join("outside.txt");
        std::fs::write(&outside, b"hello").expect("write file");
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/files")
            .set_json(&RegisterFileRequest {
                path: outside.to_string_lossy().to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unregister_removes_entry() {
        let (_dir, state) = make_state();
        std::fs::write(state.library.root().join("notes.txt"), b"hello").expect("write file");
        let record = state
            .library
            .register_file(std::path::Path::new("notes.txt"))
            .expect("register");
        let app = app!(state);

        let req = test::TestRequest::delete()
            .uri(&format!("/files/{}", record.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri(&format!("/files/{}", record.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn tags_edit_unknown_id_reports_not_found_message() {
        let (_dir, state) = make_state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/tags/edit")
            .set_json(&TagEditRequest {
                id: 42,
                genre: Some("Rock".to_string()),
                ..TagEditRequest::default()
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "media file 42 not found");
    }

    #[actix_web::test]
    async fn tags_edit_unsupported_format_reports_extension() {
        let (_dir, state) = make_state();
        std::fs::write(state.library.root().join("notes.txt"), b"hello").expect("write file");
        let record = state
            .library
            .register_file(std::path::Path::new("notes.txt"))
            .expect("register");
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/tags/edit")
            .set_json(&TagEditRequest {
                id: record.id,
                title: Some("Notes".to_string()),
                ..TagEditRequest::default()
            })
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "Tag editing of txt files is not supported.");
        assert_eq!(
            std::fs::read(state.library.root().join("notes.txt")).expect("read file"),
            b"hello"
        );
    }
}
