use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::features::assets::handlers;
use crate::features::assets::services::AssetService;

/// Create routes for the assets feature
///
/// `max_upload_bytes` caps the multipart body of uploads.
pub fn routes(service: Arc<AssetService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/assets",
            get(handlers::list_assets)
                .post(handlers::upload_asset)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/assets/search", get(handlers::search_assets))
        .route("/api/assets/quick-search", get(handlers::quick_search))
        .route("/api/assets/filter-options", get(handlers::filter_options))
        .route("/api/assets/storage-stats", get(handlers::storage_stats))
        .route(
            "/api/assets/{id}",
            get(handlers::get_asset)
                .patch(handlers::update_asset)
                .delete(handlers::delete_asset),
        )
        .route("/api/assets/{id}/download", get(handlers::download_asset))
        .route("/api/assets/{id}/preview", get(handlers::preview_asset))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CatalogConfig;
    use crate::features::assets::dtos::{AssetResponseDto, QuickSearchResponseDto};
    use crate::features::assets::repository::InMemoryCatalog;
    use crate::features::auth::model::Actor;
    use crate::features::users::models::Role;
    use crate::features::users::repository::InMemoryUserRepository;
    use crate::modules::storage::InMemoryContentStore;
    use crate::shared::test_helpers::{actor_with_role, with_actor};
    use crate::shared::types::ApiResponse;
    use axum::http::{header, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::json;

    fn service() -> Arc<AssetService> {
        let config = CatalogConfig::default();
        let catalog = Arc::new(InMemoryCatalog::new(config.tag_storage));
        Arc::new(AssetService::new(
            catalog.clone(),
            catalog,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryContentStore::new()),
            &config,
        ))
    }

    fn server_for(service: Arc<AssetService>, actor: Option<Actor>) -> TestServer {
        let router = routes(service, 1024 * 1024);
        let router = match actor {
            Some(actor) => with_actor(router, actor),
            None => router,
        };
        TestServer::new(router).unwrap()
    }

    fn text_upload(name: &str, body: &str) -> MultipartForm {
        MultipartForm::new()
            .add_text("tags", "draft, notes")
            .add_part(
                "file",
                Part::bytes(body.as_bytes().to_vec())
                    .file_name(name)
                    .mime_type("text/plain"),
            )
    }

    #[tokio::test]
    async fn test_upload_then_fetch_and_download() {
        let server = server_for(service(), Some(actor_with_role(Role::User)));

        let response = server
            .post("/api/assets")
            .multipart(text_upload("notes.txt", "hello world"))
            .await;
        response.assert_status(StatusCode::CREATED);

        let created = response
            .json::<ApiResponse<AssetResponseDto>>()
            .data
            .unwrap();
        assert_eq!(created.file_size, 11);
        assert_eq!(created.tags, vec!["draft", "notes"]);

        let fetched = server.get(&format!("/api/assets/{}", created.id)).await;
        fetched.assert_status_ok();

        let download = server.get(&created.download_url).await;
        download.assert_status_ok();
        assert_eq!(download.as_bytes().as_ref(), b"hello world");
        let disposition = download.header(header::CONTENT_DISPOSITION);
        assert!(disposition.to_str().unwrap().starts_with("attachment;"));

        let preview = server
            .get(&format!("/api/assets/{}/preview", created.id))
            .await;
        let disposition = preview.header(header::CONTENT_DISPOSITION);
        assert!(disposition.to_str().unwrap().starts_with("inline;"));
    }

    #[tokio::test]
    async fn test_requests_without_identity_are_unauthorized() {
        let server = server_for(service(), None);

        server
            .get("/api/assets/search")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/assets")
            .multipart(text_upload("a.txt", "x"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_quick_search_short_query_is_bad_request() {
        let server = server_for(service(), Some(actor_with_role(Role::Viewer)));

        server
            .get("/api/assets/quick-search")
            .add_query_param("q", "a")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let ok = server
            .get("/api/assets/quick-search")
            .add_query_param("q", "ab")
            .await;
        ok.assert_status_ok();
        let body = ok.json::<ApiResponse<QuickSearchResponseDto>>().data.unwrap();
        assert_eq!(body.count, 0);
        assert_eq!(body.query, "ab");
    }

    #[tokio::test]
    async fn test_viewer_patch_is_forbidden_and_delete_then_conflict() {
        let service = service();
        let owner = actor_with_role(Role::User);
        let owner_server = server_for(service.clone(), Some(owner));
        let viewer_server = server_for(service, Some(actor_with_role(Role::Viewer)));

        let created = owner_server
            .post("/api/assets")
            .multipart(text_upload("plan.txt", "v1"))
            .await
            .json::<ApiResponse<AssetResponseDto>>()
            .data
            .unwrap();
        let path = format!("/api/assets/{}", created.id);

        viewer_server
            .patch(&path)
            .json(&json!({ "name": "hijacked" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        owner_server
            .patch(&path)
            .json(&json!({ "name": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        owner_server.delete(&path).await.assert_status_ok();
        owner_server
            .delete(&path)
            .await
            .assert_status(StatusCode::CONFLICT);

        let search = owner_server
            .get("/api/assets/search")
            .await
            .json::<ApiResponse<Vec<AssetResponseDto>>>();
        assert_eq!(search.meta.map(|m| m.total), Some(0));
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let server = server_for(service(), Some(actor_with_role(Role::Admin)));
        server
            .get(&format!("/api/assets/{}", uuid::Uuid::now_v7()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
