use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::assets::dtos::{
    AssetContent, AssetMetadata, AssetResponseDto, FilterOptionsDto, QuickSearchQuery,
    QuickSearchResponseDto, StorageStatsDto, UpdateAssetDto, Upload, UploadAssetDto,
};
use crate::features::assets::query::SearchParams;
use crate::features::assets::services::AssetService;
use crate::features::auth::model::{Actor, MaybeActor};
use crate::modules::storage::sanitize_filename;
use crate::shared::types::{ApiResponse, PaginationQuery};

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {} field: {}", name, e)))
}

/// Upload an asset
///
/// Accepts multipart/form-data with:
/// - `file`: The file to upload (required)
/// - `name`, `description`, `category`, `file_type`: optional metadata
/// - `tags`: comma-separated, may be repeated
#[utoipa::path(
    post,
    path = "/api/assets",
    tag = "assets",
    request_body(
        content = UploadAssetDto,
        content_type = "multipart/form-data",
        description = "File plus optional metadata",
    ),
    responses(
        (status = 201, description = "Asset created", body = ApiResponse<AssetResponseDto>),
        (status = 400, description = "Missing file or invalid metadata"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_asset(
    MaybeActor(actor): MaybeActor,
    State(service): State<Arc<AssetService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AssetResponseDto>>)> {
    let mut upload: Option<Upload> = None;
    let mut metadata = AssetMetadata::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field.content_type().map(|s| s.to_string());
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                upload = Some(Upload {
                    bytes: data.to_vec(),
                    filename,
                    content_type,
                });
            }
            "name" => metadata.name = Some(read_text(field, "name").await?),
            "description" => metadata.description = Some(read_text(field, "description").await?),
            "category" => metadata.category = Some(read_text(field, "category").await?),
            "file_type" => metadata.file_type = Some(read_text(field, "file_type").await?),
            "tags" => metadata.tags.push(read_text(field, "tags").await?),
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    let asset = service.create(actor, upload, metadata).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(asset),
            Some("Asset uploaded".to_string()),
            None,
        )),
    ))
}

/// List live assets, newest first
#[utoipa::path(
    get,
    path = "/api/assets",
    tag = "assets",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of assets", body = ApiResponse<Vec<AssetResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_assets(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AssetResponseDto>>>> {
    let page = service.list(&actor, &page).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(Some(page.items), None, Some(meta))))
}

/// Search assets
///
/// All filters are optional and combine with AND. Blank or malformed values
/// impose no constraint.
#[utoipa::path(
    get,
    path = "/api/assets/search",
    tag = "assets",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching assets, newest first", body = ApiResponse<Vec<AssetResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn search_assets(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<AssetResponseDto>>>> {
    let page = service.search(&actor, &params).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(Some(page.items), None, Some(meta))))
}

/// Quick search for autocomplete (minimum 2 characters, at most 10 results)
#[utoipa::path(
    get,
    path = "/api/assets/quick-search",
    tag = "assets",
    params(QuickSearchQuery),
    responses(
        (status = 200, description = "Matching assets", body = ApiResponse<QuickSearchResponseDto>),
        (status = 400, description = "Query shorter than 2 characters"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn quick_search(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Query(query): Query<QuickSearchQuery>,
) -> Result<Json<ApiResponse<QuickSearchResponseDto>>> {
    let q = query.q.unwrap_or_default();
    let response = service.quick_search(&actor, &q).await?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Facets for the search UI
#[utoipa::path(
    get,
    path = "/api/assets/filter-options",
    tag = "assets",
    responses(
        (status = 200, description = "Available filter values", body = ApiResponse<FilterOptionsDto>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn filter_options(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
) -> Result<Json<ApiResponse<FilterOptionsDto>>> {
    let options = service.filter_options(&actor).await?;
    Ok(Json(ApiResponse::success(Some(options), None, None)))
}

/// Storage usage over live assets
#[utoipa::path(
    get,
    path = "/api/assets/storage-stats",
    tag = "assets",
    responses(
        (status = 200, description = "Storage usage", body = ApiResponse<StorageStatsDto>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn storage_stats(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
) -> Result<Json<ApiResponse<StorageStatsDto>>> {
    let stats = service.storage_stats(&actor).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Get asset by id
///
/// Deleted assets remain visible to their uploader and to admins.
#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    tag = "assets",
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset found", body = ApiResponse<AssetResponseDto>),
        (status = 403, description = "Not allowed to read this asset"),
        (status = 404, description = "Asset not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_asset(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssetResponseDto>>> {
    let asset = service.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(Some(asset), None, None)))
}

/// Update asset metadata
#[utoipa::path(
    patch,
    path = "/api/assets/{id}",
    tag = "assets",
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    request_body = UpdateAssetDto,
    responses(
        (status = 200, description = "Asset updated", body = ApiResponse<AssetResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not allowed to update this asset"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Asset has been deleted")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_asset(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAssetDto>,
) -> Result<Json<ApiResponse<AssetResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let asset = service.update(&actor, id, dto.into()).await?;
    Ok(Json(ApiResponse::success(
        Some(asset),
        Some("Asset updated".to_string()),
        None,
    )))
}

/// Soft-delete an asset
#[utoipa::path(
    delete,
    path = "/api/assets/{id}",
    tag = "assets",
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset deleted"),
        (status = 403, description = "Not allowed to delete this asset"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Asset already deleted")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_asset(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.soft_delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Asset deleted".to_string()),
        None,
    )))
}

fn content_response(content: AssetContent) -> Response {
    let disposition = format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        content.disposition.as_str(),
        sanitize_filename(&content.filename),
        urlencoding::encode(&content.filename)
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content.content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, content.length.to_string()),
        ],
        content.bytes,
    )
        .into_response()
}

/// Download asset content as an attachment
#[utoipa::path(
    get,
    path = "/api/assets/{id}/download",
    tag = "assets",
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 403, description = "Not allowed to download this asset"),
        (status = 404, description = "Asset or content not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_asset(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let content = service.download(&actor, id).await?;
    Ok(content_response(content))
}

/// Serve asset content inline for previews
#[utoipa::path(
    get,
    path = "/api/assets/{id}/preview",
    tag = "assets",
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 403, description = "Not allowed to view this asset"),
        (status = 404, description = "Asset or content not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn preview_asset(
    actor: Actor,
    State(service): State<Arc<AssetService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let content = service.preview(&actor, id).await?;
    Ok(content_response(content))
}
