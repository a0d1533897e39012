use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::Actor;
use crate::features::tags::dtos::{CreateTagDto, TagResponseDto};
use crate::features::tags::services::TagService;
use crate::shared::types::ApiResponse;

/// List all tags
#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List of tags", body = ApiResponse<Vec<TagResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tags",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_tags(
    actor: Actor,
    State(service): State<Arc<TagService>>,
) -> Result<Json<ApiResponse<Vec<TagResponseDto>>>> {
    let tags = service.list(&actor).await?;
    Ok(Json(ApiResponse::success(Some(tags), None, None)))
}

/// Create a tag (admin or editor)
#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagDto,
    responses(
        (status = 201, description = "Tag created", body = ApiResponse<TagResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Name already taken")
    ),
    tag = "tags",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_tag(
    actor: Actor,
    State(service): State<Arc<TagService>>,
    AppJson(dto): AppJson<CreateTagDto>,
) -> Result<(StatusCode, Json<ApiResponse<TagResponseDto>>)> {
    let tag = service.create(&actor, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(tag), None, None)),
    ))
}

/// Delete a tag (admin or editor)
#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(
        ("id" = i64, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_tag(
    actor: Actor,
    State(service): State<Arc<TagService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Tag deleted".to_string()),
        None,
    )))
}
