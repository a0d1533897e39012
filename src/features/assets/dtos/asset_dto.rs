use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::assets::models::{Asset, AssetChanges, AssetType};
use crate::features::categories::models::CategoryRef;
use crate::features::users::models::UserRef;

/// Response DTO for an asset
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssetResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Opaque content store reference
    pub file_ref: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_type: AssetType,
    pub file_extension: String,
    /// Size in bytes of the stored content
    pub file_size: i64,
    pub category: Option<CategoryRef>,
    pub tags: Vec<String>,
    pub uploaded_by: UserRef,
    pub modified_by: Option<UserRef>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    /// Relative URL that streams the content
    #[schema(example = "/api/assets/0190c5a8-7d1e-7c3a-9f21-5b7e1c2d3e4f/download")]
    pub download_url: String,
}

impl From<Asset> for AssetResponseDto {
    fn from(a: Asset) -> Self {
        Self {
            download_url: format!("/api/assets/{}/download", a.id),
            id: a.id,
            name: a.name,
            description: a.description,
            file_ref: a.file_ref,
            original_filename: a.original_filename,
            content_type: a.content_type,
            file_type: a.file_type,
            file_extension: a.file_extension,
            file_size: a.file_size,
            category: a.category,
            tags: a.tags,
            uploaded_by: a.uploaded_by,
            modified_by: a.modified_by,
            uploaded_at: a.uploaded_at,
            updated_at: a.updated_at,
            is_deleted: a.is_deleted,
        }
    }
}

/// Upload asset request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadAssetDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Display name, defaults to the original filename
    #[schema(example = "Beach sunset")]
    pub name: Option<String>,
    pub description: Option<String>,
    /// Category id or exact name
    #[schema(example = "Photos")]
    pub category: Option<String>,
    /// Comma-separated tag names
    #[schema(example = "beach,sunset")]
    pub tags: Option<String>,
    /// image, video, document or other; derived from the content type when absent
    #[schema(example = "image")]
    pub file_type: Option<String>,
}

/// Raw uploaded file as read from the request
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Content type declared by the client, if any
    pub content_type: Option<String>,
}

/// Metadata accompanying an upload
#[derive(Debug, Clone, Default)]
pub struct AssetMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub file_type: Option<String>,
}

/// Request DTO for updating asset metadata
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAssetDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    /// Category id or name; empty string removes the category
    pub category: Option<String>,
    /// Replaces the full tag list
    pub tags: Option<Vec<String>>,
    pub file_type: Option<AssetType>,
}

impl From<UpdateAssetDto> for AssetChanges {
    fn from(dto: UpdateAssetDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            category: dto.category,
            tags: dto.tags,
            file_type: dto.file_type,
        }
    }
}

/// Query params for quick search
#[derive(Debug, Deserialize, IntoParams)]
pub struct QuickSearchQuery {
    /// Search text, at least 2 characters
    pub q: Option<String>,
}

/// Response DTO for quick search
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuickSearchResponseDto {
    pub results: Vec<AssetResponseDto>,
    pub count: usize,
    /// The trimmed query that was run
    pub query: String,
}

/// Response DTO for storage usage
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageStatsDto {
    pub total_size_bytes: i64,
    #[schema(example = "1.5GB")]
    pub total_size_formatted: String,
    pub storage_limit_bytes: i64,
    #[schema(example = "250.0GB")]
    pub storage_limit_formatted: String,
    pub usage_percentage: f64,
    pub total_files: i64,
}

/// How stored content should be presented to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Attachment => "attachment",
            Disposition::Inline => "inline",
        }
    }
}

/// Bytes of an asset ready to be streamed back
#[derive(Debug, Clone)]
pub struct AssetContent {
    pub bytes: Vec<u8>,
    pub length: i64,
    pub content_type: String,
    pub filename: String,
    pub disposition: Disposition,
}
