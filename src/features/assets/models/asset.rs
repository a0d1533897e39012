use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::categories::models::CategoryRef;
use crate::features::users::models::UserRef;

/// Coarse asset classification matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "asset_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    Document,
    Other,
}

impl AssetType {
    pub const ALL: [AssetType; 4] = [
        AssetType::Image,
        AssetType::Video,
        AssetType::Document,
        AssetType::Other,
    ];

    /// Parse an exact type value, `None` for anything else
    pub fn parse(value: &str) -> Option<AssetType> {
        match value.trim() {
            "image" => Some(AssetType::Image),
            "video" => Some(AssetType::Video),
            "document" => Some(AssetType::Document),
            "other" => Some(AssetType::Other),
            _ => None,
        }
    }

    /// Classify a MIME type
    pub fn from_content_type(content_type: &str) -> AssetType {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        if essence.starts_with("image/") {
            AssetType::Image
        } else if essence.starts_with("video/") {
            AssetType::Video
        } else if essence.starts_with("text/")
            || matches!(
                essence.as_str(),
                "application/pdf" | "application/msword" | "application/rtf"
            )
            || essence.starts_with("application/vnd.openxmlformats-officedocument.")
            || essence.starts_with("application/vnd.ms-")
            || essence.starts_with("application/vnd.oasis.opendocument.")
        {
            AssetType::Document
        } else {
            AssetType::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetType::Image => "Image",
            AssetType::Video => "Video",
            AssetType::Document => "Document",
            AssetType::Other => "Other",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Image => write!(f, "image"),
            AssetType::Video => write!(f, "video"),
            AssetType::Document => write!(f, "document"),
            AssetType::Other => write!(f, "other"),
        }
    }
}

/// A catalogued file with its metadata and provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
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
}

impl Asset {
    pub fn is_uploaded_by(&self, user_id: Uuid) -> bool {
        self.uploaded_by.id == user_id
    }
}

/// Everything needed to insert an asset row
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub description: String,
    pub file_ref: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_type: AssetType,
    pub file_extension: String,
    pub file_size: i64,
    pub category: Option<CategoryRef>,
    /// Already normalized tag names
    pub tags: Vec<String>,
    pub uploaded_by: UserRef,
    pub uploaded_at: DateTime<Utc>,
}

/// Partial metadata update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct AssetChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Category id or name; an empty string clears the category
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub file_type: Option<AssetType>,
}

impl AssetChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.file_type.is_none()
    }
}

/// Aggregate numbers over non-deleted assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetTotals {
    pub count: i64,
    pub total_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(AssetType::parse("image"), Some(AssetType::Image));
        assert_eq!(AssetType::parse(" document "), Some(AssetType::Document));
        assert_eq!(AssetType::parse("Image"), None);
        assert_eq!(AssetType::parse("audio"), None);
    }

    #[test]
    fn test_from_content_type() {
        assert_eq!(AssetType::from_content_type("image/png"), AssetType::Image);
        assert_eq!(AssetType::from_content_type("video/mp4"), AssetType::Video);
        assert_eq!(
            AssetType::from_content_type("application/pdf"),
            AssetType::Document
        );
        assert_eq!(
            AssetType::from_content_type("text/plain; charset=utf-8"),
            AssetType::Document
        );
        assert_eq!(
            AssetType::from_content_type(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            AssetType::Document
        );
        assert_eq!(AssetType::from_content_type("audio/mpeg"), AssetType::Other);
        assert_eq!(
            AssetType::from_content_type("application/octet-stream"),
            AssetType::Other
        );
    }

    #[test]
    fn test_labels() {
        let labels: Vec<&str> = AssetType::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["Image", "Video", "Document", "Other"]);
    }
}
