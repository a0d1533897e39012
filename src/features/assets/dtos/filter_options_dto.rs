use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::assets::models::AssetType;

/// Selectable asset type with its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetTypeOptionDto {
    pub value: AssetType,
    #[schema(example = "Image")]
    pub label: String,
}

/// Upload date span of the live catalog; both `None` when it is empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRangeDto {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Facets for building search filters in a UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterOptionsDto {
    /// Distinct tag names in use, sorted
    pub tags: Vec<String>,
    /// Category names, sorted
    pub categories: Vec<String>,
    /// Distinct usernames of last modifiers, sorted
    pub users: Vec<String>,
    pub asset_types: Vec<AssetTypeOptionDto>,
    pub date_range: DateRangeDto,
    pub total_assets: i64,
}
