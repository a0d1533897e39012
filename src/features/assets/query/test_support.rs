use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::features::assets::models::{Asset, AssetType};
use crate::features::users::models::UserRef;

/// A live asset carrying `tags`, uploaded 2024-01-01 by "uploader"
pub fn asset_with(tags: &[&str]) -> Asset {
    let uploader = UserRef {
        id: Uuid::now_v7(),
        username: "uploader".to_string(),
    };
    let uploaded_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

    Asset {
        id: Uuid::now_v7(),
        name: "asset".to_string(),
        description: String::new(),
        file_ref: "assets/2024/01/01/asset.bin".to_string(),
        original_filename: "asset.bin".to_string(),
        content_type: "application/octet-stream".to_string(),
        file_type: AssetType::Other,
        file_extension: "bin".to_string(),
        file_size: 1,
        category: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        uploaded_by: uploader.clone(),
        modified_by: Some(uploader),
        uploaded_at,
        updated_at: uploaded_at,
        is_deleted: false,
    }
}
