//! Facet aggregation over a snapshot of the catalog.
//!
//! Recomputed from scratch on every call. Cost grows linearly with the number
//! of live assets, which is fine for catalogs in the tens of thousands.

use std::collections::BTreeSet;

use crate::features::assets::dtos::{AssetTypeOptionDto, DateRangeDto, FilterOptionsDto};
use crate::features::assets::models::{Asset, AssetType};
use crate::features::assets::query::TagSource;
use crate::features::categories::models::Category;

/// Build the facet set from `snapshot` and the known categories.
///
/// Deleted assets in the snapshot are skipped.
pub fn aggregate(
    snapshot: &[Asset],
    categories: &[Category],
    tag_source: &dyn TagSource,
) -> FilterOptionsDto {
    let live: Vec<&Asset> = snapshot.iter().filter(|a| !a.is_deleted).collect();

    let tags: BTreeSet<String> = live
        .iter()
        .flat_map(|a| tag_source.tags_of(a).iter().cloned())
        .collect();

    let users: BTreeSet<String> = live
        .iter()
        .filter_map(|a| a.modified_by.as_ref())
        .map(|u| u.username.clone())
        .collect();

    let mut category_names: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
    category_names.sort();

    let date_range = DateRangeDto {
        earliest: live.iter().map(|a| a.uploaded_at).min(),
        latest: live.iter().map(|a| a.uploaded_at).max(),
    };

    let asset_types = AssetType::ALL
        .iter()
        .map(|t| AssetTypeOptionDto {
            value: *t,
            label: t.label().to_string(),
        })
        .collect();

    FilterOptionsDto {
        tags: tags.into_iter().collect(),
        categories: category_names,
        users: users.into_iter().collect(),
        asset_types,
        date_range,
        total_assets: live.len() as i64,
    }
}
