//! Tag storage shapes and the filtering semantics each one implies.
//!
//! Legacy catalogs keep tags as one comma-delimited string per asset, newer
//! ones link assets to tag rows. The query builder never looks at the shape
//! directly; it asks the active [`TagSource`] how tag filters behave.

use std::str::FromStr;
use std::sync::Arc;

use crate::features::assets::models::Asset;

/// Where tag names are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStorage {
    /// `asset_tags` join table against `tags`
    Normalized,
    /// Comma-delimited `tags_csv` column on the asset
    Denormalized,
}

impl FromStr for TagStorage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normalized" | "linked" => Ok(TagStorage::Normalized),
            "denormalized" | "delimited" | "csv" => Ok(TagStorage::Denormalized),
            other => Err(format!("Unknown TAG_STORAGE '{}'", other)),
        }
    }
}

/// How a multi-tag filter combines its tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSemantics {
    /// Every requested tag must appear (substring, case-insensitive)
    All,
    /// At least one requested tag must be attached (exact name)
    Any,
}

pub trait TagSource: Send + Sync {
    fn storage(&self) -> TagStorage;

    fn semantics(&self) -> TagSemantics;

    fn tags_of<'a>(&self, asset: &'a Asset) -> &'a [String] {
        &asset.tags
    }

    /// Assets of `snapshot` that carry `name` under this source's semantics
    fn assets_with_tag<'a>(&self, snapshot: &'a [Asset], name: &str) -> Vec<&'a Asset> {
        snapshot
            .iter()
            .filter(|asset| self.has_tag(asset, name))
            .collect()
    }

    fn has_tag(&self, asset: &Asset, name: &str) -> bool;

    /// Clean user-supplied tag names into what gets stored
    fn normalize(&self, names: &[String]) -> Vec<String> {
        normalize_names(names)
    }

    /// Whether a lowercased keyword hits the asset's tags
    fn keyword_matches(&self, asset: &Asset, keyword_lower: &str) -> bool;
}

/// Trim, split on commas, drop blanks and repeats (first spelling wins)
pub fn normalize_names(names: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();

    for part in names.iter().flat_map(|n| n.split(',')) {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        let key = name.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(name.to_string());
    }

    out
}

/// Split a comma-delimited request value into tag names
pub fn split_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tags stored as one delimited string per asset
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimitedTags;

impl DelimitedTags {
    /// Render tags as the stored column value
    pub fn join(tags: &[String]) -> String {
        tags.join(",")
    }

    /// Parse the stored column value back into names
    pub fn split(stored: &str) -> Vec<String> {
        split_tag_list(stored)
    }
}

impl TagSource for DelimitedTags {
    fn storage(&self) -> TagStorage {
        TagStorage::Denormalized
    }

    fn semantics(&self) -> TagSemantics {
        TagSemantics::All
    }

    fn has_tag(&self, asset: &Asset, name: &str) -> bool {
        Self::join(&asset.tags)
            .to_lowercase()
            .contains(&name.to_lowercase())
    }

    fn keyword_matches(&self, asset: &Asset, keyword_lower: &str) -> bool {
        Self::join(&asset.tags)
            .to_lowercase()
            .contains(keyword_lower)
    }
}

/// Tags linked to assets through the join table
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedTags;

impl TagSource for LinkedTags {
    fn storage(&self) -> TagStorage {
        TagStorage::Normalized
    }

    fn semantics(&self) -> TagSemantics {
        TagSemantics::Any
    }

    fn has_tag(&self, asset: &Asset, name: &str) -> bool {
        asset.tags.iter().any(|t| t == name)
    }

    fn keyword_matches(&self, asset: &Asset, keyword_lower: &str) -> bool {
        asset
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(keyword_lower))
    }
}

pub fn tag_source_for(storage: TagStorage) -> Arc<dyn TagSource> {
    match storage {
        TagStorage::Normalized => Arc::new(LinkedTags),
        TagStorage::Denormalized => Arc::new(DelimitedTags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assets::query::test_support::asset_with;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_storage_from_str() {
        assert_eq!("normalized".parse::<TagStorage>(), Ok(TagStorage::Normalized));
        assert_eq!("CSV".parse::<TagStorage>(), Ok(TagStorage::Denormalized));
        assert!("json".parse::<TagStorage>().is_err());
    }

    #[test]
    fn test_normalize_trims_splits_and_dedupes() {
        let cleaned = normalize_names(&names(&[" sunset ", "beach,Sunset", "", " , "]));
        assert_eq!(cleaned, names(&["sunset", "beach"]));
    }

    #[test]
    fn test_delimited_matches_substrings_case_insensitively() {
        let asset = asset_with(&["Landscape", "sunset"]);
        assert!(DelimitedTags.has_tag(&asset, "land"));
        assert!(DelimitedTags.has_tag(&asset, "SUNSET"));
        assert!(!DelimitedTags.has_tag(&asset, "portrait"));
    }

    #[test]
    fn test_linked_matches_exact_names() {
        let asset = asset_with(&["Landscape", "sunset"]);
        assert!(LinkedTags.has_tag(&asset, "Landscape"));
        assert!(!LinkedTags.has_tag(&asset, "land"));
        assert!(LinkedTags.keyword_matches(&asset, "land"));
    }

    #[test]
    fn test_assets_with_tag_filters_snapshot() {
        let snapshot = vec![asset_with(&["x", "y"]), asset_with(&["y"])];

        assert_eq!(LinkedTags.assets_with_tag(&snapshot, "x").len(), 1);
        assert_eq!(LinkedTags.assets_with_tag(&snapshot, "y").len(), 2);
        assert_eq!(DelimitedTags.assets_with_tag(&snapshot, "z").len(), 0);
    }

    #[test]
    fn test_delimited_round_trip_through_column() {
        let stored = DelimitedTags::join(&names(&["a", "b c"]));
        assert_eq!(stored, "a,b c");
        assert_eq!(DelimitedTags::split(" a , ,b c"), names(&["a", "b c"]));
    }
}
