//! Composable predicates over the asset catalog.
//!
//! [`Condition::matches`] is the reference evaluation used by the in-memory
//! repository. The Postgres repository translates the same conditions to SQL.

use std::cmp::Ordering;

use chrono::NaiveDate;
use uuid::Uuid;

use super::tag_source::TagSource;
use crate::features::assets::models::{Asset, AssetType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    NotDeleted,
    /// Substring of name, description, file reference or tags
    Keyword(String),
    /// Substring of name, description or tags
    QuickText(String),
    /// Every tag must be a substring of the asset's tags
    TagsContainAll(Vec<String>),
    /// The asset carries at least one of these exact tags
    TagsAnyOf(Vec<String>),
    /// Category key: an integer id or an exact name
    Category(String),
    AssetType(AssetType),
    ModifiedByUsername(String),
    UploadedFrom(NaiveDate),
    UploadedTo(NaiveDate),
    UploadedBy(Uuid),
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl Condition {
    pub fn matches(&self, asset: &Asset, tags: &dyn TagSource) -> bool {
        match self {
            Condition::NotDeleted => !asset.is_deleted,
            Condition::Keyword(keyword) => {
                let needle = keyword.to_lowercase();
                contains_ci(&asset.name, &needle)
                    || contains_ci(&asset.description, &needle)
                    || contains_ci(&asset.file_ref, &needle)
                    || tags.keyword_matches(asset, &needle)
            }
            Condition::QuickText(text) => {
                let needle = text.to_lowercase();
                contains_ci(&asset.name, &needle)
                    || contains_ci(&asset.description, &needle)
                    || tags.keyword_matches(asset, &needle)
            }
            Condition::TagsContainAll(wanted) => {
                let have: Vec<String> = tags
                    .tags_of(asset)
                    .iter()
                    .map(|t| t.to_lowercase())
                    .collect();
                wanted.iter().all(|w| {
                    let w = w.to_lowercase();
                    have.iter().any(|t| t.contains(&w))
                })
            }
            Condition::TagsAnyOf(wanted) => tags
                .tags_of(asset)
                .iter()
                .any(|t| wanted.iter().any(|w| w == t)),
            Condition::Category(key) => asset
                .category
                .as_ref()
                .is_some_and(|c| c.matches_key(key)),
            Condition::AssetType(file_type) => asset.file_type == *file_type,
            Condition::ModifiedByUsername(username) => asset
                .modified_by
                .as_ref()
                .is_some_and(|u| contains_ci(&u.username, &username.to_lowercase())),
            Condition::UploadedFrom(date) => asset.uploaded_at.date_naive() >= *date,
            Condition::UploadedTo(date) => asset.uploaded_at.date_naive() <= *date,
            Condition::UploadedBy(user_id) => asset.uploaded_by.id == *user_id,
        }
    }
}

/// Conjunction of conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilter {
    pub conditions: Vec<Condition>,
}

impl AssetFilter {
    /// Filter that only admits non-deleted assets
    pub fn live() -> Self {
        Self {
            conditions: vec![Condition::NotDeleted],
        }
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
    }

    pub fn matches(&self, asset: &Asset, tags: &dyn TagSource) -> bool {
        self.conditions.iter().all(|c| c.matches(asset, tags))
    }
}

/// A filter plus the window of ordered results to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetQuery {
    pub filter: AssetFilter,
    /// `None` returns every match
    pub limit: Option<i64>,
    pub offset: i64,
}

impl AssetQuery {
    /// Every non-deleted asset
    pub fn all_live() -> Self {
        Self {
            filter: AssetFilter::live(),
            limit: None,
            offset: 0,
        }
    }

    pub fn restrict_to_uploader(&mut self, user_id: Uuid) {
        self.filter.push(Condition::UploadedBy(user_id));
    }

    /// Result ordering: newest upload first, ties broken by id descending
    pub fn order(a: &Asset, b: &Asset) -> Ordering {
        b.uploaded_at
            .cmp(&a.uploaded_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}
