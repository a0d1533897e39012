use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Database model for category
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn matches_key(&self, key: &str) -> bool {
        CategoryKey::parse(key).matches(self.id, &self.name)
    }
}

/// How a category filter or assignment key is interpreted.
///
/// Integer keys are ids and everything else is an exact name. Category
/// names may not be integers, so every category stays addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKey<'a> {
    Id(i64),
    Name(&'a str),
}

impl<'a> CategoryKey<'a> {
    pub fn parse(key: &'a str) -> Self {
        match key.parse::<i64>() {
            Ok(id) => CategoryKey::Id(id),
            Err(_) => CategoryKey::Name(key),
        }
    }

    pub fn matches(&self, id: i64, name: &str) -> bool {
        match self {
            CategoryKey::Id(wanted) => *wanted == id,
            CategoryKey::Name(wanted) => *wanted == name,
        }
    }
}

/// Category as embedded in an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

impl CategoryRef {
    pub fn matches_key(&self, key: &str) -> bool {
        CategoryKey::parse(key).matches(self.id, &self.name)
    }
}
