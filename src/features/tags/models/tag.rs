use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for tag
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
