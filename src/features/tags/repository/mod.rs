mod postgres;

pub use postgres::PgTagRepository;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::tags::models::Tag;

#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Fails with `Conflict` when the name is taken
    async fn insert(&self, name: &str) -> Result<Tag>;

    /// Delete the tag and its memberships, never the assets. `false` if absent.
    async fn delete(&self, id: i64) -> Result<bool>;
}
