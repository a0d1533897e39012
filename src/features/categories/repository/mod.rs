mod postgres;

pub use postgres::PgCategoryRepository;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::categories::models::Category;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by name
    async fn list(&self) -> Result<Vec<Category>>;

    /// Look a category up by key: integer keys are ids, others exact names
    async fn find(&self, key: &str) -> Result<Option<Category>>;

    /// Fails with `Conflict` when the name is taken
    async fn insert(&self, name: &str) -> Result<Category>;

    /// Delete the category, detaching it from assets. `false` if absent.
    async fn delete(&self, id: i64) -> Result<bool>;
}
