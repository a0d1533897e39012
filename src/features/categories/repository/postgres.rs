use async_trait::async_trait;
use sqlx::PgPool;

use super::CategoryRepository;
use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryKey};

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(categories)
    }

    async fn find(&self, key: &str) -> Result<Option<Category>> {
        let query = match CategoryKey::parse(key) {
            CategoryKey::Id(id) => sqlx::query_as::<_, Category>(
                "SELECT id, name, created_at FROM categories WHERE id = $1",
            )
            .bind(id),
            CategoryKey::Name(name) => sqlx::query_as::<_, Category>(
                "SELECT id, name, created_at FROM categories WHERE name = $1",
            )
            .bind(name),
        };
        let category = query.fetch_optional(&self.pool).await?;

        Ok(category)
    }

    async fn insert(&self, name: &str) -> Result<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_db(e, &format!("Category '{}' already exists", name)))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // assets.category_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
