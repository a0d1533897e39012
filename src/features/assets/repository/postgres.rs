use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::AssetRepository;
use crate::core::database::contains_pattern;
use crate::core::error::{AppError, Result};
use crate::features::assets::models::{Asset, AssetTotals, AssetType, NewAsset};
use crate::features::assets::query::{AssetQuery, Condition, DelimitedTags, TagStorage};
use crate::features::categories::models::{CategoryKey, CategoryRef};
use crate::features::users::models::UserRef;
use crate::shared::types::Page;

const ASSET_COLUMNS: &str = r#"
    a.id, a.name, a.description, a.file_ref, a.original_filename, a.content_type,
    a.file_type, a.file_extension, a.file_size,
    a.category_id, c.name AS category_name,
    a.tags_csv,
    COALESCE(
        (SELECT array_agg(t.name ORDER BY t.name)
         FROM asset_tags atg JOIN tags t ON t.id = atg.tag_id
         WHERE atg.asset_id = a.id),
        ARRAY[]::text[]
    ) AS tag_names,
    a.uploaded_by, ub.username AS uploaded_by_username,
    a.modified_by, mb.username AS modified_by_username,
    a.uploaded_at, a.updated_at, a.is_deleted
"#;

const ASSET_FROM: &str = r#"
    FROM assets a
    JOIN users ub ON ub.id = a.uploaded_by
    LEFT JOIN users mb ON mb.id = a.modified_by
    LEFT JOIN categories c ON c.id = a.category_id
"#;

/// Row shape of [`ASSET_COLUMNS`]
#[derive(Debug, FromRow)]
struct AssetRow {
    id: Uuid,
    name: String,
    description: String,
    file_ref: String,
    original_filename: String,
    content_type: String,
    file_type: AssetType,
    file_extension: String,
    file_size: i64,
    category_id: Option<i64>,
    category_name: Option<String>,
    tags_csv: String,
    tag_names: Vec<String>,
    uploaded_by: Uuid,
    uploaded_by_username: String,
    modified_by: Option<Uuid>,
    modified_by_username: Option<String>,
    uploaded_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
}

impl AssetRow {
    fn into_asset(self, storage: TagStorage) -> Asset {
        let tags = match storage {
            TagStorage::Normalized => self.tag_names,
            TagStorage::Denormalized => DelimitedTags::split(&self.tags_csv),
        };

        let category = match (self.category_id, self.category_name) {
            (Some(id), Some(name)) => Some(CategoryRef { id, name }),
            _ => None,
        };

        let modified_by = match (self.modified_by, self.modified_by_username) {
            (Some(id), Some(username)) => Some(UserRef { id, username }),
            _ => None,
        };

        Asset {
            id: self.id,
            name: self.name,
            description: self.description,
            file_ref: self.file_ref,
            original_filename: self.original_filename,
            content_type: self.content_type,
            file_type: self.file_type,
            file_extension: self.file_extension,
            file_size: self.file_size,
            category,
            tags,
            uploaded_by: UserRef {
                id: self.uploaded_by,
                username: self.uploaded_by_username,
            },
            modified_by,
            uploaded_at: self.uploaded_at,
            updated_at: self.updated_at,
            is_deleted: self.is_deleted,
        }
    }
}

pub struct PgAssetRepository {
    pool: PgPool,
    tag_storage: TagStorage,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool, tag_storage: TagStorage) -> Self {
        Self { pool, tag_storage }
    }

    /// Match `pattern` (already `%`-wrapped) against the asset's tags
    fn push_tag_text_match(&self, qb: &mut QueryBuilder<'_, Postgres>, pattern: String) {
        match self.tag_storage {
            TagStorage::Denormalized => {
                qb.push("a.tags_csv ILIKE ").push_bind(pattern);
            }
            TagStorage::Normalized => {
                qb.push(
                    "EXISTS (SELECT 1 FROM asset_tags atg JOIN tags t ON t.id = atg.tag_id \
                     WHERE atg.asset_id = a.id AND t.name ILIKE ",
                )
                .push_bind(pattern)
                .push(")");
            }
        }
    }

    fn push_condition(&self, qb: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
        match condition {
            Condition::NotDeleted => {
                qb.push("a.is_deleted = FALSE");
            }
            Condition::Keyword(keyword) => {
                let pattern = contains_pattern(keyword);
                qb.push("(a.name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR a.description ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR a.file_ref ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR ");
                self.push_tag_text_match(qb, pattern);
                qb.push(")");
            }
            Condition::QuickText(text) => {
                let pattern = contains_pattern(text);
                qb.push("(a.name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR a.description ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR ");
                self.push_tag_text_match(qb, pattern);
                qb.push(")");
            }
            Condition::TagsContainAll(tags) => {
                qb.push("(TRUE");
                for tag in tags {
                    qb.push(" AND ");
                    self.push_tag_text_match(qb, contains_pattern(tag));
                }
                qb.push(")");
            }
            Condition::TagsAnyOf(tags) => match self.tag_storage {
                TagStorage::Denormalized => {
                    qb.push("string_to_array(a.tags_csv, ',') && ")
                        .push_bind(tags.clone())
                        .push("::text[]");
                }
                TagStorage::Normalized => {
                    qb.push(
                        "EXISTS (SELECT 1 FROM asset_tags atg JOIN tags t ON t.id = atg.tag_id \
                         WHERE atg.asset_id = a.id AND t.name = ANY(",
                    )
                    .push_bind(tags.clone())
                    .push("))");
                }
            },
            Condition::Category(key) => match CategoryKey::parse(key) {
                CategoryKey::Id(id) => {
                    qb.push("a.category_id = ").push_bind(id);
                }
                CategoryKey::Name(name) => {
                    qb.push("c.name = ").push_bind(name.to_string());
                }
            },
            Condition::AssetType(file_type) => {
                qb.push("a.file_type = ").push_bind(*file_type);
            }
            Condition::ModifiedByUsername(username) => {
                qb.push("mb.username ILIKE ")
                    .push_bind(contains_pattern(username));
            }
            Condition::UploadedFrom(date) => {
                qb.push("(a.uploaded_at AT TIME ZONE 'UTC')::date >= ")
                    .push_bind(*date);
            }
            Condition::UploadedTo(date) => {
                qb.push("(a.uploaded_at AT TIME ZONE 'UTC')::date <= ")
                    .push_bind(*date);
            }
            Condition::UploadedBy(user_id) => {
                qb.push("a.uploaded_by = ").push_bind(*user_id);
            }
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>, query: &AssetQuery) {
        qb.push(" WHERE TRUE");
        for condition in &query.filter.conditions {
            qb.push(" AND ");
            self.push_condition(qb, condition);
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Asset>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ASSET_COLUMNS)
            .push(ASSET_FROM)
            .push(" WHERE a.id = ")
            .push_bind(id);

        let row = qb
            .build_query_as::<AssetRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_asset(self.tag_storage)))
    }
}

/// Point the asset's tag memberships at exactly `tags`, creating missing tags
async fn replace_tag_links(conn: &mut PgConnection, asset_id: Uuid, tags: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM asset_tags WHERE asset_id = $1")
        .bind(asset_id)
        .execute(&mut *conn)
        .await?;

    if tags.is_empty() {
        return Ok(());
    }

    sqlx::query("INSERT INTO tags (name) SELECT unnest($1::text[]) ON CONFLICT (name) DO NOTHING")
        .bind(tags)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO asset_tags (asset_id, tag_id)
        SELECT $1, id FROM tags WHERE name = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(asset_id)
    .bind(tags)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    async fn query(&self, query: &AssetQuery) -> Result<Page<Asset>> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_qb.push(ASSET_FROM);
        self.push_where(&mut count_qb, query);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ASSET_COLUMNS).push(ASSET_FROM);
        self.push_where(&mut qb, query);
        qb.push(" ORDER BY a.uploaded_at DESC, a.id DESC");

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        if query.offset > 0 {
            qb.push(" OFFSET ").push_bind(query.offset);
        }

        debug!("Asset query: {}", qb.sql());

        let rows = qb
            .build_query_as::<AssetRow>()
            .fetch_all(&self.pool)
            .await?;

        let assets = rows
            .into_iter()
            .map(|r| r.into_asset(self.tag_storage))
            .collect();

        Ok(Page::new(assets, total))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Asset>> {
        self.fetch(id).await
    }

    async fn insert(&self, asset: NewAsset) -> Result<Asset> {
        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO assets (
                id, name, description, file_ref, original_filename, content_type,
                file_type, file_extension, file_size, category_id, tags_csv,
                uploaded_by, modified_by, uploaded_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12, $13, $13)
            "#,
        )
        .bind(id)
        .bind(&asset.name)
        .bind(&asset.description)
        .bind(&asset.file_ref)
        .bind(&asset.original_filename)
        .bind(&asset.content_type)
        .bind(asset.file_type)
        .bind(&asset.file_extension)
        .bind(asset.file_size)
        .bind(asset.category.as_ref().map(|c| c.id))
        .bind(DelimitedTags::join(&asset.tags))
        .bind(asset.uploaded_by.id)
        .bind(asset.uploaded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, "Asset already exists"))?;

        if self.tag_storage == TagStorage::Normalized {
            replace_tag_links(&mut tx, id, &asset.tags).await?;
        }

        tx.commit().await?;

        self.fetch(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Asset {} vanished after insert", id)))
    }

    async fn save(&self, asset: &Asset) -> Result<Option<Asset>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE assets
            SET name = $2,
                description = $3,
                category_id = $4,
                tags_csv = $5,
                file_type = $6,
                modified_by = $7,
                updated_at = $8,
                is_deleted = $9
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(asset.id)
        .bind(&asset.name)
        .bind(&asset.description)
        .bind(asset.category.as_ref().map(|c| c.id))
        .bind(DelimitedTags::join(&asset.tags))
        .bind(asset.file_type)
        .bind(asset.modified_by.as_ref().map(|u| u.id))
        .bind(asset.updated_at)
        .bind(asset.is_deleted)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, "Asset conflicts with an existing record"))?;

        if updated.rows_affected() == 0 {
            // Already deleted or gone; the transaction rolls back on drop
            return Ok(None);
        }

        if self.tag_storage == TagStorage::Normalized {
            replace_tag_links(&mut tx, asset.id, &asset.tags).await?;
        }

        tx.commit().await?;

        self.fetch(asset.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn totals(&self) -> Result<AssetTotals> {
        let (count, total_bytes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(file_size), 0)::BIGINT
            FROM assets
            WHERE is_deleted = FALSE
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AssetTotals { count, total_bytes })
    }
}
