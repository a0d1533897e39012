//! Persistence for assets.
//!
//! Both implementations honor the same contract: results of [`AssetRepository::query`]
//! are ordered by `uploaded_at DESC, id DESC`, contain no duplicates, and
//! [`AssetRepository::save`] only writes assets that are not yet deleted.

mod memory;
mod postgres;

pub use memory::InMemoryCatalog;
pub use postgres::PgAssetRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::assets::models::{Asset, AssetTotals, NewAsset};
use crate::features::assets::query::AssetQuery;
use crate::shared::types::Page;

#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn query(&self, query: &AssetQuery) -> Result<Page<Asset>>;

    /// Fetch by id, deleted or not
    async fn get(&self, id: Uuid) -> Result<Option<Asset>>;

    async fn insert(&self, asset: NewAsset) -> Result<Asset>;

    /// Persist the mutable fields of `asset` in one atomic write, replacing its
    /// tags. Returns `None` when the stored row is already deleted or gone.
    async fn save(&self, asset: &Asset) -> Result<Option<Asset>>;

    /// Remove the row permanently
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Count and total size of non-deleted assets
    async fn totals(&self) -> Result<AssetTotals>;
}
