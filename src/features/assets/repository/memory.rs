use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::AssetRepository;
use crate::core::error::{AppError, Result};
use crate::features::assets::models::{Asset, AssetTotals, NewAsset};
use crate::features::assets::query::{tag_source_for, AssetQuery, TagSource, TagStorage};
use crate::features::categories::models::{Category, CategoryKey};
use crate::features::categories::repository::CategoryRepository;
use crate::features::tags::models::Tag;
use crate::features::tags::repository::TagRepository;
use crate::shared::types::Page;

fn poison_err<T>(_: PoisonError<T>) -> AppError {
    AppError::Internal("catalog lock poisoned".to_string())
}

/// Asset as held in memory. Category and linked tags are kept by id and
/// resolved on read, so taxonomy deletes show through like foreign keys.
#[derive(Debug, Clone)]
struct StoredAsset {
    asset: Asset,
    category_id: Option<i64>,
    tag_ids: Vec<i64>,
}

#[derive(Debug, Default)]
struct CatalogState {
    assets: HashMap<Uuid, StoredAsset>,
    categories: BTreeMap<i64, Category>,
    tags: BTreeMap<i64, Tag>,
    next_category_id: i64,
    next_tag_id: i64,
}

impl CatalogState {
    fn resolve(&self, stored: &StoredAsset, storage: TagStorage) -> Asset {
        let mut asset = stored.asset.clone();

        asset.category = stored
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(Category::to_ref);

        if storage == TagStorage::Normalized {
            let mut names: Vec<String> = stored
                .tag_ids
                .iter()
                .filter_map(|id| self.tags.get(id))
                .map(|t| t.name.clone())
                .collect();
            names.sort();
            asset.tags = names;
        }

        asset
    }

    fn tag_id_for(&mut self, name: &str) -> i64 {
        if let Some(tag) = self.tags.values().find(|t| t.name == name) {
            return tag.id;
        }
        self.next_tag_id += 1;
        let id = self.next_tag_id;
        self.tags.insert(
            id,
            Tag {
                id,
                name: name.to_string(),
                created_at: Utc::now(),
            },
        );
        id
    }

    fn link_tags(&mut self, names: &[String]) -> Vec<i64> {
        names.iter().map(|name| self.tag_id_for(name)).collect()
    }
}

/// In-memory catalog: assets together with their categories and tags.
///
/// One value implements [`AssetRepository`], [`CategoryRepository`] and
/// [`TagRepository`] so that deleting a category or tag affects the assets
/// that reference it.
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
    tag_storage: TagStorage,
    tag_source: Arc<dyn TagSource>,
}

impl InMemoryCatalog {
    pub fn new(tag_storage: TagStorage) -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
            tag_storage,
            tag_source: tag_source_for(tag_storage),
        }
    }
}

#[async_trait]
impl AssetRepository for InMemoryCatalog {
    async fn query(&self, query: &AssetQuery) -> Result<Page<Asset>> {
        let state = self.state.read().map_err(poison_err)?;

        let mut matched: Vec<Asset> = state
            .assets
            .values()
            .map(|stored| state.resolve(stored, self.tag_storage))
            .filter(|asset| query.filter.matches(asset, self.tag_source.as_ref()))
            .collect();
        matched.sort_by(AssetQuery::order);

        let total = matched.len() as i64;
        let window = matched
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.map_or(usize::MAX, |l| l.max(0) as usize))
            .collect();

        Ok(Page::new(window, total))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Asset>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state
            .assets
            .get(&id)
            .map(|stored| state.resolve(stored, self.tag_storage)))
    }

    async fn insert(&self, new: NewAsset) -> Result<Asset> {
        let mut state = self.state.write().map_err(poison_err)?;

        let category_id = new.category.as_ref().map(|c| c.id);
        if let Some(id) = category_id {
            if !state.categories.contains_key(&id) {
                return Err(AppError::Validation(format!("Category {} does not exist", id)));
            }
        }

        let tag_ids = match self.tag_storage {
            TagStorage::Normalized => state.link_tags(&new.tags),
            TagStorage::Denormalized => Vec::new(),
        };

        let asset = Asset {
            id: Uuid::now_v7(),
            name: new.name,
            description: new.description,
            file_ref: new.file_ref,
            original_filename: new.original_filename,
            content_type: new.content_type,
            file_type: new.file_type,
            file_extension: new.file_extension,
            file_size: new.file_size,
            category: None,
            tags: new.tags,
            modified_by: Some(new.uploaded_by.clone()),
            uploaded_by: new.uploaded_by,
            uploaded_at: new.uploaded_at,
            updated_at: new.uploaded_at,
            is_deleted: false,
        };

        let stored = StoredAsset {
            asset,
            category_id,
            tag_ids,
        };
        let resolved = state.resolve(&stored, self.tag_storage);
        state.assets.insert(resolved.id, stored);

        Ok(resolved)
    }

    async fn save(&self, asset: &Asset) -> Result<Option<Asset>> {
        let mut state = self.state.write().map_err(poison_err)?;

        match state.assets.get(&asset.id) {
            Some(existing) if !existing.asset.is_deleted => {}
            _ => return Ok(None),
        }

        let category_id = asset.category.as_ref().map(|c| c.id);
        if let Some(id) = category_id {
            if !state.categories.contains_key(&id) {
                return Err(AppError::Validation(format!("Category {} does not exist", id)));
            }
        }

        let tag_ids = match self.tag_storage {
            TagStorage::Normalized => state.link_tags(&asset.tags),
            TagStorage::Denormalized => Vec::new(),
        };

        let stored = StoredAsset {
            asset: asset.clone(),
            category_id,
            tag_ids,
        };
        let resolved = state.resolve(&stored, self.tag_storage);
        state.assets.insert(asset.id, stored);

        Ok(Some(resolved))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().map_err(poison_err)?;
        Ok(state.assets.remove(&id).is_some())
    }

    async fn totals(&self) -> Result<AssetTotals> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state
            .assets
            .values()
            .filter(|s| !s.asset.is_deleted)
            .fold(AssetTotals::default(), |acc, s| AssetTotals {
                count: acc.count + 1,
                total_bytes: acc.total_bytes + s.asset.file_size,
            }))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCatalog {
    async fn list(&self) -> Result<Vec<Category>> {
        let state = self.state.read().map_err(poison_err)?;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find(&self, key: &str) -> Result<Option<Category>> {
        let state = self.state.read().map_err(poison_err)?;
        let found = match CategoryKey::parse(key) {
            CategoryKey::Id(id) => state.categories.get(&id),
            CategoryKey::Name(name) => state.categories.values().find(|c| c.name == name),
        };

        Ok(found.cloned())
    }

    async fn insert(&self, name: &str) -> Result<Category> {
        let mut state = self.state.write().map_err(poison_err)?;
        if state.categories.values().any(|c| c.name == name) {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        state.next_category_id += 1;
        let category = Category {
            id: state.next_category_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.categories.insert(category.id, category.clone());

        Ok(category)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().map_err(poison_err)?;
        if state.categories.remove(&id).is_none() {
            return Ok(false);
        }

        for stored in state.assets.values_mut() {
            if stored.category_id == Some(id) {
                stored.category_id = None;
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl TagRepository for InMemoryCatalog {
    async fn list(&self) -> Result<Vec<Tag>> {
        let state = self.state.read().map_err(poison_err)?;
        let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn insert(&self, name: &str) -> Result<Tag> {
        let mut state = self.state.write().map_err(poison_err)?;
        if state.tags.values().any(|t| t.name == name) {
            return Err(AppError::Conflict(format!("Tag '{}' already exists", name)));
        }

        let id = state.tag_id_for(name);
        state
            .tags
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Tag {} vanished after insert", id)))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().map_err(poison_err)?;
        if state.tags.remove(&id).is_none() {
            return Ok(false);
        }

        for stored in state.assets.values_mut() {
            stored.tag_ids.retain(|t| *t != id);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assets::models::AssetType;
    use crate::features::assets::query::AssetFilter;
    use crate::features::users::models::UserRef;
    use chrono::{DateTime, TimeZone};

    fn uploader() -> UserRef {
        UserRef {
            id: Uuid::now_v7(),
            username: "uploader".to_string(),
        }
    }

    fn new_asset(name: &str, tags: &[&str], uploaded_at: DateTime<Utc>) -> NewAsset {
        NewAsset {
            name: name.to_string(),
            description: String::new(),
            file_ref: format!("assets/{}", name),
            original_filename: format!("{}.png", name),
            content_type: "image/png".to_string(),
            file_type: AssetType::Image,
            file_extension: "png".to_string(),
            file_size: 100,
            category: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            uploaded_by: uploader(),
            uploaded_at,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_query_orders_newest_first_and_counts_before_paging() {
        let catalog = InMemoryCatalog::new(TagStorage::Normalized);
        for d in 1..=5 {
            AssetRepository::insert(&catalog, new_asset(&format!("a{}", d), &[], day(d)))
                .await
                .unwrap();
        }

        let page = catalog
            .query(&AssetQuery {
                filter: AssetFilter::live(),
                limit: Some(2),
                offset: 1,
            })
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        let names: Vec<&str> = page.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a4", "a3"]);
    }

    #[tokio::test]
    async fn test_normalized_insert_links_tags() {
        let catalog = InMemoryCatalog::new(TagStorage::Normalized);
        let asset = AssetRepository::insert(&catalog, new_asset("a", &["y", "x"], day(1)))
            .await
            .unwrap();
        AssetRepository::insert(&catalog, new_asset("b", &["y"], day(2)))
            .await
            .unwrap();

        assert_eq!(asset.tags, vec!["x", "y"]);
        let tags = TagRepository::list(&catalog).await.unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_tag_unlinks_without_touching_assets() {
        let catalog = InMemoryCatalog::new(TagStorage::Normalized);
        let asset = AssetRepository::insert(&catalog, new_asset("a", &["x", "y"], day(1)))
            .await
            .unwrap();

        let x = TagRepository::list(&catalog)
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.name == "x")
            .unwrap();
        assert!(TagRepository::delete(&catalog, x.id).await.unwrap());
        assert!(!TagRepository::delete(&catalog, x.id).await.unwrap());

        let reloaded = catalog.get(asset.id).await.unwrap().unwrap();
        assert_eq!(reloaded.tags, vec!["y"]);
    }

    #[tokio::test]
    async fn test_deleting_category_detaches_assets() {
        let catalog = InMemoryCatalog::new(TagStorage::Denormalized);
        let photos = CategoryRepository::insert(&catalog, "Photos").await.unwrap();

        let mut new = new_asset("a", &[], day(1));
        new.category = Some(photos.to_ref());
        let asset = AssetRepository::insert(&catalog, new).await.unwrap();
        assert_eq!(asset.category.as_ref().map(|c| c.name.as_str()), Some("Photos"));

        assert!(CategoryRepository::delete(&catalog, photos.id).await.unwrap());
        let reloaded = catalog.get(asset.id).await.unwrap().unwrap();
        assert_eq!(reloaded.category, None);
    }

    #[tokio::test]
    async fn test_category_names_are_unique_and_findable() {
        let catalog = InMemoryCatalog::new(TagStorage::Normalized);
        let docs = CategoryRepository::insert(&catalog, "Docs").await.unwrap();

        assert!(matches!(
            CategoryRepository::insert(&catalog, "Docs").await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(
            catalog.find(&docs.id.to_string()).await.unwrap(),
            Some(docs.clone())
        );
        assert_eq!(catalog.find("Docs").await.unwrap(), Some(docs));
        assert_eq!(catalog.find("docs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_refuses_deleted_assets() {
        let catalog = InMemoryCatalog::new(TagStorage::Denormalized);
        let mut asset = AssetRepository::insert(&catalog, new_asset("a", &["x"], day(1)))
            .await
            .unwrap();

        asset.is_deleted = true;
        assert!(catalog.save(&asset).await.unwrap().is_some());

        asset.name = "renamed".to_string();
        assert!(catalog.save(&asset).await.unwrap().is_none());
        assert_eq!(catalog.get(asset.id).await.unwrap().unwrap().name, "a");
    }

    #[tokio::test]
    async fn test_totals_skip_deleted_and_hard_delete_removes() {
        let catalog = InMemoryCatalog::new(TagStorage::Normalized);
        let a = AssetRepository::insert(&catalog, new_asset("a", &[], day(1)))
            .await
            .unwrap();
        let mut b = AssetRepository::insert(&catalog, new_asset("b", &[], day(2)))
            .await
            .unwrap();

        b.is_deleted = true;
        catalog.save(&b).await.unwrap();
        assert_eq!(
            catalog.totals().await.unwrap(),
            AssetTotals {
                count: 1,
                total_bytes: 100
            }
        );

        assert!(AssetRepository::delete(&catalog, a.id).await.unwrap());
        assert!(catalog.get(a.id).await.unwrap().is_none());
        assert_eq!(catalog.totals().await.unwrap(), AssetTotals::default());
    }
}
