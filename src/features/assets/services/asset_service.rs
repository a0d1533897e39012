use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::config::CatalogConfig;
use crate::core::error::{AppError, Result};
use crate::features::assets::dtos::{
    AssetContent, AssetMetadata, AssetResponseDto, Disposition, FilterOptionsDto,
    QuickSearchResponseDto, StorageStatsDto, Upload,
};
use crate::features::assets::models::{Asset, AssetChanges, AssetTotals, AssetType, NewAsset};
use crate::features::assets::query::{
    tag_source_for, AssetFilter, AssetQuery, QueryBuilder, SearchParams, TagSource,
};
use crate::features::assets::repository::AssetRepository;
use crate::features::assets::services::filter_options;
use crate::features::auth::model::Actor;
use crate::features::auth::policy::{AccessPolicy, Action, Target};
use crate::features::categories::models::CategoryRef;
use crate::features::categories::repository::CategoryRepository;
use crate::features::users::repository::UserRepository;
use crate::modules::storage::ContentStore;
use crate::shared::types::{Page, PaginationQuery};

const OCTET_STREAM: &str = "application/octet-stream";

/// Render a byte count as `B`, `KB`, `MB` or `GB` with one decimal
pub fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size >= GB {
        format!("{:.1}GB", size / GB)
    } else if size >= MB {
        format!("{:.1}MB", size / MB)
    } else if size >= KB {
        format!("{:.1}KB", size / KB)
    } else {
        format!("{}B", bytes)
    }
}

/// Content type to record: the declared one unless missing or generic,
/// otherwise guessed from the filename
fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && !ct.eq_ignore_ascii_case(OCTET_STREAM) => ct.to_string(),
        _ => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

fn resolve_extension(filename: &str, content_type: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|e| e.to_string())
        })
        .unwrap_or_default()
}

/// Orchestrates the asset lifecycle over the repositories and content store
pub struct AssetService {
    assets: Arc<dyn AssetRepository>,
    categories: Arc<dyn CategoryRepository>,
    users: Arc<dyn UserRepository>,
    content: Arc<dyn ContentStore>,
    tag_source: Arc<dyn TagSource>,
    query_builder: QueryBuilder,
    policy: AccessPolicy,
    system_uploader_username: String,
    storage_limit_bytes: i64,
}

impl AssetService {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        categories: Arc<dyn CategoryRepository>,
        users: Arc<dyn UserRepository>,
        content: Arc<dyn ContentStore>,
        config: &CatalogConfig,
    ) -> Self {
        let tag_source = tag_source_for(config.tag_storage);
        Self {
            assets,
            categories,
            users,
            content,
            query_builder: QueryBuilder::new(tag_source.clone()),
            tag_source,
            policy: AccessPolicy::new(
                config.restrict_listing_to_owner,
                config.allow_anonymous_uploads,
            ),
            system_uploader_username: config.system_uploader_username.clone(),
            storage_limit_bytes: config.storage_limit_bytes,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Asset> {
        self.assets
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
    }

    /// The caller, or the system uploader when anonymous uploads are allowed
    async fn resolve_uploader(&self, actor: Option<Actor>) -> Result<Actor> {
        if let Some(actor) = actor {
            return Ok(actor);
        }

        if !self.policy.allow_anonymous_uploads {
            return Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_username(&self.system_uploader_username)
            .await?
            .ok_or_else(|| {
                error!(
                    "Anonymous uploads are enabled but uploader account '{}' does not exist",
                    self.system_uploader_username
                );
                AppError::Internal("Fallback uploader account is not provisioned".to_string())
            })?;

        Ok(Actor::fallback(user))
    }

    /// Blank clears, anything else must name an existing category
    async fn resolve_category(&self, key: &str) -> Result<Option<CategoryRef>> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }

        match self.categories.find(key).await? {
            Some(category) => Ok(Some(category.to_ref())),
            None => Err(AppError::Validation(format!(
                "Category '{}' does not exist",
                key
            ))),
        }
    }

    /// Narrow a query to the actor's own uploads when the policy demands it
    fn scope(&self, actor: &Actor, mut query: AssetQuery) -> AssetQuery {
        if self.policy.restricts_listing(actor) {
            query.restrict_to_uploader(actor.user.id);
        }
        query
    }

    pub async fn create(
        &self,
        actor: Option<Actor>,
        upload: Upload,
        metadata: AssetMetadata,
    ) -> Result<AssetResponseDto> {
        let actor = self.resolve_uploader(actor).await?;
        self.policy
            .authorize(Some(&actor), Action::Create, Target::None)?;

        if upload.bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let name = metadata
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| upload.filename.trim())
            .to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let category = match metadata.category.as_deref() {
            Some(key) => self.resolve_category(key).await?,
            None => None,
        };

        let content_type = resolve_content_type(upload.content_type.as_deref(), &upload.filename);
        let file_type = metadata
            .file_type
            .as_deref()
            .and_then(AssetType::parse)
            .unwrap_or_else(|| AssetType::from_content_type(&content_type));
        let file_extension = resolve_extension(&upload.filename, &content_type);
        let tags = self.tag_source.normalize(&metadata.tags);

        let file_size = upload.bytes.len() as i64;
        let file_ref = self
            .content
            .put(&upload.filename, upload.bytes, &content_type)
            .await?;

        debug!("Stored {} bytes for '{}' at {}", file_size, name, file_ref);

        let new_asset = NewAsset {
            name,
            description: metadata.description.unwrap_or_default(),
            file_ref: file_ref.clone(),
            original_filename: upload.filename,
            content_type,
            file_type,
            file_extension,
            file_size,
            category,
            tags,
            uploaded_by: actor.user.to_ref(),
            uploaded_at: Utc::now(),
        };

        let asset = self.assets.insert(new_asset).await.inspect_err(|e| {
            warn!("Asset insert failed, content at {} is orphaned: {}", file_ref, e);
        })?;

        info!(
            "Asset created: id={}, uploader={}, size={}",
            asset.id, asset.uploaded_by.username, asset.file_size
        );

        Ok(asset.into())
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: AssetChanges,
    ) -> Result<AssetResponseDto> {
        let mut asset = self.load(id).await?;
        self.policy
            .authorize(Some(actor), Action::Update, Target::Asset(&asset))?;

        if asset.is_deleted {
            return Err(AppError::Conflict(format!("Asset {} has been deleted", id)));
        }

        if let Some(name) = changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Name cannot be blank".to_string()));
            }
            asset.name = name.to_string();
        }
        if let Some(description) = changes.description {
            asset.description = description;
        }
        if let Some(category) = changes.category {
            asset.category = self.resolve_category(&category).await?;
        }
        if let Some(tags) = changes.tags {
            asset.tags = self.tag_source.normalize(&tags);
        }
        if let Some(file_type) = changes.file_type {
            asset.file_type = file_type;
        }

        asset.modified_by = Some(actor.user.to_ref());
        asset.updated_at = Utc::now();

        let saved = self
            .assets
            .save(&asset)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Asset {} has been deleted", id)))?;

        info!("Asset updated: id={}, by={}", id, actor.user.username);

        Ok(saved.into())
    }

    /// Mark the asset deleted. Stored content is kept.
    pub async fn soft_delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let mut asset = self.load(id).await?;
        self.policy
            .authorize(Some(actor), Action::Delete, Target::Asset(&asset))?;

        if asset.is_deleted {
            return Err(AppError::Conflict(format!(
                "Asset {} is already deleted",
                id
            )));
        }

        asset.is_deleted = true;
        asset.modified_by = Some(actor.user.to_ref());
        asset.updated_at = Utc::now();

        self.assets
            .save(&asset)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Asset {} is already deleted", id)))?;

        info!("Asset soft-deleted: id={}, by={}", id, actor.user.username);
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<AssetResponseDto> {
        let asset = self.load(id).await?;
        self.policy
            .authorize(Some(actor), Action::Read, Target::Asset(&asset))?;
        Ok(asset.into())
    }

    pub async fn list(
        &self,
        actor: &Actor,
        page: &PaginationQuery,
    ) -> Result<Page<AssetResponseDto>> {
        self.policy
            .authorize(Some(actor), Action::Read, Target::None)?;

        let query = self.scope(
            actor,
            AssetQuery {
                filter: AssetFilter::live(),
                limit: Some(page.limit()),
                offset: page.offset(),
            },
        );

        Ok(self.assets.query(&query).await?.map(AssetResponseDto::from))
    }

    pub async fn search(
        &self,
        actor: &Actor,
        params: &SearchParams,
    ) -> Result<Page<AssetResponseDto>> {
        self.policy
            .authorize(Some(actor), Action::Read, Target::None)?;

        let query = self.scope(actor, self.query_builder.build(params));
        debug!("Search conditions: {:?}", query.filter.conditions);

        Ok(self.assets.query(&query).await?.map(AssetResponseDto::from))
    }

    pub async fn quick_search(&self, actor: &Actor, q: &str) -> Result<QuickSearchResponseDto> {
        self.policy
            .authorize(Some(actor), Action::Read, Target::None)?;

        let query = self.scope(actor, self.query_builder.quick_search(q)?);
        let results: Vec<AssetResponseDto> = self
            .assets
            .query(&query)
            .await?
            .items
            .into_iter()
            .map(AssetResponseDto::from)
            .collect();

        Ok(QuickSearchResponseDto {
            count: results.len(),
            results,
            query: q.trim().to_string(),
        })
    }

    async fn content_of(&self, actor: &Actor, id: Uuid, disposition: Disposition) -> Result<AssetContent> {
        let asset = self.load(id).await?;
        self.policy
            .authorize(Some(actor), Action::Download, Target::Asset(&asset))?;

        let stored = self.content.get(&asset.file_ref).await?.ok_or_else(|| {
            warn!(
                "Content for asset {} is missing from the store ({})",
                asset.id, asset.file_ref
            );
            AppError::NotFound(format!("Content for asset {} not found", asset.id))
        })?;

        Ok(AssetContent {
            length: stored.length,
            bytes: stored.bytes,
            content_type: asset.content_type,
            filename: asset.original_filename,
            disposition,
        })
    }

    /// Content served as an attachment
    pub async fn download(&self, actor: &Actor, id: Uuid) -> Result<AssetContent> {
        self.content_of(actor, id, Disposition::Attachment).await
    }

    /// Content served inline for in-browser viewing
    pub async fn preview(&self, actor: &Actor, id: Uuid) -> Result<AssetContent> {
        self.content_of(actor, id, Disposition::Inline).await
    }

    /// Usage against the quota. Restricted actors only see their own uploads.
    pub async fn storage_stats(&self, actor: &Actor) -> Result<StorageStatsDto> {
        self.policy
            .authorize(Some(actor), Action::Read, Target::None)?;

        let totals = if self.policy.restricts_listing(actor) {
            let own = self
                .assets
                .query(&self.scope(actor, AssetQuery::all_live()))
                .await?;
            AssetTotals {
                count: own.total,
                total_bytes: own.items.iter().map(|a| a.file_size).sum(),
            }
        } else {
            self.assets.totals().await?
        };
        let usage_percentage = if self.storage_limit_bytes > 0 {
            totals.total_bytes as f64 / self.storage_limit_bytes as f64 * 100.0
        } else {
            0.0
        };

        Ok(StorageStatsDto {
            total_size_bytes: totals.total_bytes,
            total_size_formatted: format_size(totals.total_bytes),
            storage_limit_bytes: self.storage_limit_bytes,
            storage_limit_formatted: format_size(self.storage_limit_bytes),
            usage_percentage,
            total_files: totals.count,
        })
    }

    pub async fn filter_options(&self, actor: &Actor) -> Result<FilterOptionsDto> {
        self.policy
            .authorize(Some(actor), Action::Read, Target::None)?;

        let snapshot = self
            .assets
            .query(&self.scope(actor, AssetQuery::all_live()))
            .await?;
        let categories = self.categories.list().await?;

        Ok(filter_options::aggregate(
            &snapshot.items,
            &categories,
            self.tag_source.as_ref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assets::query::TagStorage;
    use crate::features::assets::repository::InMemoryCatalog;
    use crate::features::users::models::{Role, User};
    use crate::features::users::repository::InMemoryUserRepository;
    use crate::modules::storage::InMemoryContentStore;
    use crate::shared::test_helpers::{actor_with_role, make_user};
    use chrono::{DateTime, TimeZone};
    use tokio_test::{assert_err, assert_ok};

    struct Fixture {
        service: AssetService,
        catalog: Arc<InMemoryCatalog>,
        content: Arc<InMemoryContentStore>,
    }

    fn fixture_with(config: CatalogConfig, users: Vec<User>) -> Fixture {
        let catalog = Arc::new(InMemoryCatalog::new(config.tag_storage));
        let content = Arc::new(InMemoryContentStore::new());
        let users = Arc::new(InMemoryUserRepository::with_users(users));
        let service = AssetService::new(
            catalog.clone(),
            catalog.clone(),
            users,
            content.clone(),
            &config,
        );
        Fixture {
            service,
            catalog,
            content,
        }
    }

    fn fixture(tag_storage: TagStorage) -> Fixture {
        fixture_with(
            CatalogConfig {
                tag_storage,
                ..CatalogConfig::default()
            },
            Vec::new(),
        )
    }

    fn upload(filename: &str, bytes: &[u8]) -> Upload {
        Upload {
            bytes: bytes.to_vec(),
            filename: filename.to_string(),
            content_type: None,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// Asset A: tags x,y, Photos, 2024-01-01. Asset B: tag y, Docs, 2024-02-01.
    async fn seed_a_and_b(fx: &Fixture, uploader: &Actor) -> (Uuid, Uuid) {
        let photos = CategoryRepository::insert(fx.catalog.as_ref(), "Photos")
            .await
            .unwrap();
        let docs = CategoryRepository::insert(fx.catalog.as_ref(), "Docs")
            .await
            .unwrap();

        let new = |name: &str, tags: &[&str], category: CategoryRef, uploaded_at| NewAsset {
            name: name.to_string(),
            description: String::new(),
            file_ref: format!("assets/{}", name),
            original_filename: format!("{}.jpg", name),
            content_type: "image/jpeg".to_string(),
            file_type: AssetType::Image,
            file_extension: "jpg".to_string(),
            file_size: 10,
            category: Some(category),
            tags: strings(tags),
            uploaded_by: uploader.user.to_ref(),
            uploaded_at,
        };

        let a = AssetRepository::insert(
            fx.catalog.as_ref(),
            new("A", &["x", "y"], photos.to_ref(), at(2024, 1, 1)),
        )
        .await
        .unwrap();
        let b = AssetRepository::insert(
            fx.catalog.as_ref(),
            new("B", &["y"], docs.to_ref(), at(2024, 2, 1)),
        )
        .await
        .unwrap();

        (a.id, b.id)
    }

    async fn search_names(fx: &Fixture, actor: &Actor, params: SearchParams) -> Vec<String> {
        fx.service
            .search(actor, &params)
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|a| a.name)
            .collect()
    }

    #[tokio::test]
    async fn test_tag_filter_is_and_for_delimited_storage() {
        let fx = fixture(TagStorage::Denormalized);
        let actor = actor_with_role(Role::User);
        seed_a_and_b(&fx, &actor).await;

        let names = search_names(
            &fx,
            &actor,
            SearchParams {
                tag: Some("x,y".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(names, vec!["A"]);
    }

    #[tokio::test]
    async fn test_tag_filter_is_or_for_linked_storage() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::User);
        seed_a_and_b(&fx, &actor).await;

        let names = search_names(
            &fx,
            &actor,
            SearchParams {
                tag: Some("x,y".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_date_category_and_empty_keyword() {
        for storage in [TagStorage::Normalized, TagStorage::Denormalized] {
            let fx = fixture(storage);
            let actor = actor_with_role(Role::Viewer);
            seed_a_and_b(&fx, &actor).await;

            let from = search_names(
                &fx,
                &actor,
                SearchParams {
                    date_from: Some("2024-01-15".to_string()),
                    ..Default::default()
                },
            )
            .await;
            assert_eq!(from, vec!["B"]);

            let photos = search_names(
                &fx,
                &actor,
                SearchParams {
                    category: Some("Photos".to_string()),
                    ..Default::default()
                },
            )
            .await;
            assert_eq!(photos, vec!["A"]);

            let everything = search_names(
                &fx,
                &actor,
                SearchParams {
                    keyword: Some(String::new()),
                    ..Default::default()
                },
            )
            .await;
            assert_eq!(everything, vec!["B", "A"]);
        }
    }

    #[tokio::test]
    async fn test_create_derives_size_type_and_provenance() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::User);

        let created = fx
            .service
            .create(
                Some(actor.clone()),
                upload("Sunset.PNG", &[7u8; 2048]),
                AssetMetadata {
                    tags: strings(&["beach, sunset", "Beach"]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(created.name, "Sunset.PNG");
        assert_eq!(created.file_size, 2048);
        assert_eq!(created.content_type, "image/png");
        assert_eq!(created.file_type, AssetType::Image);
        assert_eq!(created.file_extension, "png");
        assert_eq!(created.tags, strings(&["beach", "sunset"]));
        assert_eq!(created.uploaded_by, actor.user.to_ref());
        assert_eq!(created.modified_by, Some(actor.user.to_ref()));
        assert!(!created.is_deleted);
        assert!(assert_ok!(fx.content.exists(&created.file_ref).await));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_file_and_unknown_category() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::User);

        let empty = fx
            .service
            .create(Some(actor.clone()), upload("a.txt", b""), AssetMetadata::default())
            .await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let unknown = fx
            .service
            .create(
                Some(actor),
                upload("a.txt", b"hello"),
                AssetMetadata {
                    category: Some("Nope".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_anonymous_upload_uses_provisioned_system_account() {
        let mut system = make_user(Role::User);
        system.username = "system".to_string();
        let config = CatalogConfig {
            allow_anonymous_uploads: true,
            ..CatalogConfig::default()
        };
        let fx = fixture_with(config, vec![system.clone()]);

        let created = fx
            .service
            .create(None, upload("note.txt", b"hi"), AssetMetadata::default())
            .await
            .unwrap();
        assert_eq!(created.uploaded_by.username, "system");
        assert_eq!(created.file_type, AssetType::Document);
    }

    #[tokio::test]
    async fn test_anonymous_upload_needs_switch_and_account() {
        let fx = fixture(TagStorage::Normalized);
        let denied = fx
            .service
            .create(None, upload("a.txt", b"x"), AssetMetadata::default())
            .await;
        assert!(matches!(denied, Err(AppError::Unauthorized(_))));

        let config = CatalogConfig {
            allow_anonymous_uploads: true,
            ..CatalogConfig::default()
        };
        let fx = fixture_with(config, Vec::new());
        let missing = fx
            .service
            .create(None, upload("a.txt", b"x"), AssetMetadata::default())
            .await;
        assert!(matches!(missing, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_update_stamps_modifier_but_keeps_upload_provenance() {
        let fx = fixture(TagStorage::Normalized);
        let owner = actor_with_role(Role::User);
        let editor = actor_with_role(Role::Editor);
        CategoryRepository::insert(fx.catalog.as_ref(), "Photos")
            .await
            .unwrap();

        let created = fx
            .service
            .create(Some(owner.clone()), upload("a.jpg", b"jpeg"), AssetMetadata::default())
            .await
            .unwrap();

        let updated = fx
            .service
            .update(
                &editor,
                created.id,
                AssetChanges {
                    name: Some("Renamed".to_string()),
                    category: Some("Photos".to_string()),
                    tags: Some(strings(&["new"])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.category.map(|c| c.name), Some("Photos".to_string()));
        assert_eq!(updated.tags, strings(&["new"]));
        assert_eq!(updated.uploaded_by, owner.user.to_ref());
        assert_eq!(updated.uploaded_at, created.uploaded_at);
        assert_eq!(updated.modified_by, Some(editor.user.to_ref()));

        let cleared = fx
            .service
            .update(
                &owner,
                created.id,
                AssetChanges {
                    category: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.category.is_none());
        assert_eq!(cleared.modified_by, Some(owner.user.to_ref()));
    }

    #[tokio::test]
    async fn test_viewer_can_read_but_not_modify_others_assets() {
        let fx = fixture(TagStorage::Normalized);
        let owner = actor_with_role(Role::User);
        let viewer = actor_with_role(Role::Viewer);

        let created = fx
            .service
            .create(Some(owner), upload("a.pdf", b"%PDF"), AssetMetadata::default())
            .await
            .unwrap();

        assert_ok!(fx.service.get(&viewer, created.id).await);

        let update = fx
            .service
            .update(&viewer, created.id, AssetChanges::default())
            .await;
        assert!(matches!(update, Err(AppError::Forbidden(_))));

        let delete = fx.service.soft_delete(&viewer, created.id).await;
        assert!(matches!(delete, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_owner_restriction_hides_other_uploads() {
        let config = CatalogConfig {
            restrict_listing_to_owner: true,
            ..CatalogConfig::default()
        };
        let fx = fixture_with(config, Vec::new());
        let alice = actor_with_role(Role::User);
        let bob = actor_with_role(Role::User);
        let admin = actor_with_role(Role::Admin);

        let created = fx
            .service
            .create(Some(alice.clone()), upload("a.txt", b"a"), AssetMetadata::default())
            .await
            .unwrap();

        let for_bob = fx
            .service
            .search(&bob, &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(for_bob.total, 0);
        assert!(matches!(
            fx.service.get(&bob, created.id).await,
            Err(AppError::Forbidden(_))
        ));

        let for_alice = fx
            .service
            .list(&alice, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(for_alice.total, 1);

        let for_admin = fx
            .service
            .search(&admin, &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(for_admin.total, 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_search_but_get_reports_it() {
        let fx = fixture(TagStorage::Denormalized);
        let owner = actor_with_role(Role::User);

        let created = fx
            .service
            .create(Some(owner.clone()), upload("a.txt", b"abc"), AssetMetadata::default())
            .await
            .unwrap();

        assert_ok!(fx.service.soft_delete(&owner, created.id).await);

        let results = fx
            .service
            .search(&owner, &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(results.total, 0);

        let fetched = fx.service.get(&owner, created.id).await.unwrap();
        assert!(fetched.is_deleted);

        let again = fx.service.soft_delete(&owner, created.id).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let update = fx
            .service
            .update(
                &owner,
                created.id,
                AssetChanges {
                    name: Some("back".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(update, Err(AppError::Conflict(_))));

        // Only admins may still fetch deleted content
        assert!(matches!(
            fx.service.download(&owner, created.id).await,
            Err(AppError::Forbidden(_))
        ));
        let admin = actor_with_role(Role::Admin);
        assert_ok!(fx.service.download(&admin, created.id).await);
    }

    #[tokio::test]
    async fn test_quick_search_guards_length_and_caps_results() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::User);

        assert!(matches!(
            fx.service.quick_search(&actor, " a ").await,
            Err(AppError::Validation(_))
        ));

        for i in 0..12 {
            fx.service
                .create(
                    Some(actor.clone()),
                    upload(&format!("report-{}.txt", i), b"data"),
                    AssetMetadata::default(),
                )
                .await
                .unwrap();
        }

        let found = fx.service.quick_search(&actor, " report ").await.unwrap();
        assert_eq!(found.count, 10);
        assert_eq!(found.results.len(), 10);
        assert_eq!(found.query, "report");
    }

    #[tokio::test]
    async fn test_download_and_preview_dispositions() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::User);
        let created = fx
            .service
            .create(
                Some(actor.clone()),
                Upload {
                    bytes: b"<svg/>".to_vec(),
                    filename: "logo.svg".to_string(),
                    content_type: Some("image/svg+xml".to_string()),
                },
                AssetMetadata::default(),
            )
            .await
            .unwrap();

        let download = fx.service.download(&actor, created.id).await.unwrap();
        assert_eq!(download.disposition, Disposition::Attachment);
        assert_eq!(download.bytes, b"<svg/>".to_vec());
        assert_eq!(download.length, 6);
        assert_eq!(download.content_type, "image/svg+xml");
        assert_eq!(download.filename, "logo.svg");

        let preview = fx.service.preview(&actor, created.id).await.unwrap();
        assert_eq!(preview.disposition, Disposition::Inline);
    }

    #[tokio::test]
    async fn test_missing_content_is_not_found() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::User);
        let created = fx
            .service
            .create(Some(actor.clone()), upload("a.bin", b"1"), AssetMetadata::default())
            .await
            .unwrap();

        fx.content.evict(&created.file_ref);

        let result = fx.service.download(&actor, created.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::Admin);
        let err = assert_err!(fx.service.get(&actor, Uuid::now_v7()).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_storage_stats_and_filter_options() {
        let fx = fixture(TagStorage::Normalized);
        let actor = actor_with_role(Role::User);
        seed_a_and_b(&fx, &actor).await;

        let stats = fx.service.storage_stats(&actor).await.unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size_bytes, 20);
        assert_eq!(stats.total_size_formatted, "20B");
        assert_eq!(stats.storage_limit_formatted, "250.0GB");

        let options = fx.service.filter_options(&actor).await.unwrap();
        assert_eq!(options.tags, strings(&["x", "y"]));
        assert_eq!(options.categories, strings(&["Docs", "Photos"]));
        assert_eq!(options.date_range.earliest, Some(at(2024, 1, 1)));
        assert_eq!(options.date_range.latest, Some(at(2024, 2, 1)));
        assert_eq!(options.total_assets, 2);
    }

    #[tokio::test]
    async fn test_owner_restriction_narrows_stats_and_facets() {
        let config = CatalogConfig {
            restrict_listing_to_owner: true,
            ..CatalogConfig::default()
        };
        let fx = fixture_with(config, Vec::new());
        let alice = actor_with_role(Role::User);
        let bob = actor_with_role(Role::User);
        let admin = actor_with_role(Role::Admin);
        seed_a_and_b(&fx, &alice).await;

        let metadata = AssetMetadata {
            tags: strings(&["z"]),
            ..AssetMetadata::default()
        };
        fx.service
            .create(Some(bob.clone()), upload("b.txt", b"bob"), metadata)
            .await
            .unwrap();

        let options = fx.service.filter_options(&bob).await.unwrap();
        assert_eq!(options.tags, strings(&["z"]));
        assert_eq!(options.total_assets, 1);
        assert_eq!(options.categories, strings(&["Docs", "Photos"]));

        let stats = fx.service.storage_stats(&bob).await.unwrap();
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.total_size_bytes, 3);

        let options = fx.service.filter_options(&admin).await.unwrap();
        assert_eq!(options.tags, strings(&["x", "y", "z"]));
        assert_eq!(options.total_assets, 3);

        let stats = fx.service.storage_stats(&admin).await.unwrap();
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size_bytes, 23);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(1023), "1023B");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0MB");
        assert_eq!(format_size(250 * 1024 * 1024 * 1024), "250.0GB");
    }

    #[test]
    fn test_content_type_and_extension_resolution() {
        assert_eq!(resolve_content_type(None, "doc.pdf"), "application/pdf");
        assert_eq!(
            resolve_content_type(Some("application/octet-stream"), "pic.jpg"),
            "image/jpeg"
        );
        assert_eq!(resolve_content_type(Some("video/mp4"), "clip"), "video/mp4");
        assert_eq!(resolve_content_type(None, "noext"), OCTET_STREAM);

        assert_eq!(resolve_extension("Photo.JPG", "image/jpeg"), "jpg");
        assert_eq!(resolve_extension("noext", "application/pdf"), "pdf");
    }
}
