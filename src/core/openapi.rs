use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::assets::{dtos as assets_dtos, handlers as assets_handlers, models as assets_models};
use crate::features::categories::{
    dtos as categories_dtos, handlers as categories_handlers, models as categories_models,
};
use crate::features::tags::{dtos as tags_dtos, handlers as tags_handlers};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Assets
        assets_handlers::upload_asset,
        assets_handlers::list_assets,
        assets_handlers::search_assets,
        assets_handlers::quick_search,
        assets_handlers::filter_options,
        assets_handlers::storage_stats,
        assets_handlers::get_asset,
        assets_handlers::update_asset,
        assets_handlers::delete_asset,
        assets_handlers::download_asset,
        assets_handlers::preview_asset,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::create_category,
        categories_handlers::delete_category,
        // Tags
        tags_handlers::list_tags,
        tags_handlers::create_tag,
        tags_handlers::delete_tag,
        // Users
        users_handlers::get_me,
        // Admin
        users_handlers::list_users,
        users_handlers::create_user,
        users_handlers::change_role,
        users_handlers::activate_user,
        users_handlers::deactivate_user,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Assets
            assets_models::AssetType,
            assets_dtos::AssetResponseDto,
            assets_dtos::UploadAssetDto,
            assets_dtos::UpdateAssetDto,
            assets_dtos::QuickSearchResponseDto,
            assets_dtos::StorageStatsDto,
            assets_dtos::AssetTypeOptionDto,
            assets_dtos::DateRangeDto,
            assets_dtos::FilterOptionsDto,
            ApiResponse<assets_dtos::AssetResponseDto>,
            ApiResponse<Vec<assets_dtos::AssetResponseDto>>,
            ApiResponse<assets_dtos::QuickSearchResponseDto>,
            ApiResponse<assets_dtos::StorageStatsDto>,
            ApiResponse<assets_dtos::FilterOptionsDto>,
            // Categories
            categories_models::CategoryRef,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CreateCategoryDto,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            // Tags
            tags_dtos::TagResponseDto,
            tags_dtos::CreateTagDto,
            ApiResponse<Vec<tags_dtos::TagResponseDto>>,
            ApiResponse<tags_dtos::TagResponseDto>,
            // Users
            users_models::Role,
            users_models::UserRef,
            users_dtos::UserResponseDto,
            users_dtos::CreateUserDto,
            users_dtos::ChangeRoleDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
        )
    ),
    tags(
        (name = "assets", description = "Asset upload, search and retrieval"),
        (name = "categories", description = "Asset categories"),
        (name = "tags", description = "Asset tags"),
        (name = "users", description = "Current user"),
        (name = "admin", description = "User administration (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Asset Catalog API",
        version = "0.1.0",
        description = "API documentation for the asset catalog",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
