use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::Actor;
use crate::features::auth::policy::{AccessPolicy, Action, Target};
use crate::features::categories::dtos::{CategoryResponseDto, CreateCategoryDto};
use crate::features::categories::repository::CategoryRepository;

/// Service for category operations
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    policy: AccessPolicy,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self {
            categories,
            policy: AccessPolicy::default(),
        }
    }

    /// All categories ordered by name
    pub async fn list(&self, actor: &Actor) -> Result<Vec<CategoryResponseDto>> {
        self.policy
            .authorize(Some(actor), Action::Read, Target::None)?;

        let categories = self.categories.list().await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    pub async fn create(&self, actor: &Actor, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        self.policy
            .authorize(Some(actor), Action::ManageTaxonomy, Target::None)?;
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let category = self.categories.insert(dto.name.trim()).await?;
        info!("Category created: id={}, name={}", category.id, category.name);

        Ok(category.into())
    }

    /// Delete a category. Assets in it become uncategorized.
    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<()> {
        self.policy
            .authorize(Some(actor), Action::ManageTaxonomy, Target::None)?;

        if !self.categories.delete(id).await? {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        info!("Category deleted: id={}, by={}", id, actor.user.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assets::repository::InMemoryCatalog;
    use crate::features::assets::TagStorage;
    use crate::features::users::models::Role;
    use crate::shared::test_helpers::actor_with_role;

    fn service() -> CategoryService {
        CategoryService::new(Arc::new(InMemoryCatalog::new(TagStorage::Normalized)))
    }

    fn dto(name: &str) -> CreateCategoryDto {
        CreateCategoryDto {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_editor_manages_categories() {
        let service = service();
        let editor = actor_with_role(Role::Editor);

        let docs = service.create(&editor, dto(" Docs ")).await.unwrap();
        assert_eq!(docs.name, "Docs");
        service.create(&editor, dto("Audio")).await.unwrap();

        let names: Vec<String> = service
            .list(&editor)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Audio", "Docs"]);

        assert!(matches!(
            service.create(&editor, dto("Docs")).await,
            Err(AppError::Conflict(_))
        ));

        service.delete(&editor, docs.id).await.unwrap();
        assert!(matches!(
            service.delete(&editor, docs.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_viewer_can_list_but_not_manage() {
        let service = service();
        let viewer = actor_with_role(Role::Viewer);

        assert!(service.list(&viewer).await.unwrap().is_empty());
        assert!(matches!(
            service.create(&viewer, dto("Photos")).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_names_are_validated() {
        let service = service();
        let admin = actor_with_role(Role::Admin);

        for bad in ["", "   ", "a,b", "42"] {
            assert!(matches!(
                service.create(&admin, dto(bad)).await,
                Err(AppError::Validation(_))
            ));
        }
    }
}
