use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::Actor;
use crate::features::auth::policy::{AccessPolicy, Action, Target};
use crate::features::tags::dtos::{CreateTagDto, TagResponseDto};
use crate::features::tags::repository::TagRepository;

pub struct TagService {
    tags: Arc<dyn TagRepository>,
    policy: AccessPolicy,
}

impl TagService {
    pub fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self {
            tags,
            policy: AccessPolicy::default(),
        }
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<TagResponseDto>> {
        self.policy
            .authorize(Some(actor), Action::Read, Target::None)?;

        let tags = self.tags.list().await?;
        Ok(tags.into_iter().map(|t| t.into()).collect())
    }

    pub async fn create(&self, actor: &Actor, dto: CreateTagDto) -> Result<TagResponseDto> {
        self.policy
            .authorize(Some(actor), Action::ManageTaxonomy, Target::None)?;
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let tag = self.tags.insert(dto.name.trim()).await?;
        info!("Tag created: id={}, name={}", tag.id, tag.name);

        Ok(tag.into())
    }

    /// Remove a tag and its memberships. Assets are never deleted.
    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<()> {
        self.policy
            .authorize(Some(actor), Action::ManageTaxonomy, Target::None)?;

        if !self.tags.delete(id).await? {
            return Err(AppError::NotFound(format!("Tag {} not found", id)));
        }

        info!("Tag deleted: id={}, by={}", id, actor.user.username);
        Ok(())
    }
}
