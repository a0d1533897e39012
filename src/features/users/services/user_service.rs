use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::config::BootstrapAdmin;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::Actor;
use crate::features::auth::policy::{AccessPolicy, Action, Target};
use crate::features::users::dtos::{CreateUserDto, UserResponseDto};
use crate::features::users::models::{NewUser, Role, User};
use crate::features::users::repository::UserRepository;
use crate::shared::types::{Page, PaginationQuery};

/// Account administration
pub struct UserService {
    users: Arc<dyn UserRepository>,
    policy: AccessPolicy,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            policy: AccessPolicy::default(),
        }
    }

    /// Provision the configured bootstrap admin unless it already exists
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<UserResponseDto> {
        let user = self
            .users
            .ensure(User {
                id: admin.id,
                email: admin.email.trim().to_lowercase(),
                username: admin.username.clone(),
                role: Role::Admin,
                is_active: true,
                is_superuser: true,
                date_joined: Utc::now(),
            })
            .await?;

        if !user.is_active || !user.is_admin() {
            warn!(
                "Bootstrap admin {} exists but is no longer an active admin",
                user.username
            );
        }

        info!("Bootstrap admin ready: id={}, username={}", user.id, user.username);
        Ok(user.into())
    }

    async fn load(&self, id: Uuid) -> Result<User> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub fn me(&self, actor: &Actor) -> UserResponseDto {
        actor.user.clone().into()
    }

    pub async fn list_users(
        &self,
        actor: &Actor,
        page: &PaginationQuery,
    ) -> Result<Page<UserResponseDto>> {
        self.policy
            .authorize(Some(actor), Action::ManageUsers, Target::None)?;
        Ok(self.users.list(page).await?.map(UserResponseDto::from))
    }

    pub async fn create_user(&self, actor: &Actor, dto: CreateUserDto) -> Result<UserResponseDto> {
        self.policy
            .authorize(Some(actor), Action::ManageUsers, Target::None)?;
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let user = self
            .users
            .insert(NewUser {
                email: dto.email.trim().to_lowercase(),
                username: dto.username,
                role: dto.role.unwrap_or_default(),
                is_superuser: false,
            })
            .await?;

        info!(
            "User provisioned: id={}, username={}, role={}, by={}",
            user.id, user.username, user.role, actor.user.username
        );

        Ok(user.into())
    }

    /// Change a user's role. Accepts role names and legacy group names.
    pub async fn set_role(&self, actor: &Actor, id: Uuid, role: &str) -> Result<UserResponseDto> {
        let new_role = Role::from_group_name(role)
            .ok_or_else(|| AppError::Validation(format!("Unknown role '{}'", role.trim())))?;

        let target = self.load(id).await?;
        self.policy.authorize(
            Some(actor),
            Action::ChangeRole,
            Target::User {
                user: &target,
                new_role: Some(new_role),
            },
        )?;

        let updated = self
            .users
            .set_role(id, new_role)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        info!(
            "Role changed: user={}, role={}, by={}",
            updated.username, new_role, actor.user.username
        );

        Ok(updated.into())
    }

    pub async fn activate(&self, actor: &Actor, id: Uuid) -> Result<UserResponseDto> {
        self.set_active(actor, id, true).await
    }

    pub async fn deactivate(&self, actor: &Actor, id: Uuid) -> Result<UserResponseDto> {
        self.set_active(actor, id, false).await
    }

    async fn set_active(&self, actor: &Actor, id: Uuid, is_active: bool) -> Result<UserResponseDto> {
        let target = self.load(id).await?;
        let action = if is_active {
            Action::Activate
        } else {
            Action::Deactivate
        };
        self.policy.authorize(
            Some(actor),
            action,
            Target::User {
                user: &target,
                new_role: None,
            },
        )?;

        let updated = self
            .users
            .set_active(id, is_active)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        info!(
            "User {}: {} by {}",
            if is_active { "activated" } else { "deactivated" },
            updated.username,
            actor.user.username
        );

        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::repository::InMemoryUserRepository;
    use crate::shared::test_helpers::make_user;

    fn service_with(users: Vec<User>) -> UserService {
        UserService::new(Arc::new(InMemoryUserRepository::with_users(users)))
    }

    fn create_dto(username: &str, email: &str) -> CreateUserDto {
        CreateUserDto {
            email: email.to_string(),
            username: username.to_string(),
            role: Some(Role::Editor),
        }
    }

    #[tokio::test]
    async fn test_admin_provisions_users_and_duplicates_conflict() {
        let admin = make_user(Role::Admin);
        let service = service_with(vec![admin.clone()]);
        let actor = Actor::authenticated(admin);

        let created = service
            .create_user(&actor, create_dto("jane_doe", "Jane@Example.com"))
            .await
            .unwrap();
        assert_eq!(created.role, Role::Editor);
        assert_eq!(created.email, "jane@example.com");

        let duplicate = service
            .create_user(&actor, create_dto("jane_doe", "other@example.com"))
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let bad_name = service
            .create_user(&actor, create_dto("9lives", "cat@example.com"))
            .await;
        assert!(matches!(bad_name, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_list_or_provision() {
        let editor = make_user(Role::Editor);
        let service = service_with(vec![editor.clone()]);
        let actor = Actor::authenticated(editor);

        assert!(matches!(
            service.list_users(&actor, &PaginationQuery::default()).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .create_user(&actor, create_dto("new_user", "new@example.com"))
                .await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_set_role_accepts_legacy_group_names() {
        let admin = make_user(Role::Admin);
        let viewer = make_user(Role::Viewer);
        let service = service_with(vec![admin.clone(), viewer.clone()]);
        let actor = Actor::authenticated(admin);

        let updated = service.set_role(&actor, viewer.id, "Editors").await.unwrap();
        assert_eq!(updated.role, Role::Editor);

        let unknown = service.set_role(&actor, viewer.id, "owners").await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        let missing = service.set_role(&actor, Uuid::now_v7(), "viewer").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_or_deactivate_self() {
        let admin = make_user(Role::Admin);
        let service = service_with(vec![admin.clone()]);
        let actor = Actor::authenticated(admin.clone());

        let demote = service.set_role(&actor, admin.id, "viewer").await;
        assert!(matches!(demote, Err(AppError::Forbidden(_))));

        let deactivate = service.deactivate(&actor, admin.id).await;
        assert!(matches!(deactivate, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_superuser_role_is_immutable() {
        let admin = make_user(Role::Admin);
        let mut root = make_user(Role::User);
        root.is_superuser = true;
        let service = service_with(vec![admin.clone(), root.clone()]);

        let result = service
            .set_role(&Actor::authenticated(admin), root.id, "viewer")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_deactivate_then_activate() {
        let admin = make_user(Role::Admin);
        let user = make_user(Role::User);
        let service = service_with(vec![admin.clone(), user.clone()]);
        let actor = Actor::authenticated(admin);

        let off = service.deactivate(&actor, user.id).await.unwrap();
        assert!(!off.is_active);

        let on = service.activate(&actor, user.id).await.unwrap();
        assert!(on.is_active);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_can_administer_from_empty_store() {
        let service = service_with(Vec::new());
        let bootstrap = BootstrapAdmin {
            id: Uuid::now_v7(),
            username: "admin".to_string(),
            email: "Admin@Localhost".to_string(),
        };

        let first = service.ensure_bootstrap_admin(&bootstrap).await.unwrap();
        let second = service.ensure_bootstrap_admin(&bootstrap).await.unwrap();
        assert_eq!(first.id, bootstrap.id);
        assert_eq!(second.id, bootstrap.id);
        assert_eq!(first.effective_role, Role::Admin);
        assert_eq!(first.email, "admin@localhost");

        let admin = service.users.get(bootstrap.id).await.unwrap().unwrap();
        let actor = Actor::authenticated(admin);
        service
            .create_user(&actor, create_dto("first_editor", "editor@example.com"))
            .await
            .unwrap();
        let page = service
            .list_users(&actor, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_me_reports_effective_role() {
        let mut root = make_user(Role::Viewer);
        root.is_superuser = true;
        let service = service_with(Vec::new());

        let me = service.me(&Actor::authenticated(root));
        assert_eq!(me.role, Role::Viewer);
        assert_eq!(me.effective_role, Role::Admin);
    }
}
