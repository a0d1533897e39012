use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::{Role, User};

/// Response DTO for a user account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Stored role
    pub role: Role,
    /// Role used for authorization; superusers are always admin
    pub effective_role: Role,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        Self {
            effective_role: u.effective_role(),
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
            is_active: u.is_active,
            is_superuser: u.is_superuser,
            date_joined: u.date_joined,
        }
    }
}

/// Request DTO for provisioning a user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,

    #[validate(
        length(min = 3, max = 150, message = "Username must be 3-150 characters"),
        regex(
            path = "*crate::shared::validation::USERNAME_REGEX",
            message = "Username must start with letter or underscore and contain only alphanumeric characters and underscores"
        )
    )]
    #[schema(example = "jane_doe")]
    pub username: String,

    /// Defaults to `user`
    pub role: Option<Role>,
}

/// Request DTO for changing a user's role
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangeRoleDto {
    /// Role name or legacy group name such as `Editors`
    #[validate(length(min = 1, message = "role is required"))]
    #[schema(example = "editor")]
    pub role: String,
}
