use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, manages users and taxonomy
/// - `Editor` - Edits and deletes any asset, manages taxonomy
/// - `Viewer` - Browses and downloads, edits only own uploads
/// - `User` - Default role for self-service accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
    User,
}

impl Role {
    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// Resolve a legacy group name ("Admins", "Editors", ...) into a role.
    ///
    /// Accepts singular or plural spellings in any case, and plain role names.
    pub fn from_group_name(group: &str) -> Option<Role> {
        let normalized = group.trim().to_lowercase();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        Role::from_str(singular)
    }

    /// Admins and editors may touch assets they did not upload
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Editor => write!(f, "editor"),
            Role::Viewer => write!(f, "viewer"),
            Role::User => write!(f, "user"),
        }
    }
}

/// Database model for users
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Role used for authorization. Superusers are always admins.
    pub fn effective_role(&self) -> Role {
        if self.is_superuser {
            Role::Admin
        } else {
            self.role
        }
    }

    pub fn is_admin(&self) -> bool {
        self.effective_role() == Role::Admin
    }

    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Lightweight reference to a user, embedded in assets for provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
}

/// Fields required to provision a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_superuser: bool,
}
