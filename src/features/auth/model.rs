use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::users::models::{Role, User};

/// How the actor of a request was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorOrigin {
    /// Identified by a validated bearer token
    Authenticated,
    /// The configured system uploader, standing in for an anonymous upload
    Fallback,
}

/// The identity performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: User,
    pub origin: ActorOrigin,
}

impl Actor {
    pub fn authenticated(user: User) -> Self {
        Self {
            user,
            origin: ActorOrigin::Authenticated,
        }
    }

    pub fn fallback(user: User) -> Self {
        Self {
            user,
            origin: ActorOrigin::Fallback,
        }
    }

    pub fn role(&self) -> Role {
        self.user.effective_role()
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    pub fn is_active(&self) -> bool {
        self.user.is_active
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == ActorOrigin::Fallback
    }
}

/// An actor that may be absent, for endpoints that accept anonymous calls
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Actor>);

/// Claims carried by access tokens from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}
