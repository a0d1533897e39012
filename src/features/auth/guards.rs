//! Role-based authorization guards for the application.
//!
//! Guards reject requests before the handler body runs. The decision itself
//! is always made by the access policy.

use crate::core::error::AppError;
use crate::features::auth::model::Actor;
use crate::features::auth::policy::{AccessPolicy, Action, Target};
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for account administration endpoints.
///
/// Admits actors the policy lets manage users. Superusers count as admins.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(actor): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub Actor);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .extensions
            .get::<Actor>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        AccessPolicy::default().authorize(Some(actor), Action::ManageUsers, Target::None)?;

        Ok(RequireAdmin(actor.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::Role;
    use crate::shared::test_helpers::actor_with_role;
    use axum::http::Request;

    async fn guard(actor: Option<Actor>) -> Result<RequireAdmin, AppError> {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(actor) = actor {
            parts.extensions.insert(actor);
        }
        RequireAdmin::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_require_admin_follows_policy() {
        assert!(guard(Some(actor_with_role(Role::Admin))).await.is_ok());
        assert!(matches!(
            guard(Some(actor_with_role(Role::Editor))).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(guard(None).await, Err(AppError::Unauthorized(_))));

        let mut retired = actor_with_role(Role::Admin);
        retired.user.is_active = false;
        assert!(matches!(
            guard(Some(retired)).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
