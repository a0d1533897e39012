use std::sync::Arc;

use tracing::debug;

use super::model::Actor;
use super::validator::JwtValidator;
use crate::core::error::{AppError, Result};
use crate::features::users::repository::UserRepository;

/// Turns a bearer token into an [`Actor`] backed by a stored user
pub struct IdentityResolver {
    validator: JwtValidator,
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(validator: JwtValidator, users: Arc<dyn UserRepository>) -> Self {
        Self { validator, users }
    }

    pub async fn resolve(&self, token: &str) -> Result<Actor> {
        let user_id = self.validator.validate_token(token)?;

        let user = self.users.get(user_id).await?.ok_or_else(|| {
            debug!("Token subject {} has no account", user_id);
            AppError::Unauthorized("Unknown user".to_string())
        })?;

        Ok(Actor::authenticated(user))
    }
}
