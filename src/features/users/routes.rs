use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", get(handlers::get_me))
        .with_state(service)
}

/// Account administration, nested under `/api/admin`
pub fn admin_routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/{id}/role", post(handlers::change_role))
        .route("/users/{id}/activate", post(handlers::activate_user))
        .route("/users/{id}/deactivate", post(handlers::deactivate_user))
        .with_state(service)
}
