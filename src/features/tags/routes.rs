use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::features::tags::handlers;
use crate::features::tags::services::TagService;

pub fn routes(service: Arc<TagService>) -> Router {
    Router::new()
        .route("/api/tags", get(handlers::list_tags).post(handlers::create_tag))
        .route("/api/tags/{id}", delete(handlers::delete_tag))
        .with_state(service)
}
