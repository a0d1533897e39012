#[cfg(test)]
use crate::features::auth::model::Actor;
#[cfg(test)]
use crate::features::users::models::{Role, User};

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};
#[cfg(test)]
use chrono::Utc;
#[cfg(test)]
use fake::{
    faker::internet::en::{SafeEmail, Username},
    Fake,
};
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
pub fn make_user(role: Role) -> User {
    let username: String = Username().fake();
    User {
        id: Uuid::now_v7(),
        email: SafeEmail().fake(),
        username: format!("{}_{}", username.replace('.', "_"), &Uuid::now_v7().simple().to_string()[24..]),
        role,
        is_active: true,
        is_superuser: false,
        date_joined: Utc::now(),
    }
}

#[cfg(test)]
pub fn actor_with_role(role: Role) -> Actor {
    Actor::authenticated(make_user(role))
}

#[cfg(test)]
pub fn fallback_actor() -> Actor {
    let mut user = make_user(Role::User);
    user.username = "system".to_string();
    Actor::fallback(user)
}

/// Attach `actor` to every request, standing in for the bearer token middleware
#[cfg(test)]
pub fn with_actor(router: Router, actor: Actor) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let actor = actor.clone();
            async move {
                request.extensions_mut().insert(actor);
                let response: Response = next.run(request).await;
                response
            }
        },
    ))
}
