use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::UserRepository;
use crate::core::error::{AppError, Result};
use crate::features::users::models::{NewUser, Role, User};
use crate::shared::types::{Page, PaginationQuery};

fn poison_err<T>(_: PoisonError<T>) -> AppError {
    AppError::Internal("user store lock poisoned".to_string())
}

/// In-memory user store for tests and the `memory` catalog backend
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fully-formed user, bypassing uniqueness checks
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    fn update<F>(&self, id: Uuid, f: F) -> Result<Option<User>>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().map_err(poison_err)?;
        Ok(users.get_mut(&id).map(|user| {
            f(user);
            user.clone()
        }))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().map_err(poison_err)?.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .map_err(poison_err)?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self, page: &PaginationQuery) -> Result<Page<User>> {
        let users = self.users.read().map_err(poison_err)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.date_joined.cmp(&a.date_joined).then(b.id.cmp(&a.id)));

        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(Page::new(items, total))
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().map_err(poison_err)?;

        if users.values().any(|u| {
            u.username == user.username || u.email.eq_ignore_ascii_case(&user.email)
        }) {
            return Err(AppError::Conflict(
                "A user with this email or username already exists".to_string(),
            ));
        }

        let created = User {
            id: Uuid::now_v7(),
            email: user.email,
            username: user.username,
            role: user.role,
            is_active: true,
            is_superuser: user.is_superuser,
            date_joined: Utc::now(),
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn ensure(&self, user: User) -> Result<User> {
        let mut users = self.users.write().map_err(poison_err)?;

        if let Some(existing) = users.get(&user.id) {
            return Ok(existing.clone());
        }
        if users.values().any(|u| {
            u.username == user.username || u.email.eq_ignore_ascii_case(&user.email)
        }) {
            return Err(AppError::Conflict(
                "A user with this email or username already exists".to_string(),
            ));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        self.update(id, |user| user.role = role)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>> {
        self.update(id, |user| user.is_active = is_active)
    }
}
