//! Persistence for user accounts.

mod memory;
mod postgres;

pub use memory::InMemoryUserRepository;
pub use postgres::PgUserRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::users::models::{NewUser, Role, User};
use crate::shared::types::{Page, PaginationQuery};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Newest accounts first
    async fn list(&self, page: &PaginationQuery) -> Result<Page<User>>;

    /// Fails with `Conflict` when the email or username is taken
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Store a pre-provisioned account unless its id already exists.
    /// Fails with `Conflict` when another account holds the email or username
    async fn ensure(&self, user: User) -> Result<User>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>>;
}
