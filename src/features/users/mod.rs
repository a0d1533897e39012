//! User accounts and their administration.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Current identity |
//! | GET | `/api/admin/users` | List users (admin) |
//! | POST | `/api/admin/users` | Provision a user (admin) |
//! | POST | `/api/admin/users/{id}/role` | Change role, accepts legacy group names |
//! | POST | `/api/admin/users/{id}/activate` | Reactivate an account |
//! | POST | `/api/admin/users/{id}/deactivate` | Deactivate an account |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use repository::{InMemoryUserRepository, PgUserRepository, UserRepository};
pub use services::UserService;
