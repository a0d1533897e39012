mod identity;
mod validator;

pub mod guards;
pub mod model;
pub mod policy;

pub use identity::IdentityResolver;
pub use model::{Actor, ActorOrigin, MaybeActor};
pub use policy::{AccessPolicy, Action, Target};
pub use validator::JwtValidator;
