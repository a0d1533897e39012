//! Role-based access rules for assets, accounts and taxonomy.
//!
//! [`AccessPolicy::can`] is a pure decision function; services call
//! [`AccessPolicy::authorize`] before reading or mutating anything.

use crate::core::error::{AppError, Result};
use crate::features::assets::models::Asset;
use crate::features::auth::model::Actor;
use crate::features::users::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Download,
    ChangeRole,
    Deactivate,
    Activate,
    /// Create or delete categories and tags
    ManageTaxonomy,
    /// List and provision accounts
    ManageUsers,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Download => "download",
            Action::ChangeRole => "change the role of",
            Action::Deactivate => "deactivate",
            Action::Activate => "activate",
            Action::ManageTaxonomy | Action::ManageUsers => "manage",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    None,
    Asset(&'a Asset),
    User {
        user: &'a User,
        new_role: Option<Role>,
    },
}

impl Target<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Target::None => "this resource",
            Target::Asset(_) => "this asset",
            Target::User { .. } => "this user",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    /// Non-admins only see and download their own uploads
    pub restrict_listing_to_owner: bool,
    /// The fallback system uploader may create assets
    pub allow_anonymous_uploads: bool,
}

impl AccessPolicy {
    pub fn new(restrict_listing_to_owner: bool, allow_anonymous_uploads: bool) -> Self {
        Self {
            restrict_listing_to_owner,
            allow_anonymous_uploads,
        }
    }

    pub fn can(&self, actor: Option<&Actor>, action: Action, target: Target<'_>) -> bool {
        let Some(actor) = actor else {
            return false;
        };

        if !actor.is_active() {
            return false;
        }

        if actor.is_fallback() {
            return action == Action::Create && self.allow_anonymous_uploads;
        }

        let is_admin = actor.is_admin();
        let user_id = actor.user.id;

        match (action, target) {
            (Action::Create, _) => true,

            (Action::Read, Target::None) => true,
            (Action::Read, Target::Asset(asset)) => {
                if asset.is_deleted {
                    is_admin || asset.is_uploaded_by(user_id)
                } else {
                    self.owner_visible(is_admin, asset, actor)
                }
            }

            (Action::Download, Target::Asset(asset)) => {
                if asset.is_deleted {
                    is_admin
                } else {
                    self.owner_visible(is_admin, asset, actor)
                }
            }

            (Action::Update | Action::Delete, Target::Asset(asset)) => {
                asset.is_uploaded_by(user_id) || actor.role().is_staff()
            }

            (Action::ChangeRole, Target::User { user, new_role }) => {
                if !is_admin || user.is_superuser {
                    return false;
                }
                // An admin may not strip their own admin role
                user.id != user_id || new_role == Some(Role::Admin)
            }

            (Action::Deactivate, Target::User { user, .. }) => is_admin && user.id != user_id,

            (Action::Activate, Target::User { .. }) => is_admin,

            (Action::ManageTaxonomy, _) => actor.role().is_staff(),

            (Action::ManageUsers, _) => is_admin,

            _ => false,
        }
    }

    fn owner_visible(&self, is_admin: bool, asset: &Asset, actor: &Actor) -> bool {
        !self.restrict_listing_to_owner || is_admin || asset.is_uploaded_by(actor.user.id)
    }

    /// Like [`can`](Self::can), but turns a denial into an error.
    ///
    /// Anonymous callers get `Unauthorized`, identified ones `Forbidden`.
    pub fn authorize(&self, actor: Option<&Actor>, action: Action, target: Target<'_>) -> Result<()> {
        if self.can(actor, action, target) {
            return Ok(());
        }

        match actor {
            None => Err(AppError::Unauthorized("Authentication required".to_string())),
            Some(actor) if !actor.is_active() => {
                Err(AppError::Forbidden("Account is deactivated".to_string()))
            }
            Some(_) => Err(AppError::Forbidden(format!(
                "You do not have permission to {} {}",
                action,
                target.describe()
            ))),
        }
    }

    /// Whether listings for `actor` must be narrowed to their own uploads
    pub fn restricts_listing(&self, actor: &Actor) -> bool {
        self.restrict_listing_to_owner && !actor.is_admin()
    }
}
