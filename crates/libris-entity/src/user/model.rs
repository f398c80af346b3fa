//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered user of the lending service.
///
/// Users are never hard-deleted; deactivation flips `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique email address.
    pub email: String,
    /// Unique login name.
    pub username: String,
    /// Full display name.
    pub full_name: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role (RBAC).
    pub role: UserRole,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Opaque external identity-provider linkage, if any.
    pub external_id: Option<String>,
    /// Whether two-factor auth is flagged on (flag only; no 2FA flow here).
    pub two_factor_enabled: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check if the user can authenticate right now.
    pub fn can_login(&self) -> bool {
        self.is_active
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Desired username.
    pub username: String,
    /// Full display name.
    pub full_name: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
}
