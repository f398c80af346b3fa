//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use libris_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Built from verified JWT claims by the HTTP layer and passed into
/// service methods so that every operation knows who is acting and
/// with which role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The username (convenience field from the claims).
    pub username: String,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context stamped with the current time.
    pub fn new(user_id: Uuid, username: String, role: UserRole) -> Self {
        Self {
            user_id,
            username,
            role,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Returns whether the current user is at least a librarian.
    pub fn is_librarian_or_above(&self) -> bool {
        self.role.is_librarian_or_above()
    }
}
