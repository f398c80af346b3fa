//! Request DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use libris_core::types::PageRequest;
use libris_entity::reservation::ReservationStatus;
use libris_entity::user::UserRole;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Query parameters for the book listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookListQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page.
    pub per_page: Option<u64>,
    /// Title/author substring filter.
    pub search: Option<String>,
}

impl BookListQuery {
    /// Converts the query into a clamped page request.
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.page_size),
        )
    }
}

/// Query parameters for the reservation listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationListQuery {
    /// Restrict to one user.
    pub user_id: Option<Uuid>,
    /// Restrict to one book.
    pub book_id: Option<Uuid>,
    /// Restrict to one status.
    pub status: Option<ReservationStatus>,
}

/// Body for returning a book. Admins may name another user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnRequest {
    /// The user whose reservation to settle; defaults to the caller.
    pub user_id: Option<Uuid>,
}

/// Body for overwriting a reservation's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideStatusRequest {
    /// The status to apply.
    pub status: ReservationStatus,
}

/// Body for changing a user's role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    /// The role to assign.
    pub role: UserRole,
}
