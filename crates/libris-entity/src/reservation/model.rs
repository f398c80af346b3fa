//! Reservation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::ReservationStatus;

/// A reservation of one copy of a book by one user.
///
/// At most one `Active` reservation may exist per (user, book) pair;
/// the stores enforce this with a uniqueness guarantee rather than an
/// application-level pre-check. Reservations are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: Uuid,
    /// The reserving user.
    pub user_id: Uuid,
    /// The reserved book.
    pub book_id: Uuid,
    /// Current lifecycle status.
    pub status: ReservationStatus,
    /// When the reservation was created.
    pub reserved_at: DateTime<Utc>,
    /// When the book is due back.
    pub due_date: DateTime<Utc>,
    /// When the book was returned (set only on return).
    pub returned_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Whether this reservation currently holds a copy.
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Whether the due date has passed without a return.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.due_date
    }
}

/// Filter for reservation listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilter {
    /// Restrict to a single user.
    pub user_id: Option<Uuid>,
    /// Restrict to a single book.
    pub book_id: Option<Uuid>,
    /// Restrict to a single status.
    pub status: Option<ReservationStatus>,
}

impl ReservationFilter {
    /// Filter for one user's own reservations.
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Check whether a reservation matches this filter.
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.user_id.is_none_or(|u| reservation.user_id == u)
            && self.book_id.is_none_or(|b| reservation.book_id == b)
            && self.status.is_none_or(|s| reservation.status == s)
    }
}
