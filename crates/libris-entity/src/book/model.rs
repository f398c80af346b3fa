//! Book entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A book in the catalog.
///
/// Invariant: `0 <= available_copies <= total_copies`, and
/// `available_copies == total_copies - count(active reservations)`.
/// The stores enforce this atomically; nothing outside them mutates
/// copy counts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    /// Unique book identifier.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Unique ISBN.
    pub isbn: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Total copies owned by the library.
    pub total_copies: i32,
    /// Copies currently available for reservation.
    pub available_copies: i32,
    /// When the book record was created.
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Check whether at least one copy is available.
    pub fn has_available_copy(&self) -> bool {
        self.available_copies > 0
    }

    /// Number of copies currently out on active reservations.
    pub fn copies_on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Data required to create a new book. `available_copies` starts at
/// `total_copies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Unique ISBN.
    pub isbn: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Total copies owned.
    pub total_copies: i32,
}

/// Data for updating an existing book.
///
/// A change to `total_copies` adjusts `available_copies` by the same
/// delta; the store rejects the update if that would drive the
/// available count negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdate {
    /// New title.
    pub title: String,
    /// New author.
    pub author: String,
    /// New ISBN.
    pub isbn: String,
    /// New description.
    pub description: Option<String>,
    /// New total copy count.
    pub total_copies: i32,
}
