//! Store contracts consumed by the service layer.
//!
//! Two backends implement these traits: a PostgreSQL store (transactions,
//! row locks, and a partial unique index provide the atomicity
//! guarantees) and an in-memory store (a single tokio mutex serializes
//! every operation), mirroring each other's observable behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use libris_core::AppResult;
use libris_core::types::{PageRequest, PageResponse};

use crate::book::{Book, BookUpdate, NewBook};
use crate::reservation::{Reservation, ReservationFilter, ReservationStatus};
use crate::user::{NewUser, User, UserRole};

/// Result of an administrative status override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOverride {
    /// The reservation after the overwrite.
    pub reservation: Reservation,
    /// The status it held before the overwrite.
    pub previous_status: ReservationStatus,
    /// Whether a copy was credited back to the book's available pool.
    pub copy_credited: bool,
}

/// Store for user records and role assignments.
#[async_trait]
pub trait IdentityStore: std::fmt::Debug + Send + Sync + 'static {
    /// Fetch a user by primary key.
    async fn fetch_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new user. A duplicate email or username fails with
    /// `Conflict`; the store's uniqueness enforcement is authoritative.
    async fn insert_user(&self, user: &NewUser) -> AppResult<User>;

    /// Change a user's role. Fails with `NotFound` for an unknown user.
    async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;
}

/// Store for the book inventory and reservation ledger.
///
/// Every mutating method is atomic with respect to concurrent callers:
/// two concurrent [`create_reservation`](LendingStore::create_reservation)
/// calls against the last remaining copy must serialize so that exactly
/// one succeeds. Transient storage races (deadlock, serialization
/// failure) surface as `Conflict` carrying their source error; callers
/// decide whether to retry.
#[async_trait]
pub trait LendingStore: std::fmt::Debug + Send + Sync + 'static {
    // ── Catalog ──────────────────────────────────────────────

    /// Fetch a book by primary key.
    async fn fetch_book(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// List books, optionally filtered by a title/author substring.
    async fn list_books(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Book>>;

    /// Insert a new book with `available_copies = total_copies`.
    /// A duplicate ISBN fails with `Conflict`.
    async fn insert_book(&self, book: &NewBook) -> AppResult<Book>;

    /// Update a book's details. A `total_copies` delta adjusts
    /// `available_copies` by the same amount in the same atomic step;
    /// the update fails with `InvalidCapacityChange` if that would
    /// drive the available count negative.
    async fn update_book(&self, id: Uuid, update: &BookUpdate) -> AppResult<Book>;

    /// Delete a book. Fails with `HasActiveReservations` while any
    /// active reservation references it.
    async fn delete_book(&self, id: Uuid) -> AppResult<()>;

    // ── Reservations ─────────────────────────────────────────

    /// Atomically claim one available copy and create an `Active`
    /// reservation. Failure modes: `NotFound` (unknown book),
    /// `NoCopiesAvailable` (`available_copies == 0`), and
    /// `DuplicateReservation` (the caller already holds an active
    /// reservation for this book, enforced by a uniqueness constraint,
    /// not a pre-check).
    async fn create_reservation(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        due_date: DateTime<Utc>,
    ) -> AppResult<Reservation>;

    /// Atomically settle the (user, book) active reservation into a
    /// terminal status and credit the copy back (capped at
    /// `total_copies`). Returns `None` when no active reservation
    /// exists, which makes a second settle observably fail without a
    /// double credit.
    async fn settle_reservation(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        status: ReservationStatus,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>>;

    /// Administrative status overwrite. Applies the copy-credit rule
    /// from [`ReservationStatus::credits_copy_on_override`] against the
    /// reservation's live status inside the same atomic step. Fails
    /// with `NotFound` for an unknown reservation.
    async fn override_status(
        &self,
        reservation_id: Uuid,
        new_status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<StatusOverride>;

    /// Fetch a reservation by primary key.
    async fn fetch_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>>;

    /// List reservations matching a filter, newest first.
    async fn list_reservations(&self, filter: &ReservationFilter) -> AppResult<Vec<Reservation>>;

    /// Count active reservations referencing a book.
    async fn count_active_for_book(&self, book_id: Uuid) -> AppResult<i64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
