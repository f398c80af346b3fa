//! PostgreSQL lending store.
//!
//! Every mutating operation runs in a single transaction. The book row
//! is locked with `SELECT ... FOR UPDATE` before its copy count is
//! adjusted, so concurrent reservations against the same book serialize
//! on the decrement; the partial unique index `uq_reservations_one_active`
//! closes the duplicate-reservation race at the storage layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use libris_core::AppResult;
use libris_core::error::AppError;
use libris_core::types::{PageRequest, PageResponse};
use libris_entity::book::{Book, BookUpdate, NewBook};
use libris_entity::reservation::{Reservation, ReservationFilter, ReservationStatus};
use libris_entity::store::{LendingStore, StatusOverride};

use super::{is_unique_violation, map_db_error};

/// Lending store backed by the `books` and `reservations` tables.
#[derive(Debug, Clone)]
pub struct PostgresLendingStore {
    pool: PgPool,
}

impl PostgresLendingStore {
    /// Create a new lending store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock a book row for the remainder of the transaction.
    async fn lock_book(conn: &mut PgConnection, book_id: Uuid) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(conn)
            .await
            .map_err(|e| map_db_error("Failed to lock book row", e))
    }

    /// Credit one copy back to the book's available pool, capped at
    /// `total_copies`. Must run while the book row is locked.
    async fn credit_copy(conn: &mut PgConnection, book_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE books SET available_copies = LEAST(available_copies + 1, total_copies) \
             WHERE id = $1",
        )
        .bind(book_id)
        .execute(conn)
        .await
        .map_err(|e| map_db_error("Failed to credit copy back", e))?;
        Ok(())
    }
}

#[async_trait]
impl LendingStore for PostgresLendingStore {
    async fn fetch_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to fetch book", e))
    }

    async fn list_books(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Book>> {
        let pattern = search.map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books \
             WHERE $1::TEXT IS NULL OR title ILIKE $1 OR author ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to count books", e))?;

        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books \
             WHERE $1::TEXT IS NULL OR title ILIKE $1 OR author ILIKE $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list books", e))?;

        Ok(PageResponse::new(
            books,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, author, isbn, description, total_copies, available_copies) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING *",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "uq_books_isbn") {
                return AppError::conflict(format!("ISBN '{}' already exists", book.isbn));
            }
            map_db_error("Failed to insert book", e)
        })
    }

    async fn update_book(&self, id: Uuid, update: &BookUpdate) -> AppResult<Book> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let book = Self::lock_book(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found"))?;

        let delta = update.total_copies - book.total_copies;
        if book.available_copies + delta < 0 {
            return Err(AppError::invalid_capacity_change(format!(
                "Reducing total copies to {} would leave {} copies on loan unaccounted for",
                update.total_copies,
                book.copies_on_loan()
            )));
        }

        let updated = sqlx::query_as::<_, Book>(
            "UPDATE books SET title = $2, author = $3, isbn = $4, description = $5, \
             total_copies = $6, available_copies = available_copies + $7 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.isbn)
        .bind(&update.description)
        .bind(update.total_copies)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "uq_books_isbn") {
                return AppError::conflict(format!("ISBN '{}' already exists", update.isbn));
            }
            map_db_error("Failed to update book", e)
        })?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit book update", e))?;

        Ok(updated)
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let book = Self::lock_book(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found"))?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to count active reservations", e))?;

        if active > 0 {
            return Err(AppError::has_active_reservations(format!(
                "Cannot delete '{}': {active} active reservation(s) reference it",
                book.title
            )));
        }

        // Historical (terminal) reservations keep the row referenced;
        // detach them before deleting the book itself.
        sqlx::query("DELETE FROM reservations WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("Failed to delete book reservations", e))?;

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("Failed to delete book", e))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit book deletion", e))
    }

    async fn create_reservation(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        due_date: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let book = Self::lock_book(&mut *tx, book_id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found"))?;

        if !book.has_available_copy() {
            return Err(AppError::no_copies_available(format!(
                "No copies of '{}' available",
                book.title
            )));
        }

        sqlx::query("UPDATE books SET available_copies = available_copies - 1 WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("Failed to claim copy", e))?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (user_id, book_id, status, due_date) \
             VALUES ($1, $2, 'active', $3) RETURNING *",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "uq_reservations_one_active") {
                return AppError::duplicate_reservation(format!(
                    "An active reservation for '{}' already exists",
                    book.title
                ));
            }
            map_db_error("Failed to insert reservation", e)
        })?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit reservation", e))?;

        Ok(reservation)
    }

    async fn settle_reservation(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        status: ReservationStatus,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        // Lock the book first so the settle serializes with concurrent
        // reservations against the same row.
        if Self::lock_book(&mut *tx, book_id).await?.is_none() {
            return Ok(None);
        }

        let settled = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = $3, returned_at = $4 \
             WHERE user_id = $1 AND book_id = $2 AND status = 'active' RETURNING *",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(status)
        .bind(returned_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to settle reservation", e))?;

        let Some(reservation) = settled else {
            return Ok(None);
        };

        Self::credit_copy(&mut *tx, book_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit return", e))?;

        Ok(Some(reservation))
    }

    async fn override_status(
        &self,
        reservation_id: Uuid,
        new_status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<StatusOverride> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let current = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(reservation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to lock reservation", e))?
        .ok_or_else(|| AppError::not_found("Reservation not found"))?;

        Self::lock_book(&mut *tx, current.book_id).await?;

        let copy_credited = current.status.credits_copy_on_override(new_status);
        let returned_at = if copy_credited { Some(now) } else { current.returned_at };

        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = $2, returned_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(reservation_id)
        .bind(new_status)
        .bind(returned_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // Reactivation can collide with a newer active reservation
            // the same user took out after this one was settled.
            if is_unique_violation(&e, "uq_reservations_one_active") {
                return AppError::duplicate_reservation(
                    "User already holds an active reservation for this book",
                );
            }
            map_db_error("Failed to override reservation status", e)
        })?;

        if copy_credited {
            Self::credit_copy(&mut *tx, current.book_id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit status override", e))?;

        Ok(StatusOverride {
            reservation,
            previous_status: current.status,
            copy_credited,
        })
    }

    async fn fetch_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to fetch reservation", e))
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations \
             WHERE ($1::UUID IS NULL OR user_id = $1) \
               AND ($2::UUID IS NULL OR book_id = $2) \
               AND ($3::reservation_status IS NULL OR status = $3) \
             ORDER BY reserved_at DESC",
        )
        .bind(filter.user_id)
        .bind(filter.book_id)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list reservations", e))
    }

    async fn count_active_for_book(&self, book_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status = 'active'",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to count active reservations", e))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| map_db_error("Health check failed", e))
    }
}
