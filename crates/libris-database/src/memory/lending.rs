//! In-memory lending store.
//!
//! One mutex guards books and reservations together, so each operation
//! is atomic with respect to concurrent callers exactly like a
//! PostgreSQL transaction over both tables.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use libris_core::AppResult;
use libris_core::error::AppError;
use libris_core::types::{PageRequest, PageResponse};
use libris_entity::book::{Book, BookUpdate, NewBook};
use libris_entity::reservation::{Reservation, ReservationFilter, ReservationStatus};
use libris_entity::store::{LendingStore, StatusOverride};

/// Internal state for the memory lending store.
#[derive(Debug, Default)]
struct InnerState {
    /// Books keyed by id.
    books: HashMap<Uuid, Book>,
    /// Reservations keyed by id.
    reservations: HashMap<Uuid, Reservation>,
}

impl InnerState {
    fn active_count_for_book(&self, book_id: Uuid) -> i64 {
        self.reservations
            .values()
            .filter(|r| r.book_id == book_id && r.is_active())
            .count() as i64
    }

    fn active_reservation(&self, user_id: Uuid, book_id: Uuid) -> Option<&Reservation> {
        self.reservations
            .values()
            .find(|r| r.user_id == user_id && r.book_id == book_id && r.is_active())
    }
}

/// In-memory lending store using a tokio mutex for thread safety.
///
/// Suitable for tests and single-node demos only.
#[derive(Debug, Clone, Default)]
pub struct MemoryLendingStore {
    /// Protected inner state.
    state: Arc<Mutex<InnerState>>,
}

impl MemoryLendingStore {
    /// Creates an empty lending store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LendingStore for MemoryLendingStore {
    async fn fetch_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.state.lock().await.books.get(&id).cloned())
    }

    async fn list_books(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Book>> {
        let state = self.state.lock().await;

        let mut matched: Vec<Book> = state
            .books
            .values()
            .filter(|b| {
                search.is_none_or(|needle| {
                    let needle = needle.to_lowercase();
                    b.title.to_lowercase().contains(&needle)
                        || b.author.to_lowercase().contains(&needle)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        let mut state = self.state.lock().await;

        if state.books.values().any(|b| b.isbn == book.isbn) {
            return Err(AppError::conflict(format!(
                "ISBN '{}' already exists",
                book.isbn
            )));
        }

        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            description: book.description.clone(),
            total_copies: book.total_copies,
            available_copies: book.total_copies,
            created_at: Utc::now(),
        };
        state.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_book(&self, id: Uuid, update: &BookUpdate) -> AppResult<Book> {
        let mut state = self.state.lock().await;

        if !state.books.contains_key(&id) {
            return Err(AppError::not_found("Book not found"));
        }

        if state
            .books
            .values()
            .any(|b| b.id != id && b.isbn == update.isbn)
        {
            return Err(AppError::conflict(format!(
                "ISBN '{}' already exists",
                update.isbn
            )));
        }

        let book = state
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Book not found"))?;

        let delta = update.total_copies - book.total_copies;
        if book.available_copies + delta < 0 {
            return Err(AppError::invalid_capacity_change(format!(
                "Reducing total copies to {} would leave {} copies on loan unaccounted for",
                update.total_copies,
                book.copies_on_loan()
            )));
        }

        book.title = update.title.clone();
        book.author = update.author.clone();
        book.isbn = update.isbn.clone();
        book.description = update.description.clone();
        book.total_copies = update.total_copies;
        book.available_copies += delta;

        Ok(book.clone())
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;

        let book = state
            .books
            .get(&id)
            .ok_or_else(|| AppError::not_found("Book not found"))?;

        let active = state.active_count_for_book(id);
        if active > 0 {
            return Err(AppError::has_active_reservations(format!(
                "Cannot delete '{}': {active} active reservation(s) reference it",
                book.title
            )));
        }

        state.reservations.retain(|_, r| r.book_id != id);
        state.books.remove(&id);
        Ok(())
    }

    async fn create_reservation(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        due_date: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;

        let Some(book) = state.books.get(&book_id) else {
            return Err(AppError::not_found("Book not found"));
        };
        let title = book.title.clone();

        if !book.has_available_copy() {
            return Err(AppError::no_copies_available(format!(
                "No copies of '{title}' available"
            )));
        }

        if state.active_reservation(user_id, book_id).is_some() {
            return Err(AppError::duplicate_reservation(format!(
                "An active reservation for '{title}' already exists"
            )));
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            status: ReservationStatus::Active,
            reserved_at: Utc::now(),
            due_date,
            returned_at: None,
        };

        // Both mutations happen under the same guard; a concurrent
        // caller observes either neither or both.
        if let Some(b) = state.books.get_mut(&book_id) {
            b.available_copies -= 1;
        }
        state.reservations.insert(reservation.id, reservation.clone());

        Ok(reservation)
    }

    async fn settle_reservation(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        status: ReservationStatus,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        let mut state = self.state.lock().await;

        let Some(id) = state.active_reservation(user_id, book_id).map(|r| r.id) else {
            return Ok(None);
        };

        let reservation = match state.reservations.get_mut(&id) {
            Some(r) => {
                r.status.ensure_transition_to(status)?;
                r.status = status;
                r.returned_at = Some(returned_at);
                r.clone()
            }
            None => return Ok(None),
        };

        if let Some(book) = state.books.get_mut(&book_id) {
            book.available_copies = (book.available_copies + 1).min(book.total_copies);
        }

        Ok(Some(reservation))
    }

    async fn override_status(
        &self,
        reservation_id: Uuid,
        new_status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<StatusOverride> {
        let mut state = self.state.lock().await;

        let current = state
            .reservations
            .get(&reservation_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Reservation not found"))?;

        // Reactivation collides with a newer active reservation the same
        // user took out after this one was settled, exactly like the
        // partial unique index rejects it in PostgreSQL.
        if new_status == ReservationStatus::Active
            && !current.is_active()
            && state
                .active_reservation(current.user_id, current.book_id)
                .is_some()
        {
            return Err(AppError::duplicate_reservation(
                "User already holds an active reservation for this book",
            ));
        }

        let copy_credited = current.status.credits_copy_on_override(new_status);

        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .map(|r| {
                r.status = new_status;
                if copy_credited {
                    r.returned_at = Some(now);
                }
                r.clone()
            })
            .ok_or_else(|| AppError::not_found("Reservation not found"))?;

        if copy_credited {
            if let Some(book) = state.books.get_mut(&current.book_id) {
                book.available_copies = (book.available_copies + 1).min(book.total_copies);
            }
        }

        Ok(StatusOverride {
            reservation,
            previous_status: current.status,
            copy_credited,
        })
    }

    async fn fetch_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        Ok(self.state.lock().await.reservations.get(&id).cloned())
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        let mut matched: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.reserved_at.cmp(&a.reserved_at));
        Ok(matched)
    }

    async fn count_active_for_book(&self, book_id: Uuid) -> AppResult<i64> {
        Ok(self.state.lock().await.active_count_for_book(book_id))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(total: i32) -> NewBook {
        NewBook {
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: "978-0441478125".to_string(),
            description: None,
            total_copies: total,
        }
    }

    #[tokio::test]
    async fn test_create_sets_available_to_total() {
        let store = MemoryLendingStore::new();
        let book = store.insert_book(&new_book(3)).await.unwrap();
        assert_eq!(book.available_copies, 3);
    }

    #[tokio::test]
    async fn test_duplicate_isbn_conflicts() {
        let store = MemoryLendingStore::new();
        store.insert_book(&new_book(1)).await.unwrap();
        let err = store.insert_book(&new_book(1)).await.unwrap_err();
        assert_eq!(err.kind, libris_core::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_reserve_decrements_and_settle_credits_back() {
        let store = MemoryLendingStore::new();
        let book = store.insert_book(&new_book(1)).await.unwrap();
        let user = Uuid::new_v4();

        store
            .create_reservation(user, book.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(
            store.fetch_book(book.id).await.unwrap().unwrap().available_copies,
            0
        );

        let settled = store
            .settle_reservation(user, book.id, ReservationStatus::Returned, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settled.status, ReservationStatus::Returned);
        assert!(settled.returned_at.is_some());
        assert_eq!(
            store.fetch_book(book.id).await.unwrap().unwrap().available_copies,
            1
        );

        // Second settle finds no active reservation and credits nothing.
        let none = store
            .settle_reservation(user, book.id, ReservationStatus::Returned, Utc::now())
            .await
            .unwrap();
        assert!(none.is_none());
        assert_eq!(
            store.fetch_book(book.id).await.unwrap().unwrap().available_copies,
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_active_reservation_rejected() {
        let store = MemoryLendingStore::new();
        let book = store.insert_book(&new_book(5)).await.unwrap();
        let user = Uuid::new_v4();

        store
            .create_reservation(user, book.id, Utc::now())
            .await
            .unwrap();
        let err = store
            .create_reservation(user, book.id, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind, libris_core::ErrorKind::DuplicateReservation);
    }

    #[tokio::test]
    async fn test_update_unknown_book_not_found_even_on_isbn_collision() {
        let store = MemoryLendingStore::new();
        let book = store.insert_book(&new_book(1)).await.unwrap();

        let update = BookUpdate {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            description: None,
            total_copies: 1,
        };
        let err = store.update_book(Uuid::new_v4(), &update).await.unwrap_err();
        assert_eq!(err.kind, libris_core::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reactivation_override_rejected_while_rereserved() {
        let store = MemoryLendingStore::new();
        let book = store.insert_book(&new_book(2)).await.unwrap();
        let user = Uuid::new_v4();

        let settled = store
            .create_reservation(user, book.id, Utc::now())
            .await
            .unwrap();
        store
            .settle_reservation(user, book.id, ReservationStatus::Returned, Utc::now())
            .await
            .unwrap();
        store
            .create_reservation(user, book.id, Utc::now())
            .await
            .unwrap();

        let err = store
            .override_status(settled.id, ReservationStatus::Active, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind, libris_core::ErrorKind::DuplicateReservation);
        assert_eq!(store.count_active_for_book(book.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_guarded_by_active_reservations() {
        let store = MemoryLendingStore::new();
        let book = store.insert_book(&new_book(1)).await.unwrap();
        let user = Uuid::new_v4();
        store
            .create_reservation(user, book.id, Utc::now())
            .await
            .unwrap();

        let err = store.delete_book(book.id).await.unwrap_err();
        assert_eq!(err.kind, libris_core::ErrorKind::HasActiveReservations);

        store
            .settle_reservation(user, book.id, ReservationStatus::Returned, Utc::now())
            .await
            .unwrap();
        store.delete_book(book.id).await.unwrap();
        assert!(store.fetch_book(book.id).await.unwrap().is_none());
    }
}
