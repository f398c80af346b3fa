//! Book catalog management.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use libris_auth::rbac::{Capability, RbacEnforcer};
use libris_core::error::AppError;
use libris_core::types::{PageRequest, PageResponse};
use libris_entity::book::{Book, BookUpdate, NewBook};
use libris_entity::store::LendingStore;

use crate::context::RequestContext;

/// Handles book catalog CRUD.
///
/// Reads are public; mutations are capability-gated. Copy-count
/// consistency during capacity changes and deletes is the store's
/// responsibility; this layer validates input and enforces access.
#[derive(Debug, Clone)]
pub struct CatalogService {
    /// Lending store.
    store: Arc<dyn LendingStore>,
    /// Capability enforcement.
    enforcer: Arc<RbacEnforcer>,
}

impl CatalogService {
    /// Creates a new catalog service.
    pub fn new(store: Arc<dyn LendingStore>, enforcer: Arc<RbacEnforcer>) -> Self {
        Self { store, enforcer }
    }

    /// Lists books, optionally filtered by a title/author substring.
    pub async fn list_books(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> Result<PageResponse<Book>, AppError> {
        self.store.list_books(search, page).await
    }

    /// Fetches a single book.
    pub async fn get_book(&self, id: Uuid) -> Result<Book, AppError> {
        self.store
            .fetch_book(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found"))
    }

    /// Adds a book to the catalog. Requires `CreateBook`.
    pub async fn create_book(&self, ctx: &RequestContext, req: NewBook) -> Result<Book, AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::CreateBook)?;
        validate_details(&req.title, &req.author, &req.isbn, req.total_copies)?;

        let book = self.store.insert_book(&req).await?;

        info!(book_id = %book.id, title = %book.title, acting_user = %ctx.user_id, "Book created");

        Ok(book)
    }

    /// Updates a book's details and capacity. Requires `UpdateBook`.
    ///
    /// A change to `total_copies` shifts `available_copies` by the same
    /// delta; the store rejects a reduction that would exceed the number
    /// of free copies with `InvalidCapacityChange`.
    pub async fn update_book(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: BookUpdate,
    ) -> Result<Book, AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::UpdateBook)?;
        validate_details(&req.title, &req.author, &req.isbn, req.total_copies)?;

        let book = self.store.update_book(id, &req).await?;

        info!(book_id = %book.id, acting_user = %ctx.user_id, "Book updated");

        Ok(book)
    }

    /// Removes a book. Requires `DeleteBook`. Fails with
    /// `HasActiveReservations` while any active reservation references it.
    pub async fn delete_book(&self, ctx: &RequestContext, id: Uuid) -> Result<(), AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::DeleteBook)?;

        self.store.delete_book(id).await?;

        info!(book_id = %id, acting_user = %ctx.user_id, "Book deleted");

        Ok(())
    }
}

fn validate_details(
    title: &str,
    author: &str,
    isbn: &str,
    total_copies: i32,
) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation("Title cannot be empty"));
    }
    if author.trim().is_empty() {
        return Err(AppError::validation("Author cannot be empty"));
    }
    if isbn.trim().is_empty() {
        return Err(AppError::validation("ISBN cannot be empty"));
    }
    if total_copies < 0 {
        return Err(AppError::validation("Total copies cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::ErrorKind;
    use libris_database::MemoryLendingStore;
    use libris_entity::user::UserRole;

    fn service() -> CatalogService {
        CatalogService::new(
            Arc::new(MemoryLendingStore::new()),
            Arc::new(RbacEnforcer::new()),
        )
    }

    fn admin_ctx() -> RequestContext {
        RequestContext::new(Uuid::new_v4(), "root".to_string(), UserRole::Admin)
    }

    fn new_book(title: &str, isbn: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            isbn: isbn.to_string(),
            description: None,
            total_copies: 2,
        }
    }

    #[tokio::test]
    async fn test_patron_cannot_create_book() {
        let svc = service();
        let ctx = RequestContext::new(Uuid::new_v4(), "pat".to_string(), UserRole::Patron);
        let err = svc
            .create_book(&ctx, new_book("Dune", "978-0441172719"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let svc = service();
        let ctx = admin_ctx();
        svc.create_book(&ctx, new_book("Dune", "978-0441172719"))
            .await
            .unwrap();
        svc.create_book(&ctx, new_book("Dune Messiah", "978-0441172696"))
            .await
            .unwrap();

        let all = svc
            .list_books(None, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total_items, 2);

        let hits = svc
            .list_books(Some("messiah"), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(hits.items.len(), 1);
        assert_eq!(hits.items[0].title, "Dune Messiah");
    }

    #[tokio::test]
    async fn test_validation_rejects_blank_title() {
        let svc = service();
        let err = svc
            .create_book(&admin_ctx(), new_book("  ", "978-0441172719"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
