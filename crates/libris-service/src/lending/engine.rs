//! The reservation engine: copy-count accounting and the reservation
//! lifecycle, gated through the capability enforcer.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use libris_auth::rbac::{Capability, RbacEnforcer};
use libris_core::error::AppError;
use libris_entity::reservation::{Reservation, ReservationFilter, ReservationStatus};
use libris_entity::store::{LendingStore, StatusOverride};
use libris_entity::user::UserRole;

use crate::context::RequestContext;

/// Orchestrates the reservation lifecycle.
///
/// Atomicity of each mutation lives in the store; this layer decides
/// who may do what, computes due dates, and retries transient storage
/// races exactly once. Business failures are never retried.
#[derive(Debug, Clone)]
pub struct ReservationEngine {
    /// Lending store.
    store: Arc<dyn LendingStore>,
    /// Capability enforcement.
    enforcer: Arc<RbacEnforcer>,
    /// Loan period applied to new reservations.
    loan_period_days: i64,
}

impl ReservationEngine {
    /// Creates a new reservation engine.
    pub fn new(
        store: Arc<dyn LendingStore>,
        enforcer: Arc<RbacEnforcer>,
        loan_period_days: i64,
    ) -> Self {
        Self {
            store,
            enforcer,
            loan_period_days,
        }
    }

    /// Reserves one copy of a book for the caller.
    ///
    /// Fails with `NotFound` for an unknown book, `NoCopiesAvailable`
    /// when every copy is out, and `DuplicateReservation` when the
    /// caller already holds an active reservation for this book.
    pub async fn reserve(
        &self,
        ctx: &RequestContext,
        book_id: Uuid,
    ) -> Result<Reservation, AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::ReserveBook)?;

        let due_date = ctx.request_time + Duration::days(self.loan_period_days);

        let reservation = retry_once(|| {
            self.store
                .create_reservation(ctx.user_id, book_id, due_date)
        })
        .await?;

        info!(
            reservation_id = %reservation.id,
            user_id = %ctx.user_id,
            book_id = %book_id,
            due_date = %reservation.due_date,
            "Reservation created"
        );

        Ok(reservation)
    }

    /// Returns the caller's active reservation for a book.
    ///
    /// Admins may pass `on_behalf_of` to return a book for another
    /// user; everyone else may only settle their own reservation.
    pub async fn return_book(
        &self,
        ctx: &RequestContext,
        book_id: Uuid,
        on_behalf_of: Option<Uuid>,
    ) -> Result<Reservation, AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::ReturnOwnBook)?;

        let target_user = on_behalf_of.unwrap_or(ctx.user_id);
        if target_user != ctx.user_id {
            self.enforcer
                .require_minimum_role(&ctx.role, &UserRole::Admin)?;
        }

        let now = Utc::now();
        let settled = retry_once(|| {
            self.store
                .settle_reservation(target_user, book_id, ReservationStatus::Returned, now)
        })
        .await?;

        let reservation = settled.ok_or_else(|| {
            AppError::not_found("No active reservation for this book")
        })?;

        info!(
            reservation_id = %reservation.id,
            user_id = %target_user,
            book_id = %book_id,
            "Book returned"
        );

        Ok(reservation)
    }

    /// Overwrites a reservation's status. Requires
    /// `OverrideReservationStatus` (librarian and above).
    ///
    /// Moving an active reservation to a terminal status credits the
    /// copy back; every other combination rewrites the status with no
    /// copy-count side effect, so reactivating a settled reservation
    /// does not claim a copy.
    pub async fn admin_set_status(
        &self,
        ctx: &RequestContext,
        reservation_id: Uuid,
        new_status: ReservationStatus,
    ) -> Result<StatusOverride, AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::OverrideReservationStatus)?;

        let now = Utc::now();
        let outcome = retry_once(|| {
            self.store.override_status(reservation_id, new_status, now)
        })
        .await?;

        info!(
            reservation_id = %reservation_id,
            acting_user = %ctx.user_id,
            previous_status = %outcome.previous_status,
            new_status = %new_status,
            copy_credited = outcome.copy_credited,
            "Reservation status overridden"
        );

        Ok(outcome)
    }

    /// Lists reservations. A filter restricted to the caller's own
    /// user needs only `ListOwnReservations`; anything broader needs
    /// `ListAllReservations`.
    pub async fn list_reservations(
        &self,
        ctx: &RequestContext,
        filter: &ReservationFilter,
    ) -> Result<Vec<Reservation>, AppError> {
        if filter.user_id == Some(ctx.user_id) {
            self.enforcer
                .require_capability(&ctx.role, Capability::ListOwnReservations)?;
        } else {
            self.enforcer
                .require_capability(&ctx.role, Capability::ListAllReservations)?;
        }

        self.store.list_reservations(filter).await
    }

    /// Fetches a single reservation. Callers see their own; anything
    /// else needs `ListAllReservations`.
    pub async fn get_reservation(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Reservation, AppError> {
        let reservation = self
            .store
            .fetch_reservation(id)
            .await?
            .ok_or_else(|| AppError::not_found("Reservation not found"))?;

        if reservation.user_id != ctx.user_id {
            self.enforcer
                .require_capability(&ctx.role, Capability::ListAllReservations)?;
        }

        Ok(reservation)
    }
}

/// Runs a store mutation, retrying it exactly once if it fails with a
/// transient conflict (storage-level serialization or deadlock race).
async fn retry_once<T, F, Fut>(op: F) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match op().await {
        Err(err) if err.is_transient_conflict() => {
            warn!(error = %err, "Transient storage conflict, retrying once");
            op().await
        }
        other => other,
    }
}
