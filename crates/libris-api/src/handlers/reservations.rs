//! Reservation listing and administrative override handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use libris_entity::reservation::{Reservation, ReservationFilter};
use libris_entity::store::StatusOverride;

use crate::dto::request::{OverrideStatusRequest, ReservationListQuery};
use crate::error::ApiError;
use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/reservations/mine
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, ApiError> {
    let reservations = state
        .reservation_engine
        .list_reservations(&auth, &ReservationFilter::for_user(auth.user_id))
        .await?;

    Ok(Json(ApiResponse::ok(reservations)))
}

/// GET /api/reservations
pub async fn list_all(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReservationListQuery>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, ApiError> {
    let filter = ReservationFilter {
        user_id: query.user_id,
        book_id: query.book_id,
        status: query.status,
    };

    let reservations = state
        .reservation_engine
        .list_reservations(&auth, &filter)
        .await?;

    Ok(Json(ApiResponse::ok(reservations)))
}

/// GET /api/reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let reservation = state.reservation_engine.get_reservation(&auth, id).await?;

    Ok(Json(ApiResponse::ok(reservation)))
}

/// PUT /api/reservations/{id}/status
pub async fn override_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideStatusRequest>,
) -> Result<Json<ApiResponse<StatusOverride>>, ApiError> {
    let outcome = state
        .reservation_engine
        .admin_set_status(&auth, id, req.status)
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}
