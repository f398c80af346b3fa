//! Book catalog and lending handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use libris_core::types::PageResponse;
use libris_entity::book::{Book, BookUpdate, NewBook};
use libris_entity::reservation::Reservation;

use crate::dto::request::{BookListQuery, ReturnRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/books
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Book>>>, ApiError> {
    let page = state
        .catalog_service
        .list_books(query.search.as_deref(), &query.page_request())
        .await?;

    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/books/{id}
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Book>>, ApiError> {
    let book = state.catalog_service.get_book(id).await?;

    Ok(Json(ApiResponse::ok(book)))
}

/// POST /api/books
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewBook>,
) -> Result<(StatusCode, Json<ApiResponse<Book>>), ApiError> {
    let book = state.catalog_service.create_book(&auth, req).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(book))))
}

/// PUT /api/books/{id}
pub async fn update_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<BookUpdate>,
) -> Result<Json<ApiResponse<Book>>, ApiError> {
    let book = state.catalog_service.update_book(&auth, id, req).await?;

    Ok(Json(ApiResponse::ok(book)))
}

/// DELETE /api/books/{id}
pub async fn delete_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.catalog_service.delete_book(&auth, id).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Book deleted".to_string(),
    })))
}

/// POST /api/books/{id}/reserve
pub async fn reserve_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Reservation>>), ApiError> {
    let reservation = state.reservation_engine.reserve(&auth, id).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(reservation))))
}

/// PUT /api/books/{id}/return
pub async fn return_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReturnRequest>>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let on_behalf_of = body.and_then(|Json(req)| req.user_id);

    let reservation = state
        .reservation_engine
        .return_book(&auth, id, on_behalf_of)
        .await?;

    Ok(Json(ApiResponse::ok(reservation)))
}
