//! User administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::dto::request::ChangeRoleRequest;
use crate::error::ApiError;
use crate::dto::response::{ApiResponse, UserResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.identity_service.get_user(&auth, id).await?;

    Ok(Json(ApiResponse::ok(UserResponse::from(user))))
}

/// PUT /api/users/{id}/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.identity_service.set_role(&auth, id, req.role).await?;

    Ok(Json(ApiResponse::ok(UserResponse::from(user))))
}
