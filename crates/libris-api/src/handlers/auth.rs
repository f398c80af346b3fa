//! Auth handlers: register, login, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use libris_service::identity::RegisterRequest;

use crate::dto::request::LoginRequest;
use crate::error::ApiError;
use crate::dto::response::{ApiResponse, LoginResponse, UserResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let user = state.identity_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(user))),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let result = state
        .identity_service
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token: result.token.access_token,
        expires_at: result.token.expires_at,
        user: UserResponse::from(result.user),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.identity_service.profile(&auth).await?;

    Ok(Json(ApiResponse::ok(UserResponse::from(user))))
}
