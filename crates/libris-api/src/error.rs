//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use libris_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Status code for each error kind.
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation
        | ErrorKind::InvalidTransition
        | ErrorKind::InvalidCapacityChange
        | ErrorKind::HasActiveReservations => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::DuplicateReservation | ErrorKind::NoCopiesAvailable => {
            StatusCode::CONFLICT
        }
        ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Newtype over the domain [`AppError`] so `IntoResponse` can be
/// implemented here without violating the orphan rule.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for_kind(err.kind);

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "Internal server error");
        }

        let body = ApiErrorResponse {
            error: err.kind.to_string(),
            message: err.message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for_kind(ErrorKind::Validation),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for_kind(ErrorKind::InvalidCapacityChange),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for_kind(ErrorKind::HasActiveReservations),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for_kind(ErrorKind::Authentication),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for_kind(ErrorKind::Authorization),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for_kind(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for_kind(ErrorKind::NoCopiesAvailable),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for_kind(ErrorKind::DuplicateReservation),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for_kind(ErrorKind::Database),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_code_is_machine_readable() {
        let err = AppError::no_copies_available("none left");
        assert_eq!(err.kind.to_string(), "NO_COPIES_AVAILABLE");
    }
}
