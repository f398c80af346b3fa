//! PostgreSQL store implementations.

pub mod identity;
pub mod lending;

pub use identity::PostgresIdentityStore;
pub use lending::PostgresLendingStore;

use libris_core::error::{AppError, ErrorKind};

/// SQLSTATE codes for transient races that a caller may retry.
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE for unique constraint violations.
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error to an `AppError`, recognizing transient
/// serialization/deadlock failures as retryable conflicts. Unique
/// violations are translated by the callers that know which constraint
/// they ran into.
pub(crate) fn map_db_error(context: &str, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            if code == SQLSTATE_SERIALIZATION_FAILURE || code == SQLSTATE_DEADLOCK_DETECTED {
                return AppError::with_source(
                    ErrorKind::Conflict,
                    format!("{context}: concurrent transaction conflict"),
                    err,
                );
            }
        }
    }
    AppError::with_source(ErrorKind::Database, context.to_string(), err)
}

/// Check whether a sqlx error is a unique violation on the named
/// constraint or index.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.code().as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION) {
            return db_err.constraint() == Some(constraint);
        }
    }
    false
}

/// Check whether a sqlx error is a unique violation on any constraint.
pub(crate) fn is_any_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION);
    }
    false
}
