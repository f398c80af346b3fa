//! # libris-api
//!
//! HTTP API layer for Libris built on Axum: REST endpoints, the
//! `AuthUser` extractor, DTOs, and the `AppError` to status-code
//! mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
