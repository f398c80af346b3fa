//! # libris-service
//!
//! Business logic for Libris. Each service orchestrates stores and
//! authentication components to implement application-level use cases.
//!
//! Services follow constructor injection, taking their dependencies as
//! `Arc` references at construction time. The stores arrive as trait
//! objects, so the same services run over PostgreSQL in production and
//! over the in-memory stores in tests.

pub mod context;
pub mod identity;
pub mod lending;

pub use context::RequestContext;
pub use identity::IdentityService;
pub use lending::{CatalogService, ReservationEngine};
