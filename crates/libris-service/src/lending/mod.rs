//! Lending use cases: the catalog and the reservation engine.

pub mod catalog;
pub mod engine;

pub use catalog::CatalogService;
pub use engine::ReservationEngine;
