//! # libris-database
//!
//! PostgreSQL connection management and the concrete store
//! implementations for Libris: the transactional Postgres stores used
//! in production, and single-node in-memory stores used by tests and
//! local demos.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;

pub use connection::DatabasePool;
pub use memory::{MemoryIdentityStore, MemoryLendingStore};
pub use postgres::{PostgresIdentityStore, PostgresLendingStore};
