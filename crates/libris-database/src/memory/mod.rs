//! In-memory store implementations.
//!
//! Single-node stores guarded by one tokio mutex each, so every
//! operation observes the same atomicity the PostgreSQL stores provide
//! through transactions. Used by the test suite and local demos.

pub mod identity;
pub mod lending;

pub use identity::MemoryIdentityStore;
pub use lending::MemoryLendingStore;
