//! # libris-entity
//!
//! Domain entity models for Libris. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.
//!
//! The crate also defines the [`store`] contracts ([`store::IdentityStore`]
//! and [`store::LendingStore`]) that persistence backends implement.

pub mod book;
pub mod reservation;
pub mod store;
pub mod user;
