//! Route handlers organized by domain.

pub mod auth;
pub mod books;
pub mod health;
pub mod reservations;
pub mod users;
