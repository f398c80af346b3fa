//! Identity use cases: registration, login, profile, role management.

pub mod service;

pub use service::{IdentityService, LoginResponse, RegisterRequest};
