//! # libris-auth
//!
//! Authentication and authorization building blocks for Libris:
//! Argon2id password hashing, JWT access-token issuance and
//! verification (the token-service boundary), and the role-based
//! access-control layer (capability lattice + enforcer).

pub mod jwt;
pub mod password;
pub mod rbac;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use rbac::{Capability, RbacEnforcer, RolePolicies};
