//! JWT access-token issuance and verification.
//!
//! This module is the token-service boundary: nothing outside it parses
//! or signs tokens.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::Claims;
pub use decoder::JwtDecoder;
pub use encoder::{IssuedToken, JwtEncoder};
