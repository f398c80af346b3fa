//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use libris_core::config::auth::AuthConfig;
use libris_core::error::AppError;

use super::claims::Claims;

/// Validates JWT access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string, checking signature
    /// and expiration.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::authentication(format!("Invalid access token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use chrono::Utc;
    use libris_entity::user::{User, UserRole};
    use uuid::Uuid;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            full_name: "Ada Lovelace".to_string(),
            password_hash: "x".to_string(),
            role: UserRole::Librarian,
            is_active: true,
            external_id: None,
            two_factor_enabled: false,
            created_at: Utc::now(),
        }
    }

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl_minutes: 30,
            password_min_length: 8,
        }
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let cfg = config("test-secret");
        let user = test_user();

        let issued = JwtEncoder::new(&cfg).issue(&user).unwrap();
        let claims = JwtDecoder::new(&cfg).decode(&issued.access_token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.role, UserRole::Librarian);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let user = test_user();
        let issued = JwtEncoder::new(&config("secret-a")).issue(&user).unwrap();

        let err = JwtDecoder::new(&config("secret-b"))
            .decode(&issued.access_token)
            .unwrap_err();
        assert_eq!(err.kind, libris_core::ErrorKind::Authentication);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(JwtDecoder::new(&config("s")).decode("not.a.jwt").is_err());
    }
}
