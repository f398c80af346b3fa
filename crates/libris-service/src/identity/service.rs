//! Registration, login, and role administration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use libris_auth::jwt::{IssuedToken, JwtEncoder};
use libris_auth::password::PasswordHasher;
use libris_auth::rbac::{Capability, RbacEnforcer};
use libris_core::error::AppError;
use libris_entity::store::IdentityStore;
use libris_entity::user::{NewUser, User, UserRole};

use crate::context::RequestContext;

/// Data for registering a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Email address (unique).
    pub email: String,
    /// Username (unique).
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
    /// Role to assign; defaults to patron when omitted.
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// A successful login: the user record and a fresh access token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// The authenticated user.
    pub user: User,
    /// The issued access token.
    pub token: IssuedToken,
}

/// Handles account registration, credential verification, and role
/// administration.
#[derive(Debug, Clone)]
pub struct IdentityService {
    /// User store.
    store: Arc<dyn IdentityStore>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Token issuer.
    encoder: Arc<JwtEncoder>,
    /// Capability enforcement.
    enforcer: Arc<RbacEnforcer>,
    /// Minimum accepted password length.
    password_min_length: usize,
}

impl IdentityService {
    /// Creates a new identity service.
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: Arc<PasswordHasher>,
        encoder: Arc<JwtEncoder>,
        enforcer: Arc<RbacEnforcer>,
        password_min_length: usize,
    ) -> Self {
        Self {
            store,
            hasher,
            encoder,
            enforcer,
            password_min_length,
        }
    }

    /// Registers a new account.
    ///
    /// The store's uniqueness constraints are authoritative for email and
    /// username collisions; the checks here only produce friendlier
    /// messages for the common case.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        self.validate_registration(&req)?;

        if self.store.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }
        if self.store.find_by_username(&req.username).await?.is_some() {
            return Err(AppError::conflict("Username is already taken"));
        }

        let password_hash = self.hasher.hash_password(&req.password)?;
        let new_user = NewUser {
            email: req.email,
            username: req.username,
            full_name: req.full_name,
            password_hash,
            role: req.role.unwrap_or(UserRole::Patron),
        };

        let user = self.store.insert_user(&new_user).await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");

        Ok(user)
    }

    /// Verifies credentials and issues an access token.
    ///
    /// Unknown usernames and wrong passwords produce the same error so
    /// the response does not reveal which accounts exist.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = if username.contains('@') {
            self.store.find_by_email(username).await?
        } else {
            self.store.find_by_username(username).await?
        };

        let Some(user) = user else {
            return Err(AppError::authentication("Invalid username or password"));
        };

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(AppError::authentication("Invalid username or password"));
        }

        if !user.can_login() {
            return Err(AppError::authentication("Account is deactivated"));
        }

        let token = self.encoder.issue(&user)?;

        info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(LoginResponse { user, token })
    }

    /// Fetches the authenticated user's own record.
    pub async fn profile(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.store
            .fetch_user(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Fetches any user's record. Requires `ReadAnyUser`.
    pub async fn get_user(&self, ctx: &RequestContext, id: Uuid) -> Result<User, AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::ReadAnyUser)?;

        self.store
            .fetch_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Changes a user's role. Requires `ChangeUserRole`.
    pub async fn set_role(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<User, AppError> {
        self.enforcer
            .require_capability(&ctx.role, Capability::ChangeUserRole)?;

        let user = self.store.set_role(user_id, role).await?;

        info!(
            acting_user = %ctx.user_id,
            target_user = %user.id,
            new_role = %user.role,
            "User role changed"
        );

        Ok(user)
    }

    fn validate_registration(&self, req: &RegisterRequest) -> Result<(), AppError> {
        if !req.email.contains('@') || !req.email.contains('.') {
            return Err(AppError::validation("Invalid email format"));
        }
        if req.username.trim().is_empty() {
            return Err(AppError::validation("Username cannot be empty"));
        }
        if req.full_name.trim().is_empty() {
            return Err(AppError::validation("Full name cannot be empty"));
        }
        if req.password.len() < self.password_min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                self.password_min_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::ErrorKind;
    use libris_core::config::auth::AuthConfig;
    use libris_database::MemoryIdentityStore;

    fn service() -> IdentityService {
        let config = AuthConfig::default();
        IdentityService::new(
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(PasswordHasher::new()),
            Arc::new(JwtEncoder::new(&config)),
            Arc::new(RbacEnforcer::new()),
            config.password_min_length,
        )
    }

    fn register_req(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            full_name: "Ada Lovelace".to_string(),
            password: "analytical-engine".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_register_defaults_to_patron() {
        let svc = service();
        let user = svc.register(register_req("ada@example.com", "ada")).await.unwrap();
        assert_eq!(user.role, UserRole::Patron);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let svc = service();
        let mut req = register_req("ada@example.com", "ada");
        req.password = "short".to_string();
        let err = svc.register(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let svc = service();
        svc.register(register_req("ada@example.com", "ada")).await.unwrap();
        let err = svc
            .register(register_req("ada@example.com", "ada2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_login_round_trip_and_bad_password() {
        let svc = service();
        svc.register(register_req("ada@example.com", "ada")).await.unwrap();

        let resp = svc.login("ada", "analytical-engine").await.unwrap();
        assert_eq!(resp.user.username, "ada");
        assert!(!resp.token.access_token.is_empty());

        // Email works as the login identifier too.
        assert!(svc.login("ada@example.com", "analytical-engine").await.is_ok());

        let err = svc.login("ada", "wrong").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let err = svc.login("nobody", "analytical-engine").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_set_role_requires_admin() {
        let svc = service();
        let user = svc.register(register_req("ada@example.com", "ada")).await.unwrap();

        let patron_ctx = RequestContext::new(user.id, "ada".to_string(), UserRole::Patron);
        let err = svc
            .set_role(&patron_ctx, user.id, UserRole::Librarian)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let admin_ctx = RequestContext::new(Uuid::new_v4(), "root".to_string(), UserRole::Admin);
        let updated = svc
            .set_role(&admin_ctx, user.id, UserRole::Librarian)
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::Librarian);
    }
}
