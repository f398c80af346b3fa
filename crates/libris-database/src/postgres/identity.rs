//! PostgreSQL identity store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use libris_core::AppResult;
use libris_core::error::AppError;
use libris_entity::store::IdentityStore;
use libris_entity::user::{NewUser, User, UserRole};

use super::{is_any_unique_violation, is_unique_violation, map_db_error};

/// Identity store backed by the `users` table. Email and username
/// uniqueness is enforced by case-insensitive unique indexes.
#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    /// Create a new identity store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn fetch_user(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to fetch user by id", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find user by username", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find user by email", e))
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, username, full_name, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "uq_users_email") {
                return AppError::conflict("Email is already registered");
            }
            if is_unique_violation(&e, "uq_users_username") {
                return AppError::conflict("Username is already taken");
            }
            if is_any_unique_violation(&e) {
                return AppError::conflict("User already exists");
            }
            map_db_error("Failed to insert user", e)
        })
    }

    async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        sqlx::query_as::<_, User>("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to update user role", e))?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
