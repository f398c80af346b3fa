//! In-memory identity store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use libris_core::AppResult;
use libris_core::error::AppError;
use libris_entity::store::IdentityStore;
use libris_entity::user::{NewUser, User, UserRole};

/// In-memory identity store using a tokio mutex for thread safety.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    /// Users keyed by id.
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryIdentityStore {
    /// Creates an empty identity store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn fetch_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let mut users = self.users.lock().await;

        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::conflict("Email is already registered"));
        }
        if users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(AppError::conflict("Username is already taken"));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            is_active: true,
            external_id: None,
            two_factor_enabled: false,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.role = role;
        Ok(user.clone())
    }
}
