//! Shared test helpers for integration tests.
//!
//! Drives the full Axum router over the in-memory stores, so these
//! tests need no running PostgreSQL instance.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use libris_core::config::AppConfig;
use libris_core::config::database::DatabaseConfig;
use libris_database::{MemoryIdentityStore, MemoryLendingStore};
use libris_entity::book::NewBook;
use libris_entity::store::LendingStore;

/// A response captured from the test router.
pub struct TestResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Parsed JSON body.
    pub body: Value,
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Direct handle on the lending store for seeding fixtures
    pub lending_store: Arc<MemoryLendingStore>,
}

impl TestApp {
    /// Create a new test application over in-memory stores
    pub fn new() -> Self {
        let config = AppConfig {
            server: Default::default(),
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
                max_connections: 1,
                min_connections: 1,
                connect_timeout_seconds: 1,
                idle_timeout_seconds: 60,
            },
            auth: Default::default(),
            lending: Default::default(),
            logging: Default::default(),
        };

        let identity_store = Arc::new(MemoryIdentityStore::new());
        let lending_store = Arc::new(MemoryLendingStore::new());

        let state = libris_api::AppState::new(
            Arc::new(config),
            identity_store,
            lending_store.clone(),
        );
        let router = libris_api::build_router(state);

        Self {
            router,
            lending_store,
        }
    }

    /// Register a user through the API and return their ID
    pub async fn register_user(&self, username: &str, password: &str, role: &str) -> Uuid {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(serde_json::json!({
                    "email": format!("{username}@test.com"),
                    "username": username,
                    "full_name": username,
                    "password": password,
                    "role": role,
                })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Registration failed: {:?}",
            response.body
        );

        response.body["data"]["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("No user id in registration response")
    }

    /// Login and return a JWT access token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({
                    "username": username,
                    "password": password,
                })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response.body["data"]["access_token"]
            .as_str()
            .expect("No access_token in login response")
            .to_string()
    }

    /// Register and login in one step, returning the token
    pub async fn signup(&self, username: &str, role: &str) -> String {
        self.register_user(username, "correct-horse", role).await;
        self.login(username, "correct-horse").await
    }

    /// Seed a book directly in the store, returning its ID
    pub async fn seed_book(&self, title: &str, isbn: &str, copies: i32) -> Uuid {
        self.lending_store
            .insert_book(&NewBook {
                title: title.to_string(),
                author: "Test Author".to_string(),
                isbn: isbn.to_string(),
                description: None,
                total_copies: copies,
            })
            .await
            .expect("Failed to seed book")
            .id
    }

    /// Available copies of a seeded book, read through the API
    pub async fn available_copies(&self, book_id: Uuid) -> i64 {
        let response = self
            .request("GET", &format!("/api/books/{book_id}"), None, None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["data"]["available_copies"]
            .as_i64()
            .expect("No available_copies in book response")
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Router request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
