//! Route definitions for the Libris HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(book_routes())
        .merge(reservation_routes())
        .merge(user_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Auth endpoints: register, login, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
}

/// Catalog and lending endpoints
fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(handlers::books::list_books))
        .route("/books", post(handlers::books::create_book))
        .route("/books/{id}", get(handlers::books::get_book))
        .route("/books/{id}", put(handlers::books::update_book))
        .route("/books/{id}", delete(handlers::books::delete_book))
        .route("/books/{id}/reserve", post(handlers::books::reserve_book))
        .route("/books/{id}/return", put(handlers::books::return_book))
}

/// Reservation listing and administrative overrides
fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route("/reservations", get(handlers::reservations::list_all))
        .route("/reservations/mine", get(handlers::reservations::list_mine))
        .route(
            "/reservations/{id}",
            get(handlers::reservations::get_reservation),
        )
        .route(
            "/reservations/{id}/status",
            put(handlers::reservations::override_status),
        )
}

/// User administration endpoints
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/users/{id}/role", put(handlers::users::change_role))
}

/// Health check endpoint (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let allowed = &state.config.server.allowed_origins;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if allowed.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed.iter().filter_map(|o| o.parse().ok()).collect();
        cors = cors.allow_origin(origins);
    }

    cors
}
