//! Video-sharing platform backend.
//!
//! Accounts with JWT access/refresh sessions delivered as cookies, profile
//! media pushed to an external asset host, and channel subscriptions.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use handlers::http;

/// JSON bodies are small; multipart uploads carry images.
pub const JSON_BODY_LIMIT: usize = 16 * 1024;
pub const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Build the API router under `/api/v1`. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let upload_routes = axum::Router::new()
        .route("/users/register", post(auth::register))
        .route("/users/avatar", patch(handlers::update_avatar))
        .route("/users/cover-image", patch(handlers::update_cover_image))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let json_routes = axum::Router::new()
        .route("/healthcheck", get(http::health))
        .route("/users/login", post(auth::login))
        .route("/users/logout", post(auth::logout))
        .route("/users/refresh-token", post(auth::refresh_token))
        .route("/users/change-password", post(auth::change_password))
        .route("/users/current-user", get(handlers::current_user))
        .route("/users/update-account", patch(handlers::update_account))
        .route("/users/c/:username", get(handlers::channel_profile))
        .route(
            "/subscriptions/c/:channel_id",
            post(handlers::toggle_subscription),
        )
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));

    axum::Router::new()
        .nest("/api/v1", upload_routes.merge(json_routes))
        .with_state(state)
}
