//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let serve_uploads = ServeDir::new(&state.settings.upload.dir);

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket subscription gateway endpoint
        .route("/gateway", get(ws_handler))
        // Static serving of uploaded images
        .nest_service("/uploads", serve_uploads)
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public routes
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes (require authentication)
        .nest("/users", user_routes(state.clone()))
        .nest("/chats", chat_routes(state.clone()))
        .nest("/upload", upload_routes(state))
}

/// Authentication routes (register/login public, logout protected)
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .merge(
            Router::new()
                .route("/logout", post(handlers::auth::logout))
                .route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}

/// User routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/@me", get(handlers::user::get_current_user))
        .route("/", get(handlers::user::list_users))
        .route("/{user_id}", get(handlers::user::get_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Chat routes (protected)
fn chat_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::chat::list_chats))
        .route("/group", post(handlers::chat::create_group_chat))
        .route("/direct", post(handlers::chat::create_direct_chat))
        .route("/{chat_id}", get(handlers::chat::get_chat))
        .route("/{chat_id}/messages", get(handlers::message::get_messages))
        .route("/{chat_id}/messages", post(handlers::message::send_message))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Upload routes (protected)
fn upload_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/image", post(handlers::upload::upload_image))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
