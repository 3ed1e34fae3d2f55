//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes as usize;

    Router::new()
        .route("/quests/random", get(handlers::random_quest))
        .route("/quests/{quest_id}/check", post(handlers::check_answer))
        .route("/users/{user_id}/quests", get(handlers::user_quest_history))
        .route("/uploads", post(handlers::upload_media))
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
