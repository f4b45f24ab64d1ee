pub mod health;
pub mod layout;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/debug-env", get(health::debug_env_handler))
        // Layout API
        .route("/api/layout", post(layout::handle_layout))
        // Generation proxies
        .route("/api/generate-text", post(handlers::handle_generate_text))
        .route("/api/generate-image", post(handlers::handle_generate_image))
        // Design API
        .route("/api/design", post(handlers::handle_design))
        .route("/api/design/retry", post(handlers::handle_design_retry))
        .with_state(state)
}
