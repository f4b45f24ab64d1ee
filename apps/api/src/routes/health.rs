use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "designer"
    }))
}

/// GET /api/debug-env
/// Reports which upstream keys are configured. Never returns key material.
pub async fn debug_env_handler(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "deepseekKeyExists": config.deepseek_api_key.is_some(),
        "recraftKeyExists": config.recraft_api_key.is_some(),
        "proxyBackend": config.generation_proxy_url.is_some(),
        "canvasFormat": config.canvas_format,
    }))
}
