mod blocks;
mod config;
mod designer;
mod errors;
mod generation;
mod layout;
mod llm_client;
mod palette;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::backend::{GenerationBackend, ProxyClient};
use crate::generation::flow::GenerationSession;
use crate::layout::{MetricMeasurer, TypographyConfig};
use crate::llm_client::UpstreamClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Designer API v{}", env!("CARGO_PKG_VERSION"));

    // Generation backend: direct upstream by default, proxy when configured
    let backend: Arc<dyn GenerationBackend> = match &config.generation_proxy_url {
        Some(url) => {
            info!(url = %url, "Generation backend: proxy");
            Arc::new(ProxyClient::new(url.clone()))
        }
        None => {
            if config.deepseek_api_key.is_none() {
                warn!("DEEPSEEK_API_KEY is not set; text generation will fail");
            }
            if config.recraft_api_key.is_none() {
                warn!("RECRAFT_API_KEY is not set; designs will be text-only");
            }
            info!("Generation backend: upstream");
            Arc::new(UpstreamClient::new(&config))
        }
    };

    let typography = TypographyConfig::default();
    info!(
        format = ?config.canvas_format,
        header_px = typography.header.base_size_px,
        body_px = typography.body.base_size_px,
        "Layout defaults"
    );

    let state = AppState {
        config: config.clone(),
        backend,
        session: Arc::new(GenerationSession::new()),
        typography,
        measurer: Arc::new(MetricMeasurer),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
