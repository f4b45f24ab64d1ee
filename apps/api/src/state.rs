use std::sync::Arc;

use crate::config::Config;
use crate::designer::Designer;
use crate::generation::backend::GenerationBackend;
use crate::generation::flow::GenerationSession;
use crate::layout::{CanvasFormat, TextMeasurer, TypographyConfig};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Text/image generation. Default: `UpstreamClient`; `ProxyClient` when
    /// GENERATION_PROXY_URL is set.
    pub backend: Arc<dyn GenerationBackend>,
    /// One generation at a time; remembers the last prompt for retry.
    pub session: Arc<GenerationSession>,
    pub typography: TypographyConfig,
    /// Text measurement used by every layout pass. Default: `MetricMeasurer`.
    pub measurer: Arc<dyn TextMeasurer>,
}

impl AppState {
    /// A fresh designer for one request, in `format` or the configured default.
    pub fn designer(&self, format: Option<CanvasFormat>) -> Designer {
        Designer::new(
            format.unwrap_or(self.config.canvas_format),
            self.typography.clone(),
            self.measurer.clone(),
        )
    }

    #[cfg(test)]
    pub fn for_tests(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            config: Config::offline(),
            backend,
            session: Arc::new(GenerationSession::new()),
            typography: TypographyConfig::default(),
            measurer: Arc::new(crate::layout::MetricMeasurer),
        }
    }
}
