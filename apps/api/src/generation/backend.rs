//! Generation backends — pluggable, trait-based access to the text and image services.
//!
//! `UpstreamClient` calls DeepSeek / Recraft directly. `ProxyClient` consumes the
//! `/api/generate-text` and `/api/generate-image` endpoints of a running
//! instance of this service.
//!
//! `AppState` holds an `Arc<dyn GenerationBackend>`, chosen at startup via config.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::{fetch_bytes, UpstreamClient, UpstreamError};

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Returns the raw line-oriented copy for `prompt`.
    async fn generate_text(&self, prompt: &str) -> Result<String, UpstreamError>;

    /// Returns the URL of a generated image.
    async fn generate_image(
        &self,
        prompt: &str,
        style_id: Option<&str>,
    ) -> Result<String, UpstreamError>;

    /// Downloads an image so its colors can be extracted.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, UpstreamError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Direct upstream
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl GenerationBackend for UpstreamClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, UpstreamError> {
        UpstreamClient::generate_text(self, prompt).await
    }

    async fn generate_image(
        &self,
        prompt: &str,
        style_id: Option<&str>,
    ) -> Result<String, UpstreamError> {
        UpstreamClient::generate_image(self, prompt, style_id).await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, UpstreamError> {
        UpstreamClient::fetch_image(self, url).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Proxy consumer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    error: String,
}

/// HTTP consumer of the text/image proxy endpoints.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        service: &'static str,
        body: &B,
    ) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            // any non-2xx is a recoverable failure; surface the proxy's message if present
            let message = serde_json::from_str::<ProxyErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(UpstreamError::Api {
                service,
                status: status.as_u16(),
                message,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for ProxyClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, UpstreamError> {
        let body = self
            .post("/api/generate-text", "Text proxy", &TextRequest { prompt })
            .await?;
        let parsed: TextResponse = serde_json::from_str(&body)?;
        let content = parsed
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(UpstreamError::EmptyContent("Text proxy"))?;
        debug!(chars = content.len(), "Text proxy call succeeded");
        Ok(content)
    }

    async fn generate_image(
        &self,
        prompt: &str,
        style_id: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let body = self
            .post(
                "/api/generate-image",
                "Image proxy",
                &ImageRequest { prompt, style_id },
            )
            .await?;
        let parsed: ImageResponse = serde_json::from_str(&body)?;
        parsed
            .image_url
            .filter(|u| !u.is_empty())
            .ok_or(UpstreamError::EmptyContent("Image proxy"))
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, UpstreamError> {
        fetch_bytes(&self.client, url).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
