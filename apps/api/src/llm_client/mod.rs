//! Upstream AI client — the only module that talks to DeepSeek and Recraft directly.
//!
//! Calls are single-shot: no retries, no backoff. Callers decide whether a
//! failure aborts their flow (text) or degrades it (image).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Config;

pub mod prompts;

use prompts::{
    copy_prompt, IMAGE_RESPONSE_FORMAT, IMAGE_SIZE, TEXT_MAX_TOKENS, TEXT_MODEL, TEXT_TEMPERATURE,
};

const INSUFFICIENT_CREDITS_MARKER: &str = "not_enough_credits";

/// Largest generated image accepted for download.
const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error: {status} - {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} environment variable is not set")]
    MissingKey(&'static str),

    #[error("Image generation temporarily unavailable (insufficient credits). Please try again later.")]
    InsufficientCredits,

    #[error("image download exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("{0} returned empty content")]
    EmptyContent(&'static str),
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    style_id: &'a str,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Direct client for the text (DeepSeek) and image (Recraft) services.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    deepseek_api_key: Option<String>,
    deepseek_api_url: String,
    recraft_api_key: Option<String>,
    recraft_api_url: String,
    default_style_id: String,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            deepseek_api_key: config.deepseek_api_key.clone(),
            deepseek_api_url: config.deepseek_api_url.clone(),
            recraft_api_key: config.recraft_api_key.clone(),
            recraft_api_url: config.recraft_api_url.clone(),
            default_style_id: config.recraft_default_style_id.clone(),
        }
    }

    /// Asks the text model for line-oriented layout copy (`HEADER: ...` etc).
    pub async fn generate_text(&self, user_prompt: &str) -> Result<String, UpstreamError> {
        let api_key = self
            .deepseek_api_key
            .as_deref()
            .ok_or(UpstreamError::MissingKey("DEEPSEEK_API_KEY"))?;

        let instruction = copy_prompt(user_prompt);
        let body = ChatRequest {
            model: TEXT_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: &instruction,
            }],
            temperature: TEXT_TEMPERATURE,
            max_tokens: TEXT_MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.deepseek_api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %message, "DeepSeek API error");
            return Err(UpstreamError::Api {
                service: "DeepSeek",
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&response.text().await?)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(UpstreamError::EmptyContent("DeepSeek"))?;

        debug!(chars = content.len(), "DeepSeek call succeeded");
        Ok(content)
    }

    /// Generates an image and returns its URL. `style_id` falls back to the
    /// configured default when absent or blank.
    pub async fn generate_image(
        &self,
        prompt: &str,
        style_id: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let api_key = self
            .recraft_api_key
            .as_deref()
            .ok_or(UpstreamError::MissingKey("RECRAFT_API_KEY"))?;

        let style_id = style_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.default_style_id.as_str());

        let body = ImageRequest {
            prompt,
            style_id,
            size: IMAGE_SIZE,
            response_format: IMAGE_RESPONSE_FORMAT,
        };

        let response = self
            .client
            .post(&self.recraft_api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %message, "Recraft API error");
            return Err(classify_image_failure(status.as_u16(), message));
        }

        let parsed: ImageResponse = serde_json::from_str(&response.text().await?)?;
        let url = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or(UpstreamError::EmptyContent("Recraft"))?;

        debug!(style_id, "Recraft call succeeded");
        Ok(url)
    }

    /// Downloads image bytes (for palette extraction).
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, UpstreamError> {
        fetch_bytes(&self.client, url).await
    }
}

/// Maps a failed image response to an error, surfacing credit exhaustion distinctly.
fn classify_image_failure(status: u16, body: String) -> UpstreamError {
    if body.contains(INSUFFICIENT_CREDITS_MARKER) {
        UpstreamError::InsufficientCredits
    } else {
        UpstreamError::Api {
            service: "Recraft",
            status,
            message: body,
        }
    }
}

pub(crate) async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, UpstreamError> {
    fetch_bytes_capped(client, url, MAX_IMAGE_BYTES).await
}

/// Downloads `url`, failing as soon as the body is known to exceed `limit` bytes.
async fn fetch_bytes_capped(
    client: &Client,
    url: &str,
    limit: usize,
) -> Result<Vec<u8>, UpstreamError> {
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Api {
            service: "Image host",
            status: status.as_u16(),
            message: format!("could not download {url}"),
        });
    }
    if response.content_length().map_or(false, |len| len > limit as u64) {
        return Err(UpstreamError::TooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(UpstreamError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    debug!(bytes = body.len(), "Image downloaded");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};

    async fn serve_bytes(len: usize) -> String {
        let app = Router::new().route("/image.png", get(move || async move { vec![7u8; len] }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/image.png")
    }

    #[tokio::test]
    async fn test_fetch_within_limit_returns_body() {
        let url = serve_bytes(512).await;
        let body = fetch_bytes_capped(&Client::new(), &url, 1024).await.unwrap();
        assert_eq!(body.len(), 512);
    }

    #[tokio::test]
    async fn test_fetch_over_limit_is_rejected() {
        let url = serve_bytes(4096).await;
        let err = fetch_bytes_capped(&Client::new(), &url, 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::TooLarge { limit: 1024 }));
    }

    #[test]
    fn test_credit_exhaustion_gets_friendly_error() {
        let err = classify_image_failure(
            402,
            r#"{"code":"not_enough_credits","message":"Top up"}"#.to_string(),
        );
        assert!(matches!(err, UpstreamError::InsufficientCredits));
        assert!(err.to_string().contains("insufficient credits"));
    }

    #[test]
    fn test_other_image_failures_keep_status() {
        let err = classify_image_failure(500, "boom".to_string());
        assert_eq!(err.to_string(), "Recraft API error: 500 - boom");
    }

    #[test]
    fn test_chat_response_shape() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"HEADER: Hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("HEADER: Hi"));
    }

    #[test]
    fn test_image_response_shape() {
        let parsed: ImageResponse =
            serde_json::from_str(r#"{"created":1,"data":[{"url":"https://img/1.png"}]}"#).unwrap();
        assert_eq!(parsed.data[0].url.as_deref(), Some("https://img/1.png"));
    }

    #[test]
    fn test_image_request_serializes_snake_case() {
        let body = ImageRequest {
            prompt: "p",
            style_id: "s",
            size: IMAGE_SIZE,
            response_format: IMAGE_RESPONSE_FORMAT,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["style_id"], "s");
        assert_eq!(json["size"], "1024x1024");
        assert_eq!(json["response_format"], "url");
    }
}
