use anyhow::{Context, Result};

use crate::layout::CanvasFormat;
use crate::llm_client::prompts::DEFAULT_STYLE_ID;

const DEFAULT_DEEPSEEK_API_URL: &str = "https://api.deepseek.com/chat/completions";
const DEFAULT_RECRAFT_API_URL: &str = "https://external.api.recraft.ai/v1/images/generations";

/// Application configuration loaded from environment variables.
/// API keys are optional: the service starts without them and the affected
/// endpoints fail with a clear error instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub deepseek_api_key: Option<String>,
    pub deepseek_api_url: String,
    pub recraft_api_key: Option<String>,
    pub recraft_api_url: String,
    pub recraft_default_style_id: String,
    /// When set, `/api/design` generates through these proxy endpoints instead
    /// of calling the upstream services directly.
    pub generation_proxy_url: Option<String>,
    pub canvas_format: CanvasFormat,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let canvas_format = match optional_env("CANVAS_FORMAT") {
            Some(value) => CanvasFormat::parse(&value).with_context(|| {
                format!("CANVAS_FORMAT '{value}' must be one of 16-9, 1-1, a4, a4landscape")
            })?,
            None => CanvasFormat::default(),
        };

        Ok(Config {
            deepseek_api_key: optional_env("DEEPSEEK_API_KEY"),
            deepseek_api_url: optional_env("DEEPSEEK_API_URL")
                .unwrap_or_else(|| DEFAULT_DEEPSEEK_API_URL.to_string()),
            recraft_api_key: optional_env("RECRAFT_API_KEY"),
            recraft_api_url: optional_env("RECRAFT_API_URL")
                .unwrap_or_else(|| DEFAULT_RECRAFT_API_URL.to_string()),
            recraft_default_style_id: optional_env("RECRAFT_DEFAULT_STYLE_ID")
                .unwrap_or_else(|| DEFAULT_STYLE_ID.to_string()),
            generation_proxy_url: optional_env("GENERATION_PROXY_URL"),
            canvas_format,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Config with no keys and default endpoints, independent of the environment.
    pub fn offline() -> Self {
        Config {
            deepseek_api_key: None,
            deepseek_api_url: DEFAULT_DEEPSEEK_API_URL.to_string(),
            recraft_api_key: None,
            recraft_api_url: DEFAULT_RECRAFT_API_URL.to_string(),
            recraft_default_style_id: DEFAULT_STYLE_ID.to_string(),
            generation_proxy_url: None,
            canvas_format: CanvasFormat::default(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

/// Reads a variable, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
