//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::blocks::Block;
use crate::designer::DesignLayout;
use crate::errors::AppError;
use crate::generation::content::GeneratedContent;
use crate::generation::flow::GeneratedDesign;
use crate::palette::Palette;
use crate::routes::layout::{layout_options, parse_format, run_layout};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateTextResponse {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    pub prompt: Option<String>,
    pub style_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRequest {
    #[serde(default)]
    pub prompt: String,
    pub style_id: Option<String>,
    pub format: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryRequest {
    pub format: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignResponse {
    pub prompt: String,
    pub content: GeneratedContent,
    pub blocks: Vec<Block>,
    pub image_url: Option<String>,
    pub image_failed: bool,
    pub palettes: Vec<Palette>,
    pub layout: DesignLayout,
    pub generated_at: DateTime<Utc>,
}

fn required_prompt(prompt: Option<String>, message: &str) -> Result<String, AppError> {
    prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Proxy handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate-text
///
/// Returns line-oriented copy (`HEADER:`, `SUBHEADER:`, ...) for a prompt.
pub async fn handle_generate_text(
    State(state): State<AppState>,
    Json(request): Json<GenerateTextRequest>,
) -> Result<Json<GenerateTextResponse>, AppError> {
    let prompt = required_prompt(request.prompt, "Prompt is required")?;
    info!(chars = prompt.len(), "Starting text generation");

    let content = state
        .backend
        .generate_text(&prompt)
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to generate text: {e}")))?;

    Ok(Json(GenerateTextResponse { content }))
}

/// POST /api/generate-image
///
/// Returns the URL of an image generated for the prompt in the requested style.
pub async fn handle_generate_image(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, AppError> {
    let prompt = required_prompt(request.prompt, "Image prompt is required")?;

    let image_url = state
        .backend
        .generate_image(&prompt, request.style_id.as_deref())
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to generate image: {e}")))?;

    Ok(Json(GenerateImageResponse { image_url }))
}

// ────────────────────────────────────────────────────────────────────────────
// Design handlers
// ────────────────────────────────────────────────────────────────────────────

async fn respond(
    state: &AppState,
    design: GeneratedDesign,
    format: Option<String>,
    seed: Option<u64>,
) -> Result<Json<DesignResponse>, AppError> {
    let format = parse_format(format.as_deref())?;
    let mut designer = state.designer(format);
    designer.apply_generated(&design)?;

    let layout = run_layout(designer, layout_options(seed))
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("generated design has no blocks")))?;

    Ok(Json(DesignResponse {
        prompt: design.prompt,
        content: design.content,
        blocks: design.blocks,
        image_url: design.image_url,
        image_failed: design.image_failed,
        palettes: design.palettes,
        layout,
        generated_at: design.generated_at,
    }))
}

/// POST /api/design
///
/// Full pipeline: copy generation → blocks → image + palettes → layout.
/// Only one design is generated at a time; a concurrent request gets 409.
pub async fn handle_design(
    State(state): State<AppState>,
    Json(request): Json<DesignRequest>,
) -> Result<Json<DesignResponse>, AppError> {
    // validate before spending an upstream call
    parse_format(request.format.as_deref())?;

    let design = state
        .session
        .generate(
            &request.prompt,
            request.style_id.as_deref(),
            state.backend.as_ref(),
        )
        .await?;

    respond(&state, design, request.format, request.seed).await
}

/// POST /api/design/retry
///
/// Re-runs the last design prompt. The body is optional.
pub async fn handle_design_retry(
    State(state): State<AppState>,
    request: Option<Json<RetryRequest>>,
) -> Result<Json<DesignResponse>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    parse_format(request.format.as_deref())?;

    let design = state.session.retry(state.backend.as_ref()).await?;

    respond(&state, design, request.format, request.seed).await
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
