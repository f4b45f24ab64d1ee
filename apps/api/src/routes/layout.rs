//! Axum route handler for the Layout API, plus helpers shared with the design endpoint.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::blocks::Block;
use crate::designer::{DesignLayout, Designer};
use crate::errors::AppError;
use crate::layout::{CanvasFormat, LayoutOptions};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub blocks: Vec<Value>,
    pub format: Option<String>,
    pub seed: Option<u64>,
    /// Palette position in the active pool; wraps around.
    #[serde(default)]
    pub palette_index: usize,
    /// Advance one palette past `palette_index`.
    #[serde(default)]
    pub shuffle: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn parse_format(format: Option<&str>) -> Result<Option<CanvasFormat>, AppError> {
    format
        .map(|f| {
            CanvasFormat::parse(f).ok_or_else(|| {
                AppError::Validation(format!(
                    "Unknown format '{f}'; expected 16-9, 1-1, a4 or a4landscape"
                ))
            })
        })
        .transpose()
}

pub(crate) fn layout_options(seed: Option<u64>) -> LayoutOptions {
    LayoutOptions {
        variety_seed: seed,
        ..LayoutOptions::default()
    }
}

/// Runs the CPU-bound layout pass off the async executor.
pub(crate) async fn run_layout(
    designer: Designer,
    options: LayoutOptions,
) -> Result<Option<DesignLayout>, AppError> {
    tokio::task::spawn_blocking(move || designer.layout(&options))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))
}

fn parse_blocks(raw: Vec<Value>) -> Result<Vec<Block>, AppError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value::<Block>(value)
                .map_err(|e| AppError::Validation(format!("blocks[{i}]: {e}")))
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Handler
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/layout
///
/// Partitions the given blocks onto the canvas and fits their text.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<DesignLayout>, AppError> {
    let format = parse_format(request.format.as_deref())?;
    let blocks = parse_blocks(request.blocks)?;

    let mut designer = state.designer(format).with_blocks(blocks)?;
    designer.select_palette(request.palette_index);
    if request.shuffle {
        designer.shuffle_palette();
    }

    let layout = run_layout(designer, layout_options(request.seed))
        .await?
        .ok_or_else(|| AppError::Validation("No blocks ready for layout".to_string()))?;

    Ok(Json(layout))
}
