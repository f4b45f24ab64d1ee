//! Renderer — turns a partition tree into concrete canvas regions and fits text per leaf.
//!
//! The renderer owns no layout policy of its own: split ratios come from the
//! partition engine and font sizes from the fitter. It only resolves geometry
//! and runs the fitter until the result settles.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blocks::{Block, BlockContent, BlockKind};
use crate::layout::geometry::{Rect, Size};
use crate::layout::partition::PartitionNode;
use crate::layout::typography::{fit_text, TextMeasurer, TextStyle, TypographyConfig};

const DEFAULT_LEAF_PADDING_PX: f32 = 24.0;
const DEFAULT_SETTLE_PASSES: u32 = 2;

// ────────────────────────────────────────────────────────────────────────────
// Options / output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    /// When set, each split may be mirrored (children swap sides, keeping their
    /// share of space). The same seed always produces the same layout.
    pub variety_seed: Option<u64>,
    /// Upper bound on fit passes; stops early once sizes stop changing.
    pub settle_passes: u32,
    pub leaf_padding_px: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            variety_seed: None,
            settle_passes: DEFAULT_SETTLE_PASSES,
            leaf_padding_px: DEFAULT_LEAF_PADDING_PX,
        }
    }
}

/// One materialized leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedRegion {
    pub block_id: String,
    pub kind: BlockKind,
    /// Full cell assigned by the partition tree.
    pub rect: Rect,
    /// Where the content actually sits: the padded cell, or for aspect-preserving
    /// images the largest aspect-correct rect centered inside it.
    pub content_rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Fitted style for text leaves. `None` for images and zero-area cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    pub overflowing: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLayout {
    pub canvas: Size,
    pub regions: Vec<PlacedRegion>,
    /// Fit passes actually run.
    pub fit_passes: u32,
}

impl RenderedLayout {
    pub fn region(&self, block_id: &str) -> Option<&PlacedRegion> {
        self.regions.iter().find(|r| r.block_id == block_id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Render
// ────────────────────────────────────────────────────────────────────────────

/// Resolves `tree` against a canvas of `canvas` size and fits every text leaf.
pub fn render_layout(
    tree: &PartitionNode,
    canvas: Size,
    measurer: &dyn TextMeasurer,
    typography: &TypographyConfig,
    options: &LayoutOptions,
) -> RenderedLayout {
    let mut rng = options.variety_seed.map(StdRng::seed_from_u64);
    let mut regions = Vec::new();
    place(
        tree,
        Rect::from_size(canvas),
        options.leaf_padding_px,
        &mut rng,
        &mut regions,
    );

    let fit_passes = settle_text(&mut regions, measurer, typography, options.settle_passes);
    debug!(
        regions = regions.len(),
        fit_passes, "Layout rendered"
    );

    RenderedLayout {
        canvas,
        regions,
        fit_passes,
    }
}

fn place(
    node: &PartitionNode,
    rect: Rect,
    padding: f32,
    rng: &mut Option<StdRng>,
    out: &mut Vec<PlacedRegion>,
) {
    match node {
        PartitionNode::Leaf { block } => out.push(place_leaf(block, rect, padding)),
        PartitionNode::Split { axis, ratio, a, b } => {
            let mirrored = rng.as_mut().map_or(false, |r| r.gen_bool(0.5));
            let (rect_a, rect_b) = if mirrored {
                let (first, second) = rect.split(*axis, 1.0 - ratio);
                (second, first)
            } else {
                rect.split(*axis, *ratio)
            };
            place(a, rect_a, padding, rng, out);
            place(b, rect_b, padding, rng, out);
        }
    }
}

fn place_leaf(block: &Block, rect: Rect, padding: f32) -> PlacedRegion {
    let padded = rect.inset(padding);
    let (content_rect, text, src) = match &block.content {
        BlockContent::Text(text) => (padded, Some(text.clone()), None),
        BlockContent::Image(image) => {
            let content_rect = match (block.preserve_aspect, block.aspect_ratio()) {
                (true, Some(ratio)) => padded.contain(ratio),
                _ => padded,
            };
            (content_rect, None, Some(image.src.clone()))
        }
    };

    PlacedRegion {
        block_id: block.id.clone(),
        kind: block.kind,
        rect,
        content_rect,
        text,
        src,
        style: None,
        overflowing: false,
    }
}

/// Runs the fitter over every text region until two consecutive passes agree,
/// or `max_passes` is reached. Returns the number of passes run.
///
/// Region geometry is fixed once placed, so with a deterministic measurer the
/// second pass only confirms the first (the fit is idempotent). Passes beyond
/// that run only for a measurer whose results drift.
fn settle_text(
    regions: &mut [PlacedRegion],
    measurer: &dyn TextMeasurer,
    typography: &TypographyConfig,
    max_passes: u32,
) -> u32 {
    let mut passes = 0;
    for pass in 1..=max_passes.max(1) {
        passes = pass;
        let mut changed = false;

        for region in regions.iter_mut() {
            let Some(text) = region.text.as_deref() else {
                continue;
            };
            let size = region.content_rect.size();
            let wrap_width = typography.available_size(size).width;
            let outcome = fit_text(size, region.kind, typography, |style| {
                measurer.measure(text, style, wrap_width)
            });

            let style = outcome.map(|o| o.style);
            if style != region.style {
                changed = true;
            }
            region.style = style;
            region.overflowing = outcome.map_or(false, |o| o.overflowing);
        }

        if pass > 1 && !changed {
            break;
        }
        if pass == max_passes.max(1) && pass > 1 {
            debug!(passes = pass, "Text fit did not settle");
        }
    }
    passes
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
