//! Shared geometry and weight helpers used by the partition engine and the renderer.
//!
//! All coordinates are CSS pixels on the logical canvas (before any preview scaling).

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Split constants
// ────────────────────────────────────────────────────────────────────────────

/// No region may receive less than this fraction of its parent.
pub const MIN_SPLIT_RATIO: f32 = 0.2;
/// No region may receive more than this fraction of its parent.
pub const MAX_SPLIT_RATIO: f32 = 0.8;

/// Medium weight, used whenever a block carries no usable weight.
pub const DEFAULT_WEIGHT: u32 = 2;
/// Weight assigned to hero blocks that were not given an explicit weight.
pub const HERO_WEIGHT: u32 = 4;

// ────────────────────────────────────────────────────────────────────────────
// Axis
// ────────────────────────────────────────────────────────────────────────────

/// Direction in which a split lays out its two children.
///
/// `Row` places children side by side (splits the width),
/// `Column` stacks them (splits the height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    #[serde(alias = "col")]
    Column,
}

impl Axis {
    pub fn toggle(self) -> Self {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rect / Size
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle with origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn area(&self) -> f32 {
        self.size().area()
    }

    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Splits this rect along `axis`, giving `ratio` of the extent to the first half.
    pub fn split(&self, axis: Axis, ratio: f32) -> (Rect, Rect) {
        let ratio = ratio.clamp(0.0, 1.0);
        match axis {
            Axis::Row => {
                let wa = self.width * ratio;
                (
                    Rect::new(self.x, self.y, wa, self.height),
                    Rect::new(self.x + wa, self.y, self.width - wa, self.height),
                )
            }
            Axis::Column => {
                let ha = self.height * ratio;
                (
                    Rect::new(self.x, self.y, self.width, ha),
                    Rect::new(self.x, self.y + ha, self.width, self.height - ha),
                )
            }
        }
    }

    /// Shrinks the rect by `padding` on every side. Never produces negative extents.
    pub fn inset(&self, padding: f32) -> Rect {
        let pad_x = padding.min(self.width / 2.0).max(0.0);
        let pad_y = padding.min(self.height / 2.0).max(0.0);
        Rect::new(
            self.x + pad_x,
            self.y + pad_y,
            self.width - 2.0 * pad_x,
            self.height - 2.0 * pad_y,
        )
    }

    /// Largest rect with the given aspect ratio (w / h) that fits inside `self`, centered.
    pub fn contain(&self, aspect_ratio: f32) -> Rect {
        if self.is_empty() || !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return *self;
        }
        let own_ratio = self.width / self.height;
        let (w, h) = if own_ratio > aspect_ratio {
            (self.height * aspect_ratio, self.height)
        } else {
            (self.width, self.width / aspect_ratio)
        };
        Rect::new(
            self.x + (self.width - w) / 2.0,
            self.y + (self.height - h) / 2.0,
            w,
            h,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas formats
// ────────────────────────────────────────────────────────────────────────────

/// Output canvas presets offered by the format chooser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanvasFormat {
    #[default]
    #[serde(rename = "16-9")]
    Widescreen,
    #[serde(rename = "1-1")]
    Square,
    #[serde(rename = "a4")]
    A4,
    #[serde(rename = "a4landscape")]
    A4Landscape,
}

impl CanvasFormat {
    pub fn size(&self) -> Size {
        match self {
            CanvasFormat::Widescreen => Size::new(1600.0, 900.0),
            CanvasFormat::Square => Size::new(1200.0, 1200.0),
            CanvasFormat::A4 => Size::new(1000.0, 1400.0),
            CanvasFormat::A4Landscape => Size::new(1400.0, 1000.0),
        }
    }

    /// Parses the format identifiers used by the format chooser (`16-9`, `1-1`, `a4`, `a4landscape`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "16-9" => Some(CanvasFormat::Widescreen),
            "1-1" => Some(CanvasFormat::Square),
            "a4" => Some(CanvasFormat::A4),
            "a4landscape" => Some(CanvasFormat::A4Landscape),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Weight helpers
// ────────────────────────────────────────────────────────────────────────────

/// Maps a zero weight to the default so ratio math never divides by zero.
pub fn normalize_weight(weight: u32) -> u32 {
    if weight == 0 {
        DEFAULT_WEIGHT
    } else {
        weight
    }
}

/// Clamps a split ratio to `[MIN_SPLIT_RATIO, MAX_SPLIT_RATIO]`.
/// Non-finite input collapses to an even split.
pub fn clamp_ratio(ratio: f32) -> f32 {
    if !ratio.is_finite() {
        return 0.5;
    }
    ratio.clamp(MIN_SPLIT_RATIO, MAX_SPLIT_RATIO)
}

/// `part / total` as a clamped split ratio.
pub fn weight_ratio(part: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.5;
    }
    clamp_ratio((part as f64 / total as f64) as f32)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
