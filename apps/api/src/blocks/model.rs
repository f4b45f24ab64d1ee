//! Content block model — the unit of input to the layout engine.
//!
//! `Block` is the validated in-memory form. On the wire it travels as a flat
//! `BlockRecord` (`{id, kind, content|src, sizeWeight, isHero?, preserveAspect?,
//! aspectRatio?, width?, height?}`), converted through `TryFrom` so that every
//! `Block` in the process already satisfies the model invariants.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::layout::geometry::{normalize_weight, DEFAULT_WEIGHT, HERO_WEIGHT};

/// |ratio − 1| below this classifies an image as square.
const SQUARE_TOLERANCE: f32 = 0.1;

// ────────────────────────────────────────────────────────────────────────────
// Kinds
// ────────────────────────────────────────────────────────────────────────────

/// Semantic kind of a block. Drives typography defaults and the direction heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Header,
    Subheader,
    // Older layouts used finer-grained text styles that all render as body copy.
    #[serde(alias = "caption", alias = "lead", alias = "small")]
    Body,
    Logo,
    Image,
}

impl BlockKind {
    /// Header, subheader and body. Logos are text too but are not counted as
    /// running copy by the direction heuristic.
    pub fn is_copy(&self) -> bool {
        matches!(
            self,
            BlockKind::Header | BlockKind::Subheader | BlockKind::Body
        )
    }

    pub fn is_image(&self) -> bool {
        matches!(self, BlockKind::Image)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Header => "header",
            BlockKind::Subheader => "subheader",
            BlockKind::Body => "body",
            BlockKind::Logo => "logo",
            BlockKind::Image => "image",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Image metadata
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

/// Intrinsic pixel dimensions of a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. `None` for degenerate images.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(self.width as f32 / self.height as f32)
    }

    pub fn orientation(&self) -> Option<Orientation> {
        let ratio = self.aspect_ratio()?;
        Some(if (ratio - 1.0).abs() < SQUARE_TOLERANCE {
            Orientation::Square
        } else if ratio > 1.0 {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        })
    }
}

/// Image reference plus its intrinsic size, once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub src: String,
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Text(String),
    Image(ImageSource),
}

// ────────────────────────────────────────────────────────────────────────────
// Block
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum BlockError {
    #[error("block '{0}' is a text block but has no content")]
    MissingText(String),

    #[error("block '{0}' is an image block but has no src")]
    MissingSource(String),

    #[error("block '{0}': width and height must be given together")]
    PartialDimensions(String),
}

/// A content unit to be laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlockRecord", into = "BlockRecord")]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    pub content: BlockContent,
    /// Always ≥ 1. 1 = small, 2 = medium, 3 = large, 4 = hero.
    pub size_weight: u32,
    pub is_hero: bool,
    /// Image-only: keep the intrinsic aspect ratio instead of cropping to fill.
    pub preserve_aspect: bool,
}

impl Block {
    /// A text block of the given kind with a fresh id and medium weight.
    pub fn text(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content: BlockContent::Text(content.into()),
            size_weight: DEFAULT_WEIGHT,
            is_hero: false,
            preserve_aspect: false,
        }
    }

    pub fn image(src: impl Into<String>, dimensions: Option<Dimensions>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: BlockKind::Image,
            content: BlockContent::Image(ImageSource {
                src: src.into(),
                dimensions,
            }),
            size_weight: DEFAULT_WEIGHT,
            is_hero: false,
            preserve_aspect: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.size_weight = normalize_weight(weight);
        self
    }

    /// Flags the block as hero and lifts its weight to at least [`HERO_WEIGHT`].
    pub fn hero(mut self) -> Self {
        self.is_hero = true;
        self.size_weight = self.size_weight.max(HERO_WEIGHT);
        self
    }

    pub fn preserving_aspect(mut self, preserve: bool) -> Self {
        self.preserve_aspect = preserve;
        self
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            BlockContent::Text(text) => Some(text),
            BlockContent::Image(_) => None,
        }
    }

    pub fn image_source(&self) -> Option<&ImageSource> {
        match &self.content {
            BlockContent::Image(image) => Some(image),
            BlockContent::Text(_) => None,
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.image_source().and_then(|image| image.dimensions)
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        self.dimensions().and_then(|d| d.aspect_ratio())
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.dimensions().and_then(|d| d.orientation())
    }

    /// True for an aspect-preserving image whose intrinsic size has not loaded yet.
    /// Such a block must not enter the partition engine.
    pub fn awaiting_dimensions(&self) -> bool {
        self.preserve_aspect && self.kind.is_image() && self.dimensions().is_none()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

/// Flat serialized shape of a block, shared with the renderer and palette consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "deserialize_weight")]
    pub size_weight: Option<u32>,
    #[serde(default, alias = "hero")]
    pub is_hero: bool,
    #[serde(default)]
    pub preserve_aspect: bool,
    /// Output only; derived from width/height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Accepts any JSON number (or null). Zero, negative and non-finite values
/// come back as `Some(0)` so they normalize to the default weight.
fn deserialize_weight<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.map(|w| {
        if w.is_finite() && w >= 1.0 {
            w.round().min(u32::MAX as f64) as u32
        } else {
            0
        }
    }))
}

impl TryFrom<BlockRecord> for Block {
    type Error = BlockError;

    fn try_from(record: BlockRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let content = if record.kind.is_image() {
            let src = record
                .src
                .or(record.content)
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| BlockError::MissingSource(id.clone()))?;
            let dimensions = match (record.width, record.height) {
                (Some(width), Some(height)) => Some(Dimensions::new(width, height)),
                (None, None) => None,
                _ => return Err(BlockError::PartialDimensions(id)),
            };
            BlockContent::Image(ImageSource { src, dimensions })
        } else {
            let text = record
                .content
                .ok_or_else(|| BlockError::MissingText(id.clone()))?;
            BlockContent::Text(text)
        };

        let size_weight = match record.size_weight {
            Some(weight) => normalize_weight(weight),
            None if record.is_hero => HERO_WEIGHT,
            None => DEFAULT_WEIGHT,
        };

        Ok(Block {
            id,
            kind: record.kind,
            content,
            size_weight,
            is_hero: record.is_hero,
            preserve_aspect: record.preserve_aspect && record.kind.is_image(),
        })
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        let (content, src, dimensions) = match block.content {
            BlockContent::Text(text) => (Some(text), None, None),
            BlockContent::Image(image) => (None, Some(image.src), image.dimensions),
        };
        BlockRecord {
            id: Some(block.id),
            kind: block.kind,
            content,
            src,
            size_weight: Some(block.size_weight),
            is_hero: block.is_hero,
            preserve_aspect: block.preserve_aspect,
            aspect_ratio: dimensions.and_then(|d| d.aspect_ratio()),
            width: dimensions.map(|d| d.width),
            height: dimensions.map(|d| d.height),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_orientation_thresholds() {
        assert_eq!(
            Dimensions::new(1600, 900).orientation(),
            Some(Orientation::Landscape)
        );
        assert_eq!(
            Dimensions::new(600, 900).orientation(),
            Some(Orientation::Portrait)
        );
        // 1.05 is within the square tolerance
        assert_eq!(
            Dimensions::new(1050, 1000).orientation(),
            Some(Orientation::Square)
        );
        assert_eq!(Dimensions::new(0, 100).orientation(), None);
    }

    #[test]
    fn test_deserialize_accepts_legacy_type_field() {
        let block: Block = serde_json::from_value(json!({
            "id": "demo-header",
            "type": "header",
            "content": "Design Made Simple",
            "hero": true,
            "size": "large",
            "sizeWeight": 2
        }))
        .unwrap();

        assert_eq!(block.kind, BlockKind::Header);
        assert_eq!(block.text_content(), Some("Design Made Simple"));
        assert!(block.is_hero);
        assert_eq!(block.size_weight, 2);
    }

    #[test]
    fn test_missing_weight_defaults_by_hero_flag() {
        let plain: Block =
            serde_json::from_value(json!({"kind": "body", "content": "x"})).unwrap();
        let hero: Block =
            serde_json::from_value(json!({"kind": "header", "content": "x", "isHero": true}))
                .unwrap();
        assert_eq!(plain.size_weight, DEFAULT_WEIGHT);
        assert_eq!(hero.size_weight, HERO_WEIGHT);
    }

    #[test]
    fn test_hero_builder_lifts_weight() {
        let light = Block::text(BlockKind::Header, "x").hero();
        let heavy = Block::text(BlockKind::Header, "x").with_weight(6).hero();
        assert_eq!(light.size_weight, HERO_WEIGHT);
        assert_eq!(heavy.size_weight, 6);
    }

    #[test]
    fn test_non_positive_weight_normalized() {
        let zero: Block =
            serde_json::from_value(json!({"kind": "body", "content": "x", "sizeWeight": 0}))
                .unwrap();
        let negative: Block =
            serde_json::from_value(json!({"kind": "body", "content": "x", "sizeWeight": -3}))
                .unwrap();
        assert_eq!(zero.size_weight, DEFAULT_WEIGHT);
        assert_eq!(negative.size_weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let block: Block =
            serde_json::from_value(json!({"kind": "body", "content": "x"})).unwrap();
        assert!(!block.id.is_empty());
    }

    #[test]
    fn test_caption_alias_maps_to_body() {
        let block: Block =
            serde_json::from_value(json!({"kind": "caption", "content": "Call 555-0100"}))
                .unwrap();
        assert_eq!(block.kind, BlockKind::Body);
    }

    #[test]
    fn test_image_without_src_rejected() {
        let result: Result<Block, _> =
            serde_json::from_value(json!({"id": "img", "kind": "image"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_text_without_content_rejected() {
        let result: Result<Block, _> = serde_json::from_value(json!({"id": "h", "kind": "header"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_emits_derived_aspect_ratio() {
        let block = Block::image("https://img.example/a.png", Some(Dimensions::new(800, 400)))
            .with_id("img-1")
            .preserving_aspect(true);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["src"], "https://img.example/a.png");
        assert_eq!(value["aspectRatio"], 2.0);
        assert_eq!(value["preserveAspect"], true);
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_preserve_aspect_ignored_for_text() {
        let block: Block = serde_json::from_value(
            json!({"kind": "body", "content": "x", "preserveAspect": true}),
        )
        .unwrap();
        assert!(!block.preserve_aspect);
    }

    #[test]
    fn test_awaiting_dimensions() {
        let pending = Block::image("blob:1", None).preserving_aspect(true);
        let cropped = Block::image("blob:2", None);
        assert!(pending.awaiting_dimensions());
        assert!(!cropped.awaiting_dimensions());
    }
}
