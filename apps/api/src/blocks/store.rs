//! Block Store — the ordered collection of blocks a layout pass runs over.
//!
//! One owner (the `Designer`), one mutation path: every edit goes through a
//! method here, and each method re-establishes the store invariants
//! (unique ids, weights ≥ 1, non-blank text) before returning.

use thiserror::Error;
use tracing::debug;

use crate::blocks::model::{Block, BlockContent, BlockKind, Dimensions};
use crate::layout::geometry::normalize_weight;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("a block with id '{0}' already exists")]
    DuplicateId(String),

    #[error("block '{0}' not found")]
    NotFound(String),

    #[error("block '{0}' has empty text content")]
    EmptyContent(String),

    #[error("block '{id}' cannot change kind from {from} to {to}")]
    KindMismatch {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("block '{0}' is not an image")]
    NotAnImage(String),

    #[error("block '{0}' is not a text block")]
    NotText(String),

    #[error("block '{0}' has zero-sized dimensions")]
    InvalidDimensions(String),
}

#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from untrusted input, validating every block in order.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for block in blocks {
            store.add(block)?;
        }
        Ok(store)
    }

    /// The starter composition shown before the user adds anything.
    pub fn demo() -> Self {
        let blocks = vec![
            Block::text(BlockKind::Header, "Design Made Simple")
                .with_id("demo-header")
                .hero(),
            Block::text(
                BlockKind::Body,
                "Create stunning layouts with our intelligent design generator. \
                 Perfect for presentations, social media, and creative projects.",
            )
            .with_id("demo-body"),
            Block::text(BlockKind::Subheader, "Professional Results in Seconds")
                .with_id("demo-subheader"),
            Block::text(BlockKind::Logo, "STUDIO").with_id("demo-logo"),
            Block::image("demo://gradient.svg", Some(Dimensions::new(400, 300)))
                .with_id("demo-image"),
        ];
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Appends a block. Weight is normalized; blank text and duplicate ids are rejected.
    pub fn add(&mut self, mut block: Block) -> Result<String, StoreError> {
        if self.get(&block.id).is_some() {
            return Err(StoreError::DuplicateId(block.id));
        }
        match &block.content {
            BlockContent::Text(text) if text.trim().is_empty() => {
                return Err(StoreError::EmptyContent(block.id));
            }
            BlockContent::Image(image) => {
                if let Some(dims) = image.dimensions {
                    if dims.aspect_ratio().is_none() {
                        return Err(StoreError::InvalidDimensions(block.id));
                    }
                }
            }
            _ => {}
        }
        block.size_weight = normalize_weight(block.size_weight);
        if let BlockContent::Text(text) = &mut block.content {
            *text = text.trim().to_string();
        }

        debug!(id = %block.id, kind = block.kind.as_str(), "block added");
        let id = block.id.clone();
        self.blocks.push(block);
        Ok(id)
    }

    /// Adds a text block. Headers are flagged as hero.
    pub fn add_text(&mut self, kind: BlockKind, content: &str) -> Result<String, StoreError> {
        let mut block = Block::text(kind, content);
        if kind == BlockKind::Header {
            block = block.hero();
        }
        self.add(block)
    }

    pub fn add_image(
        &mut self,
        src: &str,
        dimensions: Option<Dimensions>,
        preserve_aspect: bool,
    ) -> Result<String, StoreError> {
        self.add(Block::image(src, dimensions).preserving_aspect(preserve_aspect))
    }

    pub fn remove(&mut self, id: &str) -> Option<Block> {
        let index = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(index))
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Changes the kind of a block. Text blocks can switch among text kinds only.
    pub fn set_kind(&mut self, id: &str, kind: BlockKind) -> Result<(), StoreError> {
        let block = self.get_mut(id)?;
        if block.kind.is_image() != kind.is_image() {
            return Err(StoreError::KindMismatch {
                id: id.to_string(),
                from: block.kind.as_str(),
                to: kind.as_str(),
            });
        }
        block.kind = kind;
        Ok(())
    }

    pub fn set_size_weight(&mut self, id: &str, weight: u32) -> Result<(), StoreError> {
        let block = self.get_mut(id)?;
        block.size_weight = normalize_weight(weight);
        Ok(())
    }

    pub fn set_hero(&mut self, id: &str, is_hero: bool) -> Result<(), StoreError> {
        self.get_mut(id)?.is_hero = is_hero;
        Ok(())
    }

    pub fn set_preserve_aspect(&mut self, id: &str, preserve: bool) -> Result<(), StoreError> {
        let block = self.get_mut(id)?;
        if !block.kind.is_image() {
            return Err(StoreError::NotAnImage(id.to_string()));
        }
        block.preserve_aspect = preserve;
        Ok(())
    }

    pub fn set_content(&mut self, id: &str, content: &str) -> Result<(), StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::EmptyContent(id.to_string()));
        }
        let block = self.get_mut(id)?;
        match &mut block.content {
            BlockContent::Text(text) => {
                *text = content.to_string();
                Ok(())
            }
            BlockContent::Image(_) => Err(StoreError::NotText(id.to_string())),
        }
    }

    /// Records the intrinsic size of an image once it has loaded.
    pub fn resolve_image_dimensions(
        &mut self,
        id: &str,
        dimensions: Dimensions,
    ) -> Result<(), StoreError> {
        if dimensions.aspect_ratio().is_none() {
            return Err(StoreError::InvalidDimensions(id.to_string()));
        }
        let block = self.get_mut(id)?;
        match &mut block.content {
            BlockContent::Image(image) => {
                image.dimensions = Some(dimensions);
                Ok(())
            }
            BlockContent::Text(_) => Err(StoreError::NotAnImage(id.to_string())),
        }
    }

    /// Blocks that may enter a layout pass. Aspect-preserving images whose
    /// dimensions are still loading are held back.
    pub fn layout_ready_blocks(&self) -> Vec<Block> {
        self.blocks
            .iter()
            .filter(|b| !b.awaiting_dimensions())
            .cloned()
            .collect()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Block, StoreError> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::geometry::{DEFAULT_WEIGHT, HERO_WEIGHT};

    #[test]
    fn test_demo_has_five_unique_blocks() {
        let store = BlockStore::demo();
        assert_eq!(store.len(), 5);
        let mut ids: Vec<&str> = store.blocks().iter().map(|b| b.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut store = BlockStore::new();
        store
            .add(Block::text(BlockKind::Body, "one").with_id("a"))
            .unwrap();
        let err = store
            .add(Block::text(BlockKind::Body, "two").with_id("a"))
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateId("a".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let mut store = BlockStore::new();
        let err = store.add_text(BlockKind::Body, "   ").unwrap_err();
        assert!(matches!(err, StoreError::EmptyContent(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_text_header_is_hero() {
        let mut store = BlockStore::new();
        let id = store.add_text(BlockKind::Header, "  Big Sale  ").unwrap();
        let block = store.get(&id).unwrap();
        assert!(block.is_hero);
        assert_eq!(block.size_weight, HERO_WEIGHT);
        assert_eq!(block.text_content(), Some("Big Sale"));
    }

    #[test]
    fn test_set_hero_and_clear() {
        let mut store = BlockStore::demo();
        store.set_hero("demo-body", true).unwrap();
        assert!(store.get("demo-body").unwrap().is_hero);
        assert!(matches!(
            store.set_hero("missing", true),
            Err(StoreError::NotFound(_))
        ));

        store.clear();
        assert!(store.is_empty());
        assert!(store.layout_ready_blocks().is_empty());
    }

    #[test]
    fn test_add_normalizes_zero_weight() {
        let mut store = BlockStore::new();
        let mut block = Block::text(BlockKind::Body, "x");
        block.size_weight = 0;
        let id = store.add(block).unwrap();
        assert_eq!(store.get(&id).unwrap().size_weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_remove_returns_block() {
        let mut store = BlockStore::demo();
        let removed = store.remove("demo-logo").unwrap();
        assert_eq!(removed.kind, BlockKind::Logo);
        assert!(store.get("demo-logo").is_none());
        assert!(store.remove("demo-logo").is_none());
    }

    #[test]
    fn test_set_kind_across_text_kinds() {
        let mut store = BlockStore::demo();
        store.set_kind("demo-body", BlockKind::Subheader).unwrap();
        assert_eq!(store.get("demo-body").unwrap().kind, BlockKind::Subheader);
    }

    #[test]
    fn test_set_kind_text_to_image_rejected() {
        let mut store = BlockStore::demo();
        let err = store.set_kind("demo-body", BlockKind::Image).unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn test_set_size_weight_missing_block() {
        let mut store = BlockStore::new();
        assert_eq!(
            store.set_size_weight("nope", 3),
            Err(StoreError::NotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_set_preserve_aspect_only_for_images() {
        let mut store = BlockStore::demo();
        store.set_preserve_aspect("demo-image", true).unwrap();
        assert!(store.get("demo-image").unwrap().preserve_aspect);
        assert!(store.set_preserve_aspect("demo-header", true).is_err());
    }

    #[test]
    fn test_pending_image_held_back_until_resolved() {
        let mut store = BlockStore::new();
        store.add_text(BlockKind::Header, "Hello").unwrap();
        let img = store.add_image("blob:upload", None, true).unwrap();

        assert_eq!(store.layout_ready_blocks().len(), 1);

        store
            .resolve_image_dimensions(&img, Dimensions::new(900, 1600))
            .unwrap();
        let ready = store.layout_ready_blocks();
        assert_eq!(ready.len(), 2);
    }

    #[test]
    fn test_resolve_rejects_zero_dimensions() {
        let mut store = BlockStore::new();
        let img = store.add_image("blob:x", None, true).unwrap();
        assert!(store
            .resolve_image_dimensions(&img, Dimensions::new(0, 10))
            .is_err());
    }

    #[test]
    fn test_set_content_on_image_rejected() {
        let mut store = BlockStore::demo();
        assert_eq!(
            store.set_content("demo-image", "text"),
            Err(StoreError::NotText("demo-image".to_string()))
        );
        store.set_content("demo-logo", "ACME").unwrap();
        assert_eq!(store.get("demo-logo").unwrap().text_content(), Some("ACME"));
    }

    #[test]
    fn test_from_blocks_propagates_duplicate() {
        let blocks = vec![
            Block::text(BlockKind::Body, "a").with_id("x"),
            Block::text(BlockKind::Body, "b").with_id("x"),
        ];
        assert!(BlockStore::from_blocks(blocks).is_err());
    }
}
