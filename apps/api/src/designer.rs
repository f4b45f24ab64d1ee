//! Designer — the single owner of the block store, palette cycler and canvas format.
//!
//! Handlers build a `Designer` per request (or reuse one in tests), mutate it
//! through its methods, then ask it for a layout. A layout pass only reads.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::blocks::{Block, BlockStore, StoreError};
use crate::generation::flow::GeneratedDesign;
use crate::layout::{
    choose_direction, partition, render_layout, Axis, CanvasFormat, LayoutOptions,
    PartitionNode, PlacedRegion, Size, TextMeasurer, TypographyConfig,
};
use crate::palette::{Palette, PaletteCycler};

/// A fully resolved design: partition tree, placed regions and active palette.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignLayout {
    pub format: CanvasFormat,
    pub canvas: Size,
    pub direction: Axis,
    pub tree: PartitionNode,
    pub regions: Vec<PlacedRegion>,
    pub fit_passes: u32,
    pub palette: Palette,
    pub palette_index: usize,
}

pub struct Designer {
    store: BlockStore,
    palettes: PaletteCycler,
    format: CanvasFormat,
    typography: TypographyConfig,
    measurer: Arc<dyn TextMeasurer>,
}

impl Designer {
    pub fn new(
        format: CanvasFormat,
        typography: TypographyConfig,
        measurer: Arc<dyn TextMeasurer>,
    ) -> Self {
        Self {
            store: BlockStore::new(),
            palettes: PaletteCycler::new(),
            format,
            typography,
            measurer,
        }
    }

    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Result<Self, StoreError> {
        self.store = BlockStore::from_blocks(blocks)?;
        Ok(self)
    }

    pub fn with_demo_blocks(mut self) -> Self {
        self.store = BlockStore::demo();
        self
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BlockStore {
        &mut self.store
    }

    pub fn format(&self) -> CanvasFormat {
        self.format
    }

    pub fn set_format(&mut self, format: CanvasFormat) {
        self.format = format;
    }

    pub fn palette(&self) -> Palette {
        self.palettes.current()
    }

    /// Advances to the next palette (extracted ones first if present).
    pub fn shuffle_palette(&mut self) -> Palette {
        self.palettes.shuffle()
    }

    /// Selects a palette by position in the active pool, wrapping around.
    pub fn select_palette(&mut self, index: usize) -> Palette {
        self.palettes.select(index)
    }

    /// Replaces the current blocks with a generated design's blocks and switches
    /// to its palettes when it has any.
    pub fn apply_generated(&mut self, design: &GeneratedDesign) -> Result<(), StoreError> {
        let mut store = BlockStore::new();
        for block in &design.blocks {
            store.add(block.clone())?;
        }
        self.store = store;
        if !design.palettes.is_empty() {
            self.palettes.use_extracted(design.palettes.clone());
        }
        debug!(
            blocks = self.store.len(),
            palettes = design.palettes.len(),
            "Generated design applied"
        );
        Ok(())
    }

    /// Lays out every layout-ready block. `None` when there is nothing to lay out.
    pub fn layout(&self, options: &LayoutOptions) -> Option<DesignLayout> {
        let blocks = self.store.layout_ready_blocks();
        let direction = choose_direction(&blocks);
        let tree = partition(&blocks, direction)?;
        let canvas = self.format.size();
        let rendered = render_layout(
            &tree,
            canvas,
            self.measurer.as_ref(),
            &self.typography,
            options,
        );

        Some(DesignLayout {
            format: self.format,
            canvas,
            direction,
            tree,
            regions: rendered.regions,
            fit_passes: rendered.fit_passes,
            palette: self.palette(),
            palette_index: self.palettes.position(),
        })
    }
}
