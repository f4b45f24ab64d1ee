// Generation: prompt → structured copy → blocks, with an optional image and
// image-derived palettes. All upstream calls go through a GenerationBackend.

pub mod backend;
pub mod content;
pub mod flow;
pub mod handlers;
