// Content blocks: the validated block model and the single-owner store.

pub mod model;
pub mod store;

pub use model::{Block, BlockContent, BlockKind, Dimensions, Orientation};
pub use store::{BlockStore, StoreError};
