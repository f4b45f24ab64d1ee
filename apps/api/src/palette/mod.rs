// Palette provider: fixed library, cycling, and palettes derived from image colors.

pub mod color;
pub mod extract;
pub mod library;

pub use color::Color;
pub use extract::{extract_colors, palettes_from_image};
pub use library::{palettes_from_colors, Palette, PaletteCycler, LIBRARY};
