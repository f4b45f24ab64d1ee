//! Palette library and cycling.
//!
//! A `PaletteCycler` walks the fixed library until a generated image supplies
//! its own palettes, after which it walks those instead.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::color::Color;

/// Most extracted colors turned into palettes.
pub const MAX_SOURCE_COLORS: usize = 6;

/// Background / text / accent triple applied to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub bg: Color,
    pub text: Color,
    pub accent: Color,
}

impl Palette {
    pub const fn new(bg: Color, text: Color, accent: Color) -> Self {
        Self { bg, text, accent }
    }

    pub fn text_contrast(&self) -> f32 {
        self.bg.contrast_ratio(&self.text)
    }
}

impl Default for Palette {
    /// Neutral palette used whenever image-derived colors are unavailable.
    fn default() -> Self {
        Palette::new(hex(0xff, 0xff, 0xff), hex(0x33, 0x33, 0x33), hex(0x00, 0x66, 0xcc))
    }
}

const fn hex(r: u8, g: u8, b: u8) -> Color {
    Color::rgb(r, g, b)
}

const fn p(bg: (u8, u8, u8), text: (u8, u8, u8), accent: (u8, u8, u8)) -> Palette {
    Palette::new(
        hex(bg.0, bg.1, bg.2),
        hex(text.0, text.1, text.2),
        hex(accent.0, accent.1, accent.2),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Fixed library
// ────────────────────────────────────────────────────────────────────────────

pub const LIBRARY: [Palette; 15] = [
    // light
    p((0xff, 0xff, 0xff), (0x2d, 0x37, 0x48), (0x31, 0x82, 0xce)),
    p((0xf7, 0xfa, 0xfc), (0x1a, 0x20, 0x2c), (0xe5, 0x3e, 0x3e)),
    p((0xff, 0xfa, 0xf0), (0x74, 0x42, 0x10), (0xdd, 0x6b, 0x20)),
    p((0xf0, 0xff, 0xf4), (0x22, 0x54, 0x3d), (0x38, 0xa1, 0x69)),
    p((0xfa, 0xf5, 0xff), (0x44, 0x33, 0x7a), (0x80, 0x5a, 0xd5)),
    // dark
    p((0x1a, 0x20, 0x2c), (0xf7, 0xfa, 0xfc), (0x63, 0xb3, 0xed)),
    p((0x74, 0x2a, 0x2a), (0xfe, 0xd7, 0xd7), (0xfc, 0x81, 0x81)),
    p((0x74, 0x42, 0x10), (0xfe, 0xfc, 0xbf), (0xf6, 0xe0, 0x5e)),
    p((0x22, 0x54, 0x3d), (0xc6, 0xf6, 0xd5), (0x68, 0xd3, 0x91)),
    p((0x44, 0x33, 0x7a), (0xe9, 0xd8, 0xfd), (0xb7, 0x94, 0xf6)),
    // vibrant
    p((0x31, 0x82, 0xce), (0xff, 0xff, 0xff), (0xfb, 0xb6, 0xce)),
    p((0xe5, 0x3e, 0x3e), (0xff, 0xff, 0xff), (0x90, 0xcd, 0xf4)),
    p((0xdd, 0x6b, 0x20), (0xff, 0xff, 0xff), (0xc6, 0xf6, 0xd5)),
    p((0x38, 0xa1, 0x69), (0xff, 0xff, 0xff), (0xfe, 0xd7, 0xd7)),
    p((0x80, 0x5a, 0xd5), (0xff, 0xff, 0xff), (0xfe, 0xfc, 0xbf)),
];

const FALLBACKS: [Palette; 3] = [
    p((0xff, 0xff, 0xff), (0x33, 0x33, 0x33), (0x00, 0x66, 0xcc)),
    p((0xf8, 0xf9, 0xfa), (0x21, 0x25, 0x29), (0xdc, 0x35, 0x45)),
    p((0x1a, 0x1a, 0x1a), (0xff, 0xff, 0xff), (0x28, 0xa7, 0x45)),
];

const INK_DARK: Color = hex(0x1a, 0x1a, 0x1a);
const SOFT_LIGHT_BG: Color = hex(0xf8, 0xf9, 0xfa);
const SOFT_LIGHT_TEXT: Color = hex(0x21, 0x25, 0x29);
const SOFT_DARK_BG: Color = hex(0x2d, 0x37, 0x48);
const SOFT_DARK_TEXT: Color = hex(0xf7, 0xfa, 0xfc);

/// Builds palettes around extracted accent colors.
///
/// Each color (up to [`MAX_SOURCE_COLORS`]) yields a high-contrast palette and,
/// unless it is the last color, a softer variant. Bright accents sit on dark
/// backgrounds and vice versa.
pub fn palettes_from_colors(colors: &[Color]) -> Vec<Palette> {
    if colors.is_empty() {
        return FALLBACKS.to_vec();
    }

    let mut palettes = Vec::new();
    for (i, &accent) in colors.iter().take(MAX_SOURCE_COLORS).enumerate() {
        let bright = accent.is_bright();
        palettes.push(if bright {
            Palette::new(INK_DARK, Color::WHITE, accent)
        } else {
            Palette::new(Color::WHITE, INK_DARK, accent)
        });

        if i + 1 < colors.len() {
            palettes.push(if bright {
                Palette::new(SOFT_LIGHT_BG, SOFT_LIGHT_TEXT, accent)
            } else {
                Palette::new(SOFT_DARK_BG, SOFT_DARK_TEXT, accent)
            });
        }
    }
    palettes
}

// ────────────────────────────────────────────────────────────────────────────
// Cycler
// ────────────────────────────────────────────────────────────────────────────

/// Cycles through either the fixed library or a set of extracted palettes.
#[derive(Debug, Clone, Default)]
pub struct PaletteCycler {
    extracted: Vec<Palette>,
    index: usize,
}

impl PaletteCycler {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self) -> &[Palette] {
        if self.extracted.is_empty() {
            &LIBRARY
        } else {
            &self.extracted
        }
    }

    pub fn current(&self) -> Palette {
        let pool = self.pool();
        pool[self.index % pool.len()]
    }

    /// Advances to the next palette, wrapping around.
    pub fn shuffle(&mut self) -> Palette {
        let len = self.pool().len();
        self.index = (self.index + 1) % len;
        let palette = self.current();
        debug!(
            index = self.index,
            of = len,
            extracted = self.has_extracted(),
            "Applied palette"
        );
        palette
    }

    /// Position of the current palette in the active pool.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Jumps to the palette at `index`, wrapping around the active pool.
    pub fn select(&mut self, index: usize) -> Palette {
        self.index = index % self.pool().len();
        self.current()
    }

    /// Switches to image-derived palettes, starting from the first.
    /// An empty set reverts to the library.
    pub fn use_extracted(&mut self, palettes: Vec<Palette>) {
        self.extracted = palettes;
        self.index = 0;
    }

    pub fn has_extracted(&self) -> bool {
        !self.extracted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pool().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_groups_have_readable_text() {
        for palette in LIBRARY.iter() {
            assert!(
                palette.text_contrast() >= 3.0,
                "{} on {} too faint",
                palette.text,
                palette.bg
            );
        }
    }

    #[test]
    fn test_empty_colors_give_fallbacks() {
        let palettes = palettes_from_colors(&[]);
        assert_eq!(palettes.len(), 3);
        assert_eq!(palettes[0], Palette::default());
    }

    #[test]
    fn test_three_colors_make_five_palettes() {
        let colors = [
            Color::rgb(70, 130, 180),
            Color::rgb(220, 20, 60),
            Color::rgb(46, 125, 50),
        ];
        let palettes = palettes_from_colors(&colors);
        // two per color, none softer for the last one
        assert_eq!(palettes.len(), 5);
        assert_eq!(palettes[0].bg, Color::WHITE);
        assert_eq!(palettes[1].bg, SOFT_DARK_BG);
        assert_eq!(palettes[4].accent, Color::rgb(46, 125, 50));
    }

    #[test]
    fn test_bright_accent_gets_dark_background() {
        let palettes = palettes_from_colors(&[Color::rgb(250, 240, 100)]);
        assert_eq!(palettes.len(), 1);
        assert_eq!(palettes[0].bg, INK_DARK);
        assert_eq!(palettes[0].text, Color::WHITE);
    }

    #[test]
    fn test_caps_source_colors() {
        let colors: Vec<Color> = (0..10).map(|i| Color::rgb(i * 20, 10, 10)).collect();
        // six colors, each with a softer variant since none is last overall
        assert_eq!(palettes_from_colors(&colors).len(), 12);
    }

    #[test]
    fn test_cycler_wraps_library() {
        let mut cycler = PaletteCycler::new();
        assert_eq!(cycler.current(), LIBRARY[0]);
        for _ in 0..LIBRARY.len() {
            cycler.shuffle();
        }
        assert_eq!(cycler.current(), LIBRARY[0]);
    }

    #[test]
    fn test_cycler_select_wraps_any_index() {
        let mut cycler = PaletteCycler::new();
        assert_eq!(cycler.select(LIBRARY.len() + 2), LIBRARY[2]);
        assert_eq!(cycler.position(), 2);
        assert_eq!(cycler.select(usize::MAX), LIBRARY[usize::MAX % LIBRARY.len()]);
        assert_eq!(cycler.shuffle(), LIBRARY[(usize::MAX % LIBRARY.len() + 1) % LIBRARY.len()]);
    }

    #[test]
    fn test_cycler_prefers_extracted() {
        let mut cycler = PaletteCycler::new();
        cycler.shuffle();
        let extracted = palettes_from_colors(&[Color::rgb(10, 20, 30), Color::rgb(200, 200, 50)]);
        cycler.use_extracted(extracted.clone());
        assert!(cycler.has_extracted());
        assert_eq!(cycler.current(), extracted[0]);
        assert_eq!(cycler.shuffle(), extracted[1]);
        assert_eq!(cycler.len(), extracted.len());

        cycler.use_extracted(Vec::new());
        assert_eq!(cycler.current(), LIBRARY[0]);
    }
}
