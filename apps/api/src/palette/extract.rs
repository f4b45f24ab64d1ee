//! Dominant-color extraction from encoded image bytes.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::color::Color;
use super::library::{palettes_from_colors, Palette, MAX_SOURCE_COLORS};

/// Longest edge the image is reduced to before sampling.
const SAMPLE_EDGE_PX: u32 = 64;
/// Low bits dropped per channel when bucketing (8 levels per channel).
const BUCKET_SHIFT: u8 = 5;
const NEAR_WHITE: u8 = 240;
const NEAR_BLACK: u8 = 16;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no usable colors")]
    NoColors,
}

#[derive(Default)]
struct Bucket {
    count: u64,
    r: u64,
    g: u64,
    b: u64,
}

impl Bucket {
    fn mean(&self) -> Color {
        let n = self.count.max(1);
        Color::rgb((self.r / n) as u8, (self.g / n) as u8, (self.b / n) as u8)
    }
}

fn is_extreme(px: [u8; 3]) -> bool {
    px.iter().all(|&c| c >= NEAR_WHITE) || px.iter().all(|&c| c <= NEAR_BLACK)
}

/// Returns up to `k` dominant colors, most populous first.
///
/// Pixels are grouped into a coarse RGB histogram; each returned color is the
/// mean of one bucket. Near-white and near-black pixels are ignored.
pub fn extract_colors(bytes: &[u8], k: usize) -> Result<Vec<Color>, ExtractError> {
    let img = image::load_from_memory(bytes)?;
    let img = if img.width() > SAMPLE_EDGE_PX || img.height() > SAMPLE_EDGE_PX {
        img.thumbnail(SAMPLE_EDGE_PX, SAMPLE_EDGE_PX)
    } else {
        img
    };
    let rgb = img.to_rgb8();

    let mut buckets: HashMap<(u8, u8, u8), Bucket> = HashMap::new();
    for pixel in rgb.pixels() {
        let px = pixel.0;
        if is_extreme(px) {
            continue;
        }
        let key = (
            px[0] >> BUCKET_SHIFT,
            px[1] >> BUCKET_SHIFT,
            px[2] >> BUCKET_SHIFT,
        );
        let bucket = buckets.entry(key).or_default();
        bucket.count += 1;
        bucket.r += px[0] as u64;
        bucket.g += px[1] as u64;
        bucket.b += px[2] as u64;
    }

    if buckets.is_empty() {
        return Err(ExtractError::NoColors);
    }

    let mut ranked: Vec<(_, Bucket)> = buckets.into_iter().collect();
    // key breaks ties so output is stable regardless of map order
    ranked.sort_by(|(ka, a), (kb, b)| b.count.cmp(&a.count).then(ka.cmp(kb)));

    let colors: Vec<Color> = ranked.iter().take(k).map(|(_, b)| b.mean()).collect();
    debug!(
        found = colors.len(),
        buckets = ranked.len(),
        "Extracted image colors"
    );
    Ok(colors)
}

/// Palettes for a generated image. Falls back to the neutral palette when the
/// image cannot be decoded or has no usable colors.
pub fn palettes_from_image(bytes: &[u8]) -> Vec<Palette> {
    match extract_colors(bytes, MAX_SOURCE_COLORS) {
        Ok(colors) => palettes_from_colors(&colors),
        Err(e) => {
            warn!(error = %e, "Color extraction failed, using fallback palette");
            vec![Palette::default()]
        }
    }
}
