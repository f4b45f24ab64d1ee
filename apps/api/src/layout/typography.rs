//! Typography Fitter — shrinks text until it fits its region without breaking the type hierarchy.
//!
//! # Fit loop
//! 1. Start from the kind's base size (header largest, body smallest).
//! 2. Compute the hierarchy floor: `base × min_ratio`, never below an absolute minimum.
//! 3. Apply optical corrections (letter-spacing by size band, tighter in small regions)
//!    and snap line-height to the baseline grid.
//! 4. Measure; while the box overflows the region (minus the safety margin) and the
//!    size is above the floor, step down and re-apply. Capped at `max_iterations`.
//!
//! Overflow at the floor is accepted and reported, never an error: text is never
//! shrunk into invisibility.
//!
//! Measurement is injected, so the loop runs against static font metrics in the
//! renderer and against synthetic boxes in tests.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::blocks::BlockKind;
use crate::layout::font_metrics::FontFamily;
use crate::layout::geometry::Size;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Defaults for one block kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSpec {
    pub family: FontFamily,
    pub base_size_px: f32,
    pub weight: u16,
    /// Line-height as a multiple of the font size, before baseline snapping.
    pub line_height: f32,
    pub letter_spacing_em: f32,
    /// Fraction of the base size the kind may shrink to.
    pub min_ratio: f32,
    /// Readability floor in px, applied after `min_ratio`.
    pub absolute_min_px: f32,
}

/// Every tunable of the fitter. The defaults are presentation choices, not contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypographyConfig {
    pub header: TypeSpec,
    pub subheader: TypeSpec,
    pub body: TypeSpec,
    pub logo: TypeSpec,
    pub step_px: f32,
    pub max_iterations: u32,
    pub baseline_px: f32,
    /// Subtracted from both region dimensions before overflow checks.
    pub safety_margin_px: f32,
    pub large_size_px: f32,
    pub medium_size_px: f32,
    pub small_size_px: f32,
    pub large_tighten_em: f32,
    pub medium_tighten_em: f32,
    pub small_loosen_em: f32,
    pub small_area_px2: f32,
    pub small_area_tighten_em: f32,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            // Header floor (36px) equals the body base size, so a header can never
            // end up smaller than body copy.
            header: TypeSpec {
                family: FontFamily::Inter,
                base_size_px: 72.0,
                weight: 700,
                line_height: 1.2,
                letter_spacing_em: -0.02,
                min_ratio: 0.5,
                absolute_min_px: 14.0,
            },
            subheader: TypeSpec {
                family: FontFamily::Inter,
                base_size_px: 48.0,
                weight: 500,
                line_height: 1.3,
                letter_spacing_em: -0.01,
                min_ratio: 0.6,
                absolute_min_px: 12.0,
            },
            body: TypeSpec {
                family: FontFamily::Inter,
                base_size_px: 36.0,
                weight: 400,
                line_height: 1.4,
                letter_spacing_em: 0.0,
                min_ratio: 0.6,
                absolute_min_px: 12.0,
            },
            logo: TypeSpec {
                family: FontFamily::Oswald,
                base_size_px: 56.0,
                weight: 700,
                line_height: 1.2,
                letter_spacing_em: 0.04,
                min_ratio: 0.6,
                absolute_min_px: 12.0,
            },
            step_px: 2.0,
            max_iterations: 100,
            baseline_px: 8.0,
            safety_margin_px: 8.0,
            large_size_px: 48.0,
            medium_size_px: 32.0,
            small_size_px: 18.0,
            large_tighten_em: 0.02,
            medium_tighten_em: 0.005,
            small_loosen_em: 0.025,
            small_area_px2: 10_000.0,
            small_area_tighten_em: 0.005,
        }
    }
}

impl TypographyConfig {
    /// Type defaults for a kind. Images never carry text; they map to body.
    pub fn spec(&self, kind: BlockKind) -> &TypeSpec {
        match kind {
            BlockKind::Header => &self.header,
            BlockKind::Subheader => &self.subheader,
            BlockKind::Logo => &self.logo,
            BlockKind::Body | BlockKind::Image => &self.body,
        }
    }

    /// The box text must fit in: the region minus the safety margin on each axis.
    pub fn available_size(&self, region: Size) -> Size {
        Size::new(
            (region.width - self.safety_margin_px).max(0.0),
            (region.height - self.safety_margin_px).max(0.0),
        )
    }

    /// Smallest size the kind may shrink to.
    pub fn hierarchy_floor(&self, kind: BlockKind) -> f32 {
        let spec = self.spec(kind);
        (spec.base_size_px * spec.min_ratio)
            .max(spec.absolute_min_px)
            .floor()
    }

    /// Letter-spacing for a size after optical corrections.
    pub fn letter_spacing_for(&self, spec: &TypeSpec, font_size: f32, region_area: f32) -> f32 {
        let mut spacing = spec.letter_spacing_em;
        if font_size >= self.large_size_px {
            spacing -= self.large_tighten_em;
        } else if font_size >= self.medium_size_px {
            spacing -= self.medium_tighten_em;
        } else if font_size <= self.small_size_px {
            spacing += self.small_loosen_em;
        }
        if region_area < self.small_area_px2 {
            spacing -= self.small_area_tighten_em;
        }
        spacing
    }

    fn style_at(&self, spec: &TypeSpec, font_size: f32, region_area: f32) -> TextStyle {
        TextStyle {
            family: spec.family,
            font_size_px: font_size,
            weight: spec.weight,
            line_height_px: snap_to_baseline(font_size * spec.line_height, self.baseline_px),
            letter_spacing_em: self.letter_spacing_for(spec, font_size, region_area),
        }
    }
}

/// Rounds `px` to the nearest multiple of `unit`, never below one unit.
pub fn snap_to_baseline(px: f32, unit: f32) -> f32 {
    if unit <= 0.0 {
        return px;
    }
    ((px / unit).round() * unit).max(unit)
}

// ────────────────────────────────────────────────────────────────────────────
// Measurement seam
// ────────────────────────────────────────────────────────────────────────────

/// Concrete style handed to the measurer and returned to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub family: FontFamily,
    pub font_size_px: f32,
    pub weight: u16,
    pub line_height_px: f32,
    pub letter_spacing_em: f32,
}

/// Rendered extent of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub width: f32,
    pub height: f32,
}

impl TextBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn overflows(&self, available: Size) -> bool {
        self.width > available.width || self.height > available.height
    }
}

/// Measures how large `text` renders in `style` when wrapped at `max_width`.
pub trait TextMeasurer: Send + Sync {
    fn measure(&self, text: &str, style: &TextStyle, max_width: f32) -> TextBox;
}

// ────────────────────────────────────────────────────────────────────────────
// Fit
// ────────────────────────────────────────────────────────────────────────────

/// Result of one fit run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOutcome {
    pub style: TextStyle,
    pub floor_px: f32,
    /// Measurements taken inside the shrink loop.
    pub iterations: u32,
    /// True when the text still overflows at the final size (only possible at the floor).
    pub overflowing: bool,
}

/// Fits text of `kind` into `region`.
///
/// `measure` returns the rendered box for a candidate style. Returns `None` for a
/// zero-area region, which is logged and skipped.
pub fn fit_text<F>(
    region: Size,
    kind: BlockKind,
    config: &TypographyConfig,
    mut measure: F,
) -> Option<FitOutcome>
where
    F: FnMut(&TextStyle) -> TextBox,
{
    if region.is_empty() {
        warn!(
            kind = kind.as_str(),
            width = region.width,
            height = region.height,
            "Region has no area, skipping text fit"
        );
        return None;
    }

    let spec = config.spec(kind);
    let floor = config.hierarchy_floor(kind);
    let area = region.area();
    let available = config.available_size(region);

    let mut font_size = spec.base_size_px.max(floor);
    let mut style = config.style_at(spec, font_size, area);
    let mut iterations = 0u32;

    while iterations < config.max_iterations && font_size > floor {
        iterations += 1;
        if !measure(&style).overflows(available) {
            break;
        }
        font_size = (font_size - config.step_px).max(floor);
        style = config.style_at(spec, font_size, area);
    }

    let overflowing = measure(&style).overflows(available);
    if overflowing {
        debug!(
            kind = kind.as_str(),
            font_size, "Text still overflows at hierarchy floor"
        );
    }

    Some(FitOutcome {
        style,
        floor_px: floor,
        iterations,
        overflowing,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A box that scales linearly with font size from a reference measurement.
    fn linear_box(width_at_ref: f32, height_at_ref: f32, ref_size: f32) -> impl Fn(&TextStyle) -> TextBox {
        move |style| {
            let scale = style.font_size_px / ref_size;
            TextBox::new(width_at_ref * scale, height_at_ref * scale)
        }
    }

    // ── hierarchy ───────────────────────────────────────────────────────────

    #[test]
    fn test_header_floor_not_below_body_base() {
        let config = TypographyConfig::default();
        assert!(config.hierarchy_floor(BlockKind::Header) >= config.body.base_size_px);
    }

    #[test]
    fn test_base_sizes_ranked() {
        let config = TypographyConfig::default();
        assert!(config.header.base_size_px >= config.subheader.base_size_px);
        assert!(config.subheader.base_size_px >= config.body.base_size_px);
    }

    #[test]
    fn test_header_shrinks_proportionally_more_than_body() {
        let config = TypographyConfig::default();
        assert!(config.header.min_ratio <= config.body.min_ratio);
    }

    // ── fit_text ────────────────────────────────────────────────────────────

    #[test]
    fn test_fitting_text_keeps_base_size() {
        let config = TypographyConfig::default();
        let outcome = fit_text(
            Size::new(800.0, 400.0),
            BlockKind::Body,
            &config,
            linear_box(200.0, 50.0, 36.0),
        )
        .unwrap();
        assert_eq!(outcome.style.font_size_px, 36.0);
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.overflowing);
    }

    #[test]
    fn test_overflowing_body_shrinks_and_stops_at_floor() {
        // 100×100 region, body text rendering 300×40 at its base size.
        let config = TypographyConfig::default();
        let floor = config.hierarchy_floor(BlockKind::Body);
        let outcome = fit_text(
            Size::new(100.0, 100.0),
            BlockKind::Body,
            &config,
            linear_box(300.0, 40.0, 36.0),
        )
        .unwrap();

        assert!(outcome.style.font_size_px < 36.0, "must shrink at least one step");
        assert!(outcome.style.font_size_px >= floor);
        assert!(outcome.iterations >= 1 && outcome.iterations <= 100);
        assert!(outcome.overflowing, "300px wide text cannot fit 92px at the floor");
        assert_eq!(outcome.style.font_size_px, floor);
    }

    #[test]
    fn test_shrinks_until_it_fits() {
        let config = TypographyConfig::default();
        // Fits once width ≤ 392px: 600 × s/72 ≤ 392 → s ≤ 47.04 → first step size 46.
        let outcome = fit_text(
            Size::new(400.0, 400.0),
            BlockKind::Header,
            &config,
            linear_box(600.0, 80.0, 72.0),
        )
        .unwrap();
        assert_eq!(outcome.style.font_size_px, 46.0);
        assert!(!outcome.overflowing);
    }

    #[test]
    fn test_terminates_with_pathological_measure() {
        let config = TypographyConfig {
            step_px: 0.0001,
            ..TypographyConfig::default()
        };
        let outcome = fit_text(
            Size::new(50.0, 50.0),
            BlockKind::Header,
            &config,
            |_: &TextStyle| TextBox::new(f32::MAX, f32::MAX),
        )
        .unwrap();
        assert_eq!(outcome.iterations, config.max_iterations);
        assert!(outcome.overflowing);
    }

    #[test]
    fn test_fit_is_idempotent() {
        let config = TypographyConfig::default();
        let region = Size::new(300.0, 200.0);
        let first = fit_text(region, BlockKind::Subheader, &config, linear_box(700.0, 60.0, 48.0))
            .unwrap();
        let second =
            fit_text(region, BlockKind::Subheader, &config, linear_box(700.0, 60.0, 48.0))
                .unwrap();
        assert_eq!(first.style, second.style);
    }

    #[test]
    fn test_header_not_smaller_than_body_in_equal_regions() {
        let config = TypographyConfig::default();
        for side in [60.0_f32, 120.0, 250.0, 600.0, 1200.0] {
            let region = Size::new(side, side);
            // Identical content: same em-width, so the box scales with font size.
            let header = fit_text(region, BlockKind::Header, &config, linear_box(500.0, 60.0, 36.0))
                .unwrap();
            let body = fit_text(region, BlockKind::Body, &config, linear_box(500.0, 60.0, 36.0))
                .unwrap();
            assert!(
                header.style.font_size_px >= body.style.font_size_px,
                "side {side}: header {} < body {}",
                header.style.font_size_px,
                body.style.font_size_px
            );
        }
    }

    #[test]
    fn test_zero_area_region_is_skipped() {
        let config = TypographyConfig::default();
        let result = fit_text(
            Size::new(0.0, 300.0),
            BlockKind::Body,
            &config,
            linear_box(10.0, 10.0, 36.0),
        );
        assert!(result.is_none());
    }

    // ── corrections ─────────────────────────────────────────────────────────

    #[test]
    fn test_letter_spacing_bands() {
        let config = TypographyConfig::default();
        let spec = &config.body;
        let big_area = 1_000_000.0;
        assert!((config.letter_spacing_for(spec, 60.0, big_area) + 0.02).abs() < 1e-6);
        assert!((config.letter_spacing_for(spec, 36.0, big_area) + 0.005).abs() < 1e-6);
        assert!(config.letter_spacing_for(spec, 24.0, big_area).abs() < 1e-6);
        assert!((config.letter_spacing_for(spec, 16.0, big_area) - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_small_area_tightens_further() {
        let config = TypographyConfig::default();
        let spec = &config.body;
        let roomy = config.letter_spacing_for(spec, 24.0, 50_000.0);
        let cramped = config.letter_spacing_for(spec, 24.0, 9_000.0);
        assert!((roomy - cramped - 0.005).abs() < 1e-6);
    }

    #[test]
    fn test_snap_to_baseline() {
        assert_eq!(snap_to_baseline(50.4, 8.0), 48.0);
        assert_eq!(snap_to_baseline(86.4, 8.0), 88.0);
        assert_eq!(snap_to_baseline(2.0, 8.0), 8.0);
    }

    #[test]
    fn test_line_height_on_grid_after_fit() {
        let config = TypographyConfig::default();
        let outcome = fit_text(
            Size::new(180.0, 90.0),
            BlockKind::Body,
            &config,
            linear_box(400.0, 80.0, 36.0),
        )
        .unwrap();
        let lh = outcome.style.line_height_px;
        assert!(lh >= config.baseline_px);
        assert_eq!(lh % config.baseline_px, 0.0);
    }
}
