// Layout system: weighted binary partitioning, text fitting and region rendering.
// Everything here is pure and CPU-bound; async callers run it inside
// tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod geometry;
pub mod partition;
pub mod renderer;
pub mod typography;

// Re-export the public API consumed by the designer controller and handlers.
pub use font_metrics::{FontFamily, MetricMeasurer};
pub use geometry::{Axis, CanvasFormat, Rect, Size};
pub use partition::{choose_direction, partition, PartitionNode};
pub use renderer::{render_layout, LayoutOptions, PlacedRegion, RenderedLayout};
pub use typography::{fit_text, FitOutcome, TextMeasurer, TextStyle, TypographyConfig};
