//! Shared application-wide constants.
//! Centralizes tweakable values used by the node model, exporters and the viewer.

// Ellipse geometry
/// Ratio applied to the bounding-box width to place the Bézier control points
/// of each half of the ellipse.
///
/// This is the literal 7/6 ratio (not the 4/3·(√2−1) ≈ 0.5523 kappa used by
/// four-segment approximations). Changing it changes every rendered pixel.
pub const BEZIER_FACTOR: f64 = 1.16666666;
/// Type tag carried by every ellipse node and written into saved scenes.
pub const ELLIPSE_CLASS_TYPE: &str = "EllipseNode";

// Node defaults
/// Default node width in world units.
pub const NODE_WIDTH: f64 = 120.0;
/// Default node height in world units.
pub const NODE_HEIGHT: f64 = 80.0;
/// Default outline width. Zero disables stroking.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

// Grid/drawing
/// Grid cell size in world units.
pub const GRID_SIZE: f32 = 20.0;
/// Outline width of the selection rectangle (in screen pixels).
pub const SELECTION_STROKE_WIDTH: f32 = 1.5;
/// Tolerance handed to the Bézier flattener when painting on the canvas (in screen pixels).
pub const FLATTEN_TOLERANCE: f32 = 0.25;

// Canvas interactions
/// Zoom limits for the viewer canvas.
pub const MIN_ZOOM: f32 = 0.25;
/// Upper zoom limit for the viewer canvas.
pub const MAX_ZOOM: f32 = 5.0;
/// Zoom change applied per scroll notch.
pub const ZOOM_STEP: f32 = 0.025;

// Export
/// Default margin (in world units) around the exported scene.
pub const EXPORT_MARGIN: f64 = 20.0;
/// Allowed range for the PNG export scale factor.
pub const PNG_SCALE_RANGE: (f32, f32) = (0.25, 8.0);

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;
