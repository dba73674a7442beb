//! # Ellipse Scene
//!
//! A retained-mode 2D scene of ellipse nodes. Each ellipse is approximated by
//! two cubic Bézier curves whose horizontal control offsets are derived from
//! the node's width and a fixed Bézier factor.
//!
//! ## Features
//! - [`EllipseNode`] with `resize_to`, `resize_by` and `resize_with`
//! - Rendering onto any [`DrawingSurface`]
//! - Scenes with paint order, hit testing and JSON persistence
//! - SVG and PNG export
//! - An egui viewer with panning, zooming, dragging and undo/redo

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
mod ellipse;
mod export;
mod scene;
mod surface;
mod types;
mod ui;

// Re-export public types and functions
pub use ellipse::*;
pub use export::*;
pub use scene::*;
pub use surface::*;
pub use types::*;
pub use ui::{ResizeOp, UndoAction, UndoHistory, UndoableScene, ViewerApp};

/// Runs the scene viewer with default window settings.
///
/// File dialogs are spawned on tokio, so this must be called from within a
/// tokio runtime.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// #[tokio::main]
/// async fn main() -> Result<(), eframe::Error> {
///     ellipse_scene::run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Ellipse Scene",
        options,
        Box::new(|cc| Ok(Box::new(ViewerApp::new(cc)))),
    )
}
