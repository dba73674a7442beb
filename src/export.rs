//! Export utilities: render a scene to SVG and PNG.
//!
//! SVG is produced by replaying the scene into [`SvgSurface`]. PNG export
//! parses that SVG with `usvg` and rasterises it with `resvg` into a
//! `tiny_skia` pixmap.

use crate::constants;
use crate::scene::Scene;
use crate::surface::{DrawingSurface, Offset};
use crate::types::{Color, NodeStyle, Position};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

/// Errors raised while exporting a scene.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The generated SVG could not be parsed for rasterisation
    #[error("failed to parse SVG for PNG export: {0}")]
    Svg(#[from] usvg::Error),
    /// The target pixmap could not be allocated
    #[error("failed to create pixmap {width}x{height}")]
    Pixmap {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
    /// PNG encoding failed
    #[error("failed to encode PNG: {0}")]
    Encode(String),
    /// Writing the output file failed
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// User-tunable export settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportOptions {
    /// Margin (in world units) added around the scene bounds
    pub margin: f64,
    /// Scale factor applied when rasterising to PNG
    pub png_scale: f32,
    /// Whether to paint a solid background behind the nodes
    pub include_background: bool,
    /// Colour of the optional background
    pub background_color: Color,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            margin: constants::EXPORT_MARGIN,
            png_scale: 1.0,
            include_background: false,
            background_color: Color::WHITE,
        }
    }
}

/// A drawing surface that writes SVG `<path>` elements.
///
/// Every `fill` and `stroke` call emits one element carrying the current path
/// data and the current style.
#[derive(Debug, Default)]
pub struct SvgSurface {
    style: NodeStyle,
    path: String,
    out: String,
}

impl SvgSurface {
    /// Creates an empty surface using the default node style.
    pub fn new() -> Self {
        Self::default()
    }

    /// The SVG elements emitted so far.
    pub fn elements(&self) -> &str {
        &self.out
    }

    /// Consumes the surface and returns the emitted elements.
    pub fn into_elements(self) -> String {
        self.out
    }
}

impl DrawingSurface for SvgSurface {
    type Error = Infallible;

    fn set_style(&mut self, style: &NodeStyle) -> Result<(), Self::Error> {
        self.style = *style;
        Ok(())
    }

    fn begin_path(&mut self) -> Result<(), Self::Error> {
        self.path.clear();
        Ok(())
    }

    fn move_to(&mut self, to: Position) -> Result<(), Self::Error> {
        let _ = write!(self.path, "M{:.3},{:.3} ", to.x, to.y);
        Ok(())
    }

    fn bezier_curve_to(
        &mut self,
        cp1: Position,
        cp2: Position,
        to: Position,
    ) -> Result<(), Self::Error> {
        let _ = write!(
            self.path,
            "C{:.3},{:.3} {:.3},{:.3} {:.3},{:.3} ",
            cp1.x, cp1.y, cp2.x, cp2.y, to.x, to.y
        );
        Ok(())
    }

    fn fill(&mut self) -> Result<(), Self::Error> {
        let c = self.style.fill_color;
        let _ = writeln!(
            self.out,
            "<path d=\"{}\" fill=\"{}\" fill-opacity=\"{}\" stroke=\"none\" />",
            self.path.trim_end(),
            c.to_svg_rgb(),
            c.opacity()
        );
        Ok(())
    }

    fn stroke(&mut self) -> Result<(), Self::Error> {
        let c = self.style.stroke_color;
        let _ = writeln!(
            self.out,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\" />",
            self.path.trim_end(),
            c.to_svg_rgb(),
            c.opacity(),
            self.style.line_width
        );
        Ok(())
    }

    fn close_path(&mut self) -> Result<(), Self::Error> {
        self.path.push('Z');
        Ok(())
    }
}

/// Build an SVG document for the scene. Returns (svg, width, height).
///
/// The viewBox covers the bounds of all visible nodes plus the margin. An
/// empty scene yields a canvas the size of one default node.
pub fn build_svg(scene: &Scene, options: &ExportOptions) -> (String, u32, u32) {
    let margin = options.margin.max(0.0);
    let (min_x, min_y, content_w, content_h) = match scene.bounds() {
        Some(b) => (b.min_x, b.min_y, b.width(), b.height()),
        None => (0.0, 0.0, constants::NODE_WIDTH, constants::NODE_HEIGHT),
    };

    let width = (content_w + 2.0 * margin).ceil().max(1.0) as u32;
    let height = (content_h + 2.0 * margin).ceil().max(1.0) as u32;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );

    if options.include_background {
        let c = options.background_color;
        let _ = writeln!(
            out,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\" fill-opacity=\"{}\" />",
            width,
            height,
            c.to_svg_rgb(),
            c.opacity()
        );
    }

    // Map scene coordinates so the bounds' top-left lands at (margin, margin)
    let mut surface = SvgSurface::new();
    let origin = Position::new(margin - min_x, margin - min_y);
    scene
        .render(&mut Offset::new(&mut surface, origin))
        .unwrap_or_else(|never| match never {});
    out.push_str(surface.elements());

    let _ = writeln!(out, "</svg>");
    (out, width, height)
}

/// Rasterise the scene into a pixmap using the options' scale and background.
pub fn render_png(
    scene: &Scene,
    options: &ExportOptions,
) -> Result<tiny_skia::Pixmap, ExportError> {
    let (svg, width, height) = build_svg(scene, options);

    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)?;

    let (lo, hi) = constants::PNG_SCALE_RANGE;
    let scale = options.png_scale.clamp(lo, hi);
    let out_w = ((width as f32) * scale).round().max(1.0) as u32;
    let out_h = ((height as f32) * scale).round().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(out_w, out_h).ok_or(ExportError::Pixmap {
        width: out_w,
        height: out_h,
    })?;

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    log::debug!("rasterised scene to {out_w}x{out_h} at scale {scale}");
    Ok(pixmap)
}

/// Write the scene as an SVG file.
pub fn write_svg(scene: &Scene, options: &ExportOptions, path: &Path) -> Result<(), ExportError> {
    let (svg, _w, _h) = build_svg(scene, options);
    std::fs::write(path, svg.as_bytes())?;
    Ok(())
}

/// Write the scene as a PNG file.
pub fn write_png(scene: &Scene, options: &ExportOptions, path: &Path) -> Result<(), ExportError> {
    let pixmap = render_png(scene, options)?;
    let data = pixmap
        .encode_png()
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipse::EllipseNode;

    fn single_node_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_node(EllipseNode::new(0.0, 0.0, 100.0, 50.0));
        scene
    }

    fn no_margin() -> ExportOptions {
        ExportOptions {
            margin: 0.0,
            ..ExportOptions::default()
        }
    }

    #[test]
    fn test_svg_surface_emits_fill_and_stroke() {
        let node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);
        let mut surface = SvgSurface::new();

        node.render(&mut surface).unwrap();
        let svg = surface.elements();

        assert_eq!(svg.lines().count(), 2);
        assert!(svg.contains(
            "d=\"M50.000,0.000 C116.667,0.000 116.667,50.000 50.000,50.000 C-16.667,50.000 -16.667,0.000 50.000,0.000\""
        ));
        assert!(svg.contains("stroke=\"none\""));
        assert!(svg.contains("stroke-width=\"2\""));
    }

    #[test]
    fn test_svg_surface_without_line_width() {
        let mut node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);
        node.properties_mut().style.line_width = 0.0;
        let mut surface = SvgSurface::new();

        node.render(&mut surface).unwrap();

        assert_eq!(surface.elements().lines().count(), 1);
        assert!(!surface.elements().contains("stroke-width"));
    }

    #[test]
    fn test_build_svg_dimensions_and_mapping() {
        let mut scene = Scene::new();
        scene.add_node(EllipseNode::new(100.0, 200.0, 100.0, 50.0));
        let options = ExportOptions {
            margin: 10.0,
            ..ExportOptions::default()
        };

        let (svg, w, h) = build_svg(&scene, &options);

        assert_eq!((w, h), (120, 70));
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("M60.000,10.000"));
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn test_build_svg_empty_scene_fallback() {
        let (svg, w, h) = build_svg(&Scene::new(), &no_margin());

        assert_eq!(w, constants::NODE_WIDTH as u32);
        assert_eq!(h, constants::NODE_HEIGHT as u32);
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_build_svg_background() {
        let options = ExportOptions {
            include_background: true,
            background_color: Color::from_rgba8(10, 20, 30, 255),
            ..no_margin()
        };

        let (svg, _, _) = build_svg(&single_node_scene(), &options);

        assert!(svg.contains("<rect x=\"0\" y=\"0\" width=\"100\" height=\"50\" fill=\"rgb(10,20,30)\""));
    }

    #[test]
    fn test_render_png_size_and_coverage() {
        let pixmap = render_png(&single_node_scene(), &no_margin()).unwrap();

        assert_eq!((pixmap.width(), pixmap.height()), (100, 50));
        let center = pixmap.pixel(50, 25).unwrap();
        assert_eq!(center.alpha(), 255);
        let corner = pixmap.pixel(0, 0).unwrap();
        assert_eq!(corner.alpha(), 0);
    }

    #[test]
    fn test_render_png_scale_is_clamped() {
        let options = ExportOptions {
            png_scale: 100.0,
            ..no_margin()
        };

        let pixmap = render_png(&single_node_scene(), &options).unwrap();

        assert_eq!((pixmap.width(), pixmap.height()), (800, 400));
    }

    #[test]
    fn test_write_svg_and_png() {
        let dir = std::env::temp_dir().join(format!("ellipse_scene_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let svg_path = dir.join("scene.svg");
        let png_path = dir.join("scene.png");

        write_svg(&single_node_scene(), &no_margin(), &svg_path).unwrap();
        write_png(&single_node_scene(), &no_margin(), &png_path).unwrap();

        let svg = std::fs::read_to_string(&svg_path).unwrap();
        assert!(svg.contains("<path"));
        let png = std::fs::read(&png_path).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_svg_reports_io_error() {
        let path = std::env::temp_dir()
            .join(format!("missing_{}", uuid::Uuid::new_v4()))
            .join("scene.svg");

        let result = write_svg(&single_node_scene(), &no_margin(), &path);

        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
