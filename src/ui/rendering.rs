//! Canvas rendering functionality for the scene, grid and selection.
//!
//! Nodes are drawn through [`CanvasSurface`], a [`DrawingSurface`] that
//! flattens the node's Bézier path into egui shapes in screen space.

use super::state::ViewerApp;
use crate::surface::DrawingSurface;
use crate::types::*;
use egui::epaint::{CubicBezierShape, StrokeKind};
use std::convert::Infallible;

/// Converts a node colour to an egui colour.
pub fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// A drawing surface that turns path commands into egui shapes.
///
/// Coordinates are mapped from world space with `world * zoom + offset`,
/// matching the canvas transform. Curves are flattened with
/// [`FLATTEN_TOLERANCE`](crate::constants::FLATTEN_TOLERANCE).
pub struct CanvasSurface {
    zoom: f32,
    offset: egui::Vec2,
    fill: egui::Color32,
    stroke: egui::Stroke,
    subpaths: Vec<Vec<egui::Pos2>>,
    shapes: Vec<egui::Shape>,
}

impl CanvasSurface {
    /// Creates a surface for the given zoom factor and pan offset.
    pub fn new(zoom: f32, offset: egui::Vec2) -> Self {
        Self {
            zoom,
            offset,
            fill: to_color32(NodeStyle::default().fill_color),
            stroke: egui::Stroke::NONE,
            subpaths: Vec::new(),
            shapes: Vec::new(),
        }
    }

    /// The shapes produced so far.
    pub fn shapes(&self) -> &[egui::Shape] {
        &self.shapes
    }

    /// Consumes the surface and returns its shapes for a painter.
    pub fn into_shapes(self) -> Vec<egui::Shape> {
        self.shapes
    }

    fn to_screen(&self, p: Position) -> egui::Pos2 {
        egui::pos2(p.x as f32, p.y as f32) * self.zoom + self.offset
    }
}

impl DrawingSurface for CanvasSurface {
    type Error = Infallible;

    fn set_style(&mut self, style: &NodeStyle) -> Result<(), Self::Error> {
        self.fill = to_color32(style.fill_color);
        self.stroke = egui::Stroke::new(
            style.line_width as f32 * self.zoom,
            to_color32(style.stroke_color),
        );
        Ok(())
    }

    fn begin_path(&mut self) -> Result<(), Self::Error> {
        self.subpaths.clear();
        Ok(())
    }

    fn move_to(&mut self, to: Position) -> Result<(), Self::Error> {
        let p = self.to_screen(to);
        self.subpaths.push(vec![p]);
        Ok(())
    }

    fn bezier_curve_to(
        &mut self,
        cp1: Position,
        cp2: Position,
        to: Position,
    ) -> Result<(), Self::Error> {
        let points = [self.to_screen(cp1), self.to_screen(cp2), self.to_screen(to)];
        // A curve without a preceding move starts at its first control point
        let start = self
            .subpaths
            .last()
            .and_then(|sub| sub.last().copied())
            .unwrap_or(points[0]);
        let curve = CubicBezierShape::from_points_stroke(
            [start, points[0], points[1], points[2]],
            false,
            egui::Color32::TRANSPARENT,
            egui::Stroke::NONE,
        );
        let flattened = curve.flatten(Some(crate::constants::FLATTEN_TOLERANCE));

        match self.subpaths.last_mut() {
            Some(sub) => sub.extend(flattened.into_iter().skip(1)),
            None => self.subpaths.push(flattened),
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<(), Self::Error> {
        for sub in self.subpaths.iter().filter(|sub| sub.len() >= 3) {
            self.shapes.push(egui::Shape::convex_polygon(
                sub.clone(),
                self.fill,
                egui::Stroke::NONE,
            ));
        }
        Ok(())
    }

    fn stroke(&mut self) -> Result<(), Self::Error> {
        for sub in self.subpaths.iter().filter(|sub| sub.len() >= 2) {
            self.shapes.push(egui::Shape::line(sub.clone(), self.stroke));
        }
        Ok(())
    }

    fn close_path(&mut self) -> Result<(), Self::Error> {
        if let Some(sub) = self.subpaths.last_mut() {
            if let (Some(first), Some(last)) = (sub.first().copied(), sub.last().copied()) {
                if first != last {
                    sub.push(first);
                }
            }
        }
        Ok(())
    }
}

impl ViewerApp {
    /// Renders the grid, the scene and the selection overlay on the canvas.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    /// * `canvas_rect` - The screen-space rectangle of the canvas area
    pub fn render_scene(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        if self.settings.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        let mut surface = CanvasSurface::new(self.canvas.zoom_factor, self.canvas.offset);
        self.scene
            .render(&mut surface)
            .unwrap_or_else(|never| match never {});
        painter.extend(surface.into_shapes());

        if let Some(selected) = self.interaction.selected_node {
            self.draw_selection(painter, selected);
        }
    }

    /// Outlines the selected node's bounding box and marks its four Bézier
    /// control points.
    fn draw_selection(&self, painter: &egui::Painter, node_id: NodeId) {
        let Some(node) = self.scene.node(&node_id) else {
            return;
        };
        let Position { x, y } = node.position();
        let Dimension { width, height } = node.dimension();

        let min = self.world_to_screen(egui::pos2(x as f32, y as f32));
        let max = self.world_to_screen(egui::pos2((x + width) as f32, (y + height) as f32));
        let rect = egui::Rect::from_two_pos(min, max);
        let highlight = egui::Color32::from_rgb(100, 150, 255);
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(crate::constants::SELECTION_STROKE_WIDTH, highlight),
            StrokeKind::Outside,
        );

        for offset in [node.control_offset_right(), node.control_offset_left()] {
            for dy in [0.0, height] {
                let p = self.world_to_screen(egui::pos2((x + offset) as f32, (y + dy) as f32));
                painter.circle_stroke(p, 3.0, egui::Stroke::new(1.0, highlight));
            }
        }
    }

    /// Draws a zoom-aware grid on the canvas for visual reference.
    ///
    /// Grid lines are skipped entirely when zoomed out far enough that they
    /// would be closer than two pixels apart. Axis lines are emphasised once
    /// cells exceed ten pixels.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let grid_size = crate::constants::GRID_SIZE;
        let grid_color = egui::Color32::from_rgba_unmultiplied(128, 128, 128, 32);
        let stroke = egui::Stroke::new(1.0, grid_color);

        let screen_grid_size = grid_size * self.canvas.zoom_factor;
        if screen_grid_size < 2.0 {
            return;
        }

        let top_left_world = self.screen_to_world(canvas_rect.min);
        let bottom_right_world = self.screen_to_world(canvas_rect.max);

        let start_x = (top_left_world.x / grid_size).floor() * grid_size;
        let end_x = (bottom_right_world.x / grid_size).ceil() * grid_size;
        let start_y = (top_left_world.y / grid_size).floor() * grid_size;
        let end_y = (bottom_right_world.y / grid_size).ceil() * grid_size;

        let mut x = start_x;
        while x <= end_x {
            let screen_x = self.world_to_screen(egui::pos2(x, 0.0)).x;
            if screen_x >= canvas_rect.min.x && screen_x <= canvas_rect.max.x {
                painter.line_segment(
                    [
                        egui::pos2(screen_x, canvas_rect.min.y),
                        egui::pos2(screen_x, canvas_rect.max.y),
                    ],
                    stroke,
                );
            }
            x += grid_size;
        }

        let mut y = start_y;
        while y <= end_y {
            let screen_y = self.world_to_screen(egui::pos2(0.0, y)).y;
            if screen_y >= canvas_rect.min.y && screen_y <= canvas_rect.max.y {
                painter.line_segment(
                    [
                        egui::pos2(canvas_rect.min.x, screen_y),
                        egui::pos2(canvas_rect.max.x, screen_y),
                    ],
                    stroke,
                );
            }
            y += grid_size;
        }

        if screen_grid_size > 10.0 {
            let axis_stroke =
                egui::Stroke::new(1.5, egui::Color32::from_rgba_unmultiplied(128, 128, 128, 80));
            let origin = self.world_to_screen(egui::Pos2::ZERO);

            if origin.y >= canvas_rect.min.y && origin.y <= canvas_rect.max.y {
                painter.line_segment(
                    [
                        egui::pos2(canvas_rect.min.x, origin.y),
                        egui::pos2(canvas_rect.max.x, origin.y),
                    ],
                    axis_stroke,
                );
            }
            if origin.x >= canvas_rect.min.x && origin.x <= canvas_rect.max.x {
                painter.line_segment(
                    [
                        egui::pos2(origin.x, canvas_rect.min.y),
                        egui::pos2(origin.x, canvas_rect.max.y),
                    ],
                    axis_stroke,
                );
            }
        }
    }
}
