//! Core data types for the scene graph.
//!
//! This module defines the geometry primitives, node styling and the generic
//! [`SceneNode`] that concrete shapes build on. A `SceneNode` owns position and
//! dimension storage together with the plain resize primitives; shapes wrap it
//! and decide what happens after a resize.

use crate::constants;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for scene nodes.
pub type NodeId = Uuid;

/// A point in parent coordinate space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of a node's bounding box.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Dimension {
    /// Width of the bounding box
    pub width: f64,
    /// Height of the bounding box
    pub height: f64,
}

impl Dimension {
    /// Creates a new dimension.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::from_rgba8(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Color = Color::from_rgba8(255, 255, 255, 255);
    /// The default fill colour for new nodes.
    pub const LIGHT_BLUE: Color = Color::from_rgba8(173, 216, 230, 255);

    /// Creates a colour from its four channels.
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Formats the colour channels as an SVG `rgb(...)` value (alpha excluded).
    pub fn to_svg_rgb(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Alpha as a fraction in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

/// Fill and outline configuration handed to the drawing surface before a node renders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NodeStyle {
    /// Colour used by `fill`
    pub fill_color: Color,
    /// Colour used by `stroke`
    pub stroke_color: Color,
    /// Outline width; nodes skip stroking entirely when this is not positive
    pub line_width: f64,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::LIGHT_BLUE,
            stroke_color: Color::BLACK,
            line_width: constants::DEFAULT_LINE_WIDTH,
        }
    }
}

/// Strategy used to decide whether a pointer position hits a node.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PickMode {
    /// Pixel-precise detection against the rendered shape
    #[default]
    Ghost,
    /// Cheaper detection against the bounding box
    Region,
}

/// Non-geometric node state shared between a node and its copies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeProperties {
    /// User-displayable name of the node
    pub name: String,
    /// Fill and outline configuration
    pub style: NodeStyle,
    /// Hit-testing strategy
    pub pick_mode: PickMode,
    /// Whether the node is drawn at all
    pub is_visible: bool,
    /// Whether the node can be selected by clicking
    pub is_clickable: bool,
    /// Whether the node can be moved by dragging
    pub is_draggable: bool,
    /// Whether the node may be resized interactively
    pub is_resizable: bool,
}

impl Default for NodeProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            style: NodeStyle::default(),
            pick_mode: PickMode::Ghost,
            is_visible: true,
            is_clickable: true,
            is_draggable: true,
            is_resizable: true,
        }
    }
}

/// The generic scene-graph node: identity, placement, size and shared properties.
///
/// `dimension` is private and can only change through the three resize
/// primitives, which gives shapes wrapping a `SceneNode` a single place to hook
/// derived-geometry updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneNode {
    id: NodeId,
    position: Position,
    dimension: Dimension,
    /// Name, style, pick mode and flags
    #[serde(default)]
    pub properties: NodeProperties,
}

impl SceneNode {
    /// Creates a new node at `(x, y)` with an empty bounding box.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position: Position::new(x, y),
            dimension: Dimension::default(),
            properties: NodeProperties::default(),
        }
    }

    /// Unique identifier of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Top-left corner of the bounding box in parent space.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Size of the bounding box.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Moves the node to an absolute position.
    pub fn translate_to(&mut self, x: f64, y: f64) {
        self.position = Position::new(x, y);
    }

    /// Moves the node by a relative offset.
    pub fn translate_with(&mut self, dx: f64, dy: f64) {
        self.position.x += dx;
        self.position.y += dy;
    }

    /// Replaces the current dimension.
    pub fn resize_to(&mut self, width: f64, height: f64) {
        self.dimension = Dimension::new(width, height);
    }

    /// Multiplies the current dimension by the given factors.
    pub fn resize_by(&mut self, width_factor: f64, height_factor: f64) {
        self.dimension.width *= width_factor;
        self.dimension.height *= height_factor;
    }

    /// Adds the given amounts to the current dimension.
    pub fn resize_with(&mut self, dw: f64, dh: f64) {
        self.dimension.width += dw;
        self.dimension.height += dh;
    }

    /// Returns true if `(x, y)` lies inside the bounding box.
    ///
    /// Negative sizes describe a box mirrored around the position, so the box
    /// is normalised before testing.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let x0 = self.position.x;
        let y0 = self.position.y;
        let x1 = x0 + self.dimension.width;
        let y1 = y0 + self.dimension.height;
        x >= x0.min(x1) && x <= x0.max(x1) && y >= y0.min(y1) && y <= y0.max(y1)
    }

    /// Copy-finalization step: transfers the shared properties onto a freshly
    /// constructed node. The target keeps its own id, position and dimension.
    pub fn copy_properties_to(&self, target: &mut SceneNode) {
        target.properties = self.properties.clone();
    }
}
