//! The ellipse node.
//!
//! An [`EllipseNode`] approximates the ellipse inscribed in its bounding box
//! with two cubic Bézier curves: one tracing the right half from top-centre to
//! bottom-centre, one tracing the left half back. Both curves pull their
//! control points horizontally by a fixed ratio of the width, so the only
//! derived geometry is a pair of x offsets that must follow every resize.

use crate::constants::{BEZIER_FACTOR, ELLIPSE_CLASS_TYPE};
use crate::scene::SceneError;
use crate::surface::DrawingSurface;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// An ellipse inscribed in the node's bounding box.
///
/// The wrapped [`SceneNode`] is private: the dimension can only change through
/// [`resize_to`](Self::resize_to), [`resize_by`](Self::resize_by) and
/// [`resize_with`](Self::resize_with), each of which recomputes the control
/// offsets before returning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct EllipseNode {
    base: SceneNode,
    bezier_factor: f64,
    complement_factor: f64,
    control_offset_right: f64,
    control_offset_left: f64,
}

impl EllipseNode {
    /// Creates an ellipse filling the box at `(x, y)` with the given size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let mut node = Self::from_base(SceneNode::new(x, y));
        node.resize_to(width, height);
        node
    }

    fn from_base(base: SceneNode) -> Self {
        let mut node = Self {
            base,
            bezier_factor: BEZIER_FACTOR,
            complement_factor: 1.0 - BEZIER_FACTOR,
            control_offset_right: 0.0,
            control_offset_left: 0.0,
        };
        node.recompute_offsets();
        node
    }

    /// Type tag used for dispatch and serialization.
    pub fn class_type(&self) -> &'static str {
        ELLIPSE_CLASS_TYPE
    }

    /// Read-only access to the underlying scene node.
    pub fn base(&self) -> &SceneNode {
        &self.base
    }

    /// Unique identifier of this node.
    pub fn id(&self) -> NodeId {
        self.base.id()
    }

    /// Top-left corner of the bounding box.
    pub fn position(&self) -> Position {
        self.base.position()
    }

    /// Size of the bounding box.
    pub fn dimension(&self) -> Dimension {
        self.base.dimension()
    }

    /// Shared properties (name, style, pick mode, flags).
    pub fn properties(&self) -> &NodeProperties {
        &self.base.properties
    }

    /// Mutable access to the shared properties. None of them affect the
    /// derived geometry.
    pub fn properties_mut(&mut self) -> &mut NodeProperties {
        &mut self.base.properties
    }

    /// Ratio used for the right-hand control points.
    pub fn bezier_factor(&self) -> f64 {
        self.bezier_factor
    }

    /// `1 - bezier_factor`, used for the left-hand control points.
    pub fn complement_factor(&self) -> f64 {
        self.complement_factor
    }

    /// X coordinate of both control points of the right half.
    pub fn control_offset_right(&self) -> f64 {
        self.control_offset_right
    }

    /// X coordinate of both control points of the left half.
    pub fn control_offset_left(&self) -> f64 {
        self.control_offset_left
    }

    /// Moves the node to an absolute position.
    pub fn translate_to(&mut self, x: f64, y: f64) {
        self.base.translate_to(x, y);
    }

    /// Moves the node by a relative offset.
    pub fn translate_with(&mut self, dx: f64, dy: f64) {
        self.base.translate_with(dx, dy);
    }

    /// Replaces the current dimension and recomputes the control offsets.
    pub fn resize_to(&mut self, width: f64, height: f64) {
        self.base.resize_to(width, height);
        self.recompute_offsets();
    }

    /// Multiplies the current dimension by the given factors and recomputes
    /// the control offsets.
    pub fn resize_by(&mut self, width_factor: f64, height_factor: f64) {
        self.base.resize_by(width_factor, height_factor);
        self.recompute_offsets();
    }

    /// Adds the given amounts to the current dimension and recomputes the
    /// control offsets.
    pub fn resize_with(&mut self, dw: f64, dh: f64) {
        self.base.resize_with(dw, dh);
        self.recompute_offsets();
    }

    fn recompute_offsets(&mut self) {
        let width = self.base.dimension().width;
        self.control_offset_right = width * self.bezier_factor;
        self.control_offset_left = width * self.complement_factor;
    }

    /// Draws the ellipse into `surface`, whose origin must already be the
    /// node's top-left corner.
    ///
    /// The path is filled with the surface's current fill style and stroked
    /// only when the node's line width is positive. The first surface error
    /// aborts drawing and is returned unchanged.
    pub fn render<S: DrawingSurface>(&self, surface: &mut S) -> Result<(), S::Error> {
        let Dimension { width, height } = self.base.dimension();
        let center_x = width / 2.0;
        let right = self.control_offset_right;
        let left = self.control_offset_left;

        surface.begin_path()?;
        surface.move_to(Position::new(center_x, 0.0))?;

        surface.bezier_curve_to(
            Position::new(right, 0.0),
            Position::new(right, height),
            Position::new(center_x, height),
        )?;
        surface.bezier_curve_to(
            Position::new(left, height),
            Position::new(left, 0.0),
            Position::new(center_x, 0.0),
        )?;

        surface.fill()?;
        if self.base.properties.style.line_width > 0.0 {
            surface.stroke()?;
        }

        surface.close_path()
    }

    /// Returns an independent copy with the same geometry and properties but
    /// a new identity.
    pub fn copy(&self) -> Self {
        let Position { x, y } = self.base.position();
        let Dimension { width, height } = self.base.dimension();

        let mut node = Self::new(x, y, width, height);
        self.base.copy_properties_to(&mut node.base);

        log::debug!("copied {} {} as {}", self.class_type(), self.id(), node.id());
        node
    }
}

/// On-disk form of a node: the type tag plus the base node. Derived geometry
/// is never stored; it is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Type tag identifying the concrete node kind
    pub class_type: String,
    /// Base node state
    pub node: SceneNode,
}

impl From<EllipseNode> for NodeRecord {
    fn from(ellipse: EllipseNode) -> Self {
        Self {
            class_type: ELLIPSE_CLASS_TYPE.to_string(),
            node: ellipse.base,
        }
    }
}

impl TryFrom<NodeRecord> for EllipseNode {
    type Error = SceneError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        if record.class_type != ELLIPSE_CLASS_TYPE {
            return Err(SceneError::UnexpectedClassType {
                expected: ELLIPSE_CLASS_TYPE,
                found: record.class_type,
            });
        }
        Ok(Self::from_base(record.node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CommandRecorder, DrawCommand};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    fn assert_offsets_consistent(node: &EllipseNode) {
        let width = node.dimension().width;
        assert_eq!(node.control_offset_right(), width * node.bezier_factor());
        assert_eq!(
            node.control_offset_left(),
            width * (1.0 - node.bezier_factor())
        );
    }

    #[test]
    fn test_construction_offsets() {
        let node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);

        assert!(approx(node.control_offset_right(), 116.667));
        assert!(approx(node.control_offset_left(), -16.667));
        assert_eq!(node.properties().pick_mode, PickMode::Ghost);
        assert_eq!(node.class_type(), "EllipseNode");
        assert_offsets_consistent(&node);
    }

    #[test]
    fn test_resize_to_updates_offsets() {
        let mut node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);

        node.resize_to(200.0, 50.0);

        assert!(approx(node.control_offset_right(), 233.333));
        assert!(approx(node.control_offset_left(), -33.333));
        assert_eq!(node.dimension().height, 50.0);
    }

    #[test]
    fn test_resize_by_matches_resize_to() {
        let mut scaled = EllipseNode::new(0.0, 0.0, 100.0, 50.0);
        let mut absolute = EllipseNode::new(0.0, 0.0, 100.0, 50.0);

        scaled.resize_by(2.0, 1.0);
        absolute.resize_to(200.0, 50.0);

        assert_eq!(scaled.dimension(), Dimension::new(200.0, 50.0));
        assert_eq!(scaled.control_offset_right(), absolute.control_offset_right());
        assert_eq!(scaled.control_offset_left(), absolute.control_offset_left());
    }

    #[test]
    fn test_resize_with_updates_offsets() {
        let mut node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);

        node.resize_with(50.0, -10.0);

        assert_eq!(node.dimension(), Dimension::new(150.0, 40.0));
        assert!(approx(node.control_offset_right(), 175.0));
        assert!(approx(node.control_offset_left(), -25.0));
    }

    #[test]
    fn test_offsets_hold_across_resize_sequence() {
        let mut node = EllipseNode::new(3.0, 4.0, 10.0, 10.0);

        let steps: [(u8, f64, f64); 8] = [
            (0, 37.5, 12.0),
            (1, 1.5, 0.25),
            (2, -7.25, 3.0),
            (1, 0.0, 2.0),
            (2, 99.0, 1.0),
            (0, -20.0, -5.0),
            (1, -3.0, 1.0),
            (2, 0.125, 0.0),
        ];
        for (kind, a, b) in steps {
            match kind {
                0 => node.resize_to(a, b),
                1 => node.resize_by(a, b),
                _ => node.resize_with(a, b),
            }
            assert_offsets_consistent(&node);
        }
    }

    #[test]
    fn test_factors_sum_to_one() {
        let mut node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(node.bezier_factor() + node.complement_factor(), 1.0);

        node.resize_by(3.0, 3.0);
        node.resize_with(-12.0, 4.0);
        node.resize_to(1.0, 1.0);

        assert_eq!(node.bezier_factor(), BEZIER_FACTOR);
        assert_eq!(node.bezier_factor() + node.complement_factor(), 1.0);
    }

    #[test]
    fn test_repeated_resize_is_idempotent() {
        let mut node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);

        node.resize_to(80.0, 40.0);
        let first = (node.control_offset_right(), node.control_offset_left());
        node.resize_to(80.0, 40.0);

        assert_eq!(
            (node.control_offset_right(), node.control_offset_left()),
            first
        );
    }

    #[test]
    fn test_render_command_sequence() {
        let node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);
        let mut recorder = CommandRecorder::new();

        node.render(&mut recorder).unwrap();
        let commands = recorder.commands();

        assert_eq!(commands.len(), 7);
        assert_eq!(commands[0], DrawCommand::BeginPath);
        assert_eq!(commands[1], DrawCommand::MoveTo(Position::new(50.0, 0.0)));
        match &commands[2] {
            DrawCommand::BezierCurveTo { cp1, cp2, to } => {
                assert!(approx(cp1.x, 116.667) && cp1.y == 0.0);
                assert!(approx(cp2.x, 116.667) && cp2.y == 50.0);
                assert_eq!(*to, Position::new(50.0, 50.0));
            }
            other => panic!("Expected right-half curve, got {other:?}"),
        }
        match &commands[3] {
            DrawCommand::BezierCurveTo { cp1, cp2, to } => {
                assert!(approx(cp1.x, -16.667) && cp1.y == 50.0);
                assert!(approx(cp2.x, -16.667) && cp2.y == 0.0);
                assert_eq!(*to, Position::new(50.0, 0.0));
            }
            other => panic!("Expected left-half curve, got {other:?}"),
        }
        assert_eq!(commands[4], DrawCommand::Fill);
        assert_eq!(commands[5], DrawCommand::Stroke);
        assert_eq!(commands[6], DrawCommand::ClosePath);
    }

    #[test]
    fn test_render_skips_stroke_without_line_width() {
        let mut node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);
        node.properties_mut().style.line_width = 0.0;
        let mut recorder = CommandRecorder::new();

        node.render(&mut recorder).unwrap();

        assert!(!recorder.commands().contains(&DrawCommand::Stroke));
        assert_eq!(recorder.commands().last(), Some(&DrawCommand::ClosePath));
        assert_eq!(recorder.commands()[4], DrawCommand::Fill);
    }

    #[test]
    fn test_render_is_deterministic() {
        let node = EllipseNode::new(7.0, 9.0, 64.0, 33.0);
        let mut first = CommandRecorder::new();
        let mut second = CommandRecorder::new();

        node.render(&mut first).unwrap();
        node.render(&mut second).unwrap();

        assert_eq!(first.commands(), second.commands());
    }

    #[test]
    fn test_render_ignores_position() {
        let near = EllipseNode::new(0.0, 0.0, 64.0, 33.0);
        let far = EllipseNode::new(500.0, -200.0, 64.0, 33.0);
        let mut a = CommandRecorder::new();
        let mut b = CommandRecorder::new();

        near.render(&mut a).unwrap();
        far.render(&mut b).unwrap();

        assert_eq!(a.commands(), b.commands());
    }

    #[test]
    fn test_negative_width_mirrors_shape() {
        let node = EllipseNode::new(0.0, 0.0, -100.0, 50.0);
        let mut recorder = CommandRecorder::new();

        node.render(&mut recorder).unwrap();

        assert!(approx(node.control_offset_right(), -116.667));
        assert!(approx(node.control_offset_left(), 16.667));
        assert_eq!(
            recorder.commands()[1],
            DrawCommand::MoveTo(Position::new(-50.0, 0.0))
        );
    }

    #[test]
    fn test_nan_dimension_is_not_rejected() {
        let mut node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);

        node.resize_to(f64::NAN, 10.0);

        assert!(node.control_offset_right().is_nan());
        assert!(node.control_offset_left().is_nan());
        assert_eq!(node.dimension().height, 10.0);
    }

    struct FailingSurface {
        calls: usize,
        fail_at: usize,
    }

    impl FailingSurface {
        fn step(&mut self) -> Result<(), String> {
            self.calls += 1;
            if self.calls == self.fail_at {
                Err(format!("call {} failed", self.calls))
            } else {
                Ok(())
            }
        }
    }

    impl DrawingSurface for FailingSurface {
        type Error = String;

        fn set_style(&mut self, _style: &NodeStyle) -> Result<(), String> {
            self.step()
        }
        fn begin_path(&mut self) -> Result<(), String> {
            self.step()
        }
        fn move_to(&mut self, _to: Position) -> Result<(), String> {
            self.step()
        }
        fn bezier_curve_to(
            &mut self,
            _cp1: Position,
            _cp2: Position,
            _to: Position,
        ) -> Result<(), String> {
            self.step()
        }
        fn fill(&mut self) -> Result<(), String> {
            self.step()
        }
        fn stroke(&mut self) -> Result<(), String> {
            self.step()
        }
        fn close_path(&mut self) -> Result<(), String> {
            self.step()
        }
    }

    #[test]
    fn test_render_propagates_first_surface_error() {
        let node = EllipseNode::new(0.0, 0.0, 100.0, 50.0);
        let mut surface = FailingSurface {
            calls: 0,
            fail_at: 3,
        };

        let result = node.render(&mut surface);

        assert_eq!(result, Err("call 3 failed".to_string()));
        assert_eq!(surface.calls, 3);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = EllipseNode::new(10.0, 20.0, 100.0, 50.0);
        original.properties_mut().name = "Oval".to_string();
        original.properties_mut().pick_mode = PickMode::Region;

        let mut copy = original.copy();

        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.position(), original.position());
        assert_eq!(copy.dimension(), original.dimension());
        assert_eq!(copy.properties(), original.properties());
        assert_eq!(copy.control_offset_right(), original.control_offset_right());

        original.resize_to(300.0, 10.0);
        assert_eq!(copy.dimension(), Dimension::new(100.0, 50.0));
        assert_offsets_consistent(&copy);

        copy.resize_by(0.5, 0.5);
        assert_eq!(original.dimension(), Dimension::new(300.0, 10.0));
        assert_offsets_consistent(&original);
    }

    #[test]
    fn test_serialization_rebuilds_offsets() {
        let mut node = EllipseNode::new(5.0, 6.0, 90.0, 30.0);
        node.resize_with(10.0, 0.0);

        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"class_type\":\"EllipseNode\""));
        assert!(!json.contains("control_offset"));

        let restored: EllipseNode = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, node);
        assert_offsets_consistent(&restored);
    }

    #[test]
    fn test_deserialize_rejects_other_class_type() {
        let node = EllipseNode::new(0.0, 0.0, 10.0, 10.0);
        let json = serde_json::to_string(&node)
            .unwrap()
            .replace("EllipseNode", "RectangleNode");

        let result: Result<EllipseNode, _> = serde_json::from_str(&json);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("RectangleNode"));
    }
}
