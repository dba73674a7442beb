//! Drawing-surface abstraction used by node rendering.
//!
//! Nodes describe themselves as a path (move, cubic Bézier, close) followed by
//! fill/stroke calls. Backends implement [`DrawingSurface`]; this module also
//! provides a recording backend and an adapter that shifts the origin.

use crate::types::{NodeStyle, Position};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// A 2D path-drawing target.
///
/// Implementations report their own failures through `Error`; callers such as
/// [`EllipseNode::render`](crate::EllipseNode::render) return the first one
/// unchanged.
pub trait DrawingSurface {
    /// Failure type reported by this surface.
    type Error;

    /// Sets the style used by subsequent `fill` and `stroke` calls.
    fn set_style(&mut self, style: &NodeStyle) -> Result<(), Self::Error>;

    /// Discards the current path and starts a new one.
    fn begin_path(&mut self) -> Result<(), Self::Error>;

    /// Starts a new sub-path at `to`.
    fn move_to(&mut self, to: Position) -> Result<(), Self::Error>;

    /// Appends a cubic Bézier segment from the current point to `to`.
    fn bezier_curve_to(
        &mut self,
        cp1: Position,
        cp2: Position,
        to: Position,
    ) -> Result<(), Self::Error>;

    /// Fills the current path with the current fill style.
    fn fill(&mut self) -> Result<(), Self::Error>;

    /// Outlines the current path with the current stroke style.
    fn stroke(&mut self) -> Result<(), Self::Error>;

    /// Closes the current sub-path.
    fn close_path(&mut self) -> Result<(), Self::Error>;
}

/// A single call made against a [`DrawingSurface`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DrawCommand {
    /// `set_style`
    SetStyle(NodeStyle),
    /// `begin_path`
    BeginPath,
    /// `move_to`
    MoveTo(Position),
    /// `bezier_curve_to`
    BezierCurveTo {
        /// First control point
        cp1: Position,
        /// Second control point
        cp2: Position,
        /// End point
        to: Position,
    },
    /// `fill`
    Fill,
    /// `stroke`
    Stroke,
    /// `close_path`
    ClosePath,
}

/// A surface that records every call instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands recorded so far, in call order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Removes and returns the recorded commands.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Serialize the recorded commands to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.commands)
    }
}

impl DrawingSurface for CommandRecorder {
    type Error = Infallible;

    fn set_style(&mut self, style: &NodeStyle) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::SetStyle(*style));
        Ok(())
    }

    fn begin_path(&mut self) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::BeginPath);
        Ok(())
    }

    fn move_to(&mut self, to: Position) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::MoveTo(to));
        Ok(())
    }

    fn bezier_curve_to(
        &mut self,
        cp1: Position,
        cp2: Position,
        to: Position,
    ) -> Result<(), Self::Error> {
        self.commands
            .push(DrawCommand::BezierCurveTo { cp1, cp2, to });
        Ok(())
    }

    fn fill(&mut self) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::Fill);
        Ok(())
    }

    fn stroke(&mut self) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::Stroke);
        Ok(())
    }

    fn close_path(&mut self) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::ClosePath);
        Ok(())
    }
}

/// Adapter that translates every coordinate by a fixed offset before
/// forwarding to the wrapped surface.
///
/// The scene uses it to give each node a surface whose origin is the node's
/// top-left corner.
pub struct Offset<'a, S: DrawingSurface> {
    inner: &'a mut S,
    dx: f64,
    dy: f64,
}

impl<'a, S: DrawingSurface> Offset<'a, S> {
    /// Wraps `inner` so that local `(0, 0)` maps to `origin`.
    pub fn new(inner: &'a mut S, origin: Position) -> Self {
        Self {
            inner,
            dx: origin.x,
            dy: origin.y,
        }
    }

    fn shift(&self, p: Position) -> Position {
        Position::new(p.x + self.dx, p.y + self.dy)
    }
}

impl<S: DrawingSurface> DrawingSurface for Offset<'_, S> {
    type Error = S::Error;

    fn set_style(&mut self, style: &NodeStyle) -> Result<(), Self::Error> {
        self.inner.set_style(style)
    }

    fn begin_path(&mut self) -> Result<(), Self::Error> {
        self.inner.begin_path()
    }

    fn move_to(&mut self, to: Position) -> Result<(), Self::Error> {
        let to = self.shift(to);
        self.inner.move_to(to)
    }

    fn bezier_curve_to(
        &mut self,
        cp1: Position,
        cp2: Position,
        to: Position,
    ) -> Result<(), Self::Error> {
        let (cp1, cp2, to) = (self.shift(cp1), self.shift(cp2), self.shift(to));
        self.inner.bezier_curve_to(cp1, cp2, to)
    }

    fn fill(&mut self) -> Result<(), Self::Error> {
        self.inner.fill()
    }

    fn stroke(&mut self) -> Result<(), Self::Error> {
        self.inner.stroke()
    }

    fn close_path(&mut self) -> Result<(), Self::Error> {
        self.inner.close_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_call_order() {
        let mut recorder = CommandRecorder::new();

        recorder.begin_path().unwrap();
        recorder.move_to(Position::new(1.0, 2.0)).unwrap();
        recorder.fill().unwrap();
        recorder.close_path().unwrap();

        assert_eq!(
            recorder.commands(),
            &[
                DrawCommand::BeginPath,
                DrawCommand::MoveTo(Position::new(1.0, 2.0)),
                DrawCommand::Fill,
                DrawCommand::ClosePath,
            ]
        );
    }

    #[test]
    fn test_recorder_take_empties_buffer() {
        let mut recorder = CommandRecorder::new();
        recorder.stroke().unwrap();

        let taken = recorder.take();

        assert_eq!(taken, vec![DrawCommand::Stroke]);
        assert!(recorder.commands().is_empty());
    }

    #[test]
    fn test_offset_shifts_points_only() {
        let mut recorder = CommandRecorder::new();
        {
            let mut shifted = Offset::new(&mut recorder, Position::new(10.0, -5.0));
            shifted.set_style(&NodeStyle::default()).unwrap();
            shifted.move_to(Position::new(0.0, 0.0)).unwrap();
            shifted
                .bezier_curve_to(
                    Position::new(1.0, 1.0),
                    Position::new(2.0, 2.0),
                    Position::new(3.0, 3.0),
                )
                .unwrap();
        }

        assert_eq!(
            recorder.commands(),
            &[
                DrawCommand::SetStyle(NodeStyle::default()),
                DrawCommand::MoveTo(Position::new(10.0, -5.0)),
                DrawCommand::BezierCurveTo {
                    cp1: Position::new(11.0, -4.0),
                    cp2: Position::new(12.0, -3.0),
                    to: Position::new(13.0, -2.0),
                },
            ]
        );
    }

    #[test]
    fn test_recorder_json_dump() {
        let mut recorder = CommandRecorder::new();
        recorder.begin_path().unwrap();
        recorder.move_to(Position::new(50.0, 0.0)).unwrap();

        let json = recorder.to_json().unwrap();

        assert!(json.contains("BeginPath"));
        assert!(json.contains("MoveTo"));
    }
}
