//! Scene container holding ellipse nodes in paint order.
//!
//! The scene owns its nodes, renders them back to front through an
//! [`Offset`] surface so each node sees its own local origin, and persists
//! itself as JSON.

use crate::ellipse::EllipseNode;
use crate::surface::{DrawingSurface, Offset};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while rebuilding a scene from its saved form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// A saved node carries a type tag this crate cannot rebuild
    #[error("expected a node of type {expected}, found {found}")]
    UnexpectedClassType {
        /// The tag this node type accepts
        expected: &'static str,
        /// The tag found in the input
        found: String,
    },
    /// Two saved nodes carry the same id
    #[error("duplicate node id {0}")]
    DuplicateNodeId(NodeId),
}

/// Axis-aligned bounds in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest x covered
    pub min_x: f64,
    /// Smallest y covered
    pub min_y: f64,
    /// Largest x covered
    pub max_x: f64,
    /// Largest y covered
    pub max_y: f64,
}

impl Bounds {
    /// Width of the bounds.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounds.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// An ordered collection of nodes. Later nodes paint over earlier ones.
///
/// Node ids are unique within a scene; loading input that repeats an id fails
/// with [`SceneError::DuplicateNodeId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "SceneRecord")]
pub struct Scene {
    /// Nodes in paint order (back to front)
    pub nodes: Vec<EllipseNode>,
}

/// Saved form of a scene, checked before it becomes a [`Scene`].
#[derive(Deserialize)]
struct SceneRecord {
    #[serde(default)]
    nodes: Vec<EllipseNode>,
}

impl TryFrom<SceneRecord> for Scene {
    type Error = SceneError;

    fn try_from(record: SceneRecord) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(record.nodes.len());
        let duplicate = record
            .nodes
            .iter()
            .map(EllipseNode::id)
            .find(|id| !seen.insert(*id));
        if let Some(id) = duplicate {
            return Err(SceneError::DuplicateNodeId(id));
        }
        Ok(Self {
            nodes: record.nodes,
        })
    }
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the scene to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a scene from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Appends a node on top of the scene and returns its ID.
    pub fn add_node(&mut self, node: EllipseNode) -> NodeId {
        let id = node.id();
        self.nodes.push(node);
        id
    }

    /// Inserts a node at a given paint index, clamped to the node count.
    pub fn insert_node(&mut self, index: usize, node: EllipseNode) -> NodeId {
        let id = node.id();
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
        id
    }

    /// Removes a node, returning it together with its former paint index.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<(usize, EllipseNode)> {
        let index = self.index_of(node_id)?;
        Some((index, self.nodes.remove(index)))
    }

    /// Paint index of a node.
    pub fn index_of(&self, node_id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == *node_id)
    }

    /// Looks up a node by ID.
    pub fn node(&self, node_id: &NodeId) -> Option<&EllipseNode> {
        self.nodes.iter().find(|n| n.id() == *node_id)
    }

    /// Looks up a node by ID for modification.
    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut EllipseNode> {
        self.nodes.iter_mut().find(|n| n.id() == *node_id)
    }

    /// Copies a node and places the copy directly above the original.
    ///
    /// # Returns
    ///
    /// The ID of the copy, or `None` if the original doesn't exist.
    pub fn copy_node(&mut self, node_id: &NodeId) -> Option<NodeId> {
        let index = self.index_of(node_id)?;
        let copy = self.nodes[index].copy();
        Some(self.insert_node(index + 1, copy))
    }

    /// Finds the topmost visible, clickable node whose bounding box contains
    /// the point.
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|n| {
                let props = n.properties();
                props.is_visible && props.is_clickable && n.base().contains(x, y)
            })
            .map(EllipseNode::id)
    }

    /// Union of the bounding boxes of all visible nodes.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes
            .iter()
            .filter(|n| n.properties().is_visible)
            .map(|n| {
                let Position { x, y } = n.position();
                let Dimension { width, height } = n.dimension();
                Bounds {
                    min_x: x.min(x + width),
                    min_y: y.min(y + height),
                    max_x: x.max(x + width),
                    max_y: y.max(y + height),
                }
            })
            .reduce(|a, b| Bounds {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
            })
    }

    /// Renders every visible node back to front.
    ///
    /// Each node's style is applied to the surface first, then the node draws
    /// through an [`Offset`] so that its local origin is its position.
    pub fn render<S: DrawingSurface>(&self, surface: &mut S) -> Result<(), S::Error> {
        for node in self.nodes.iter().filter(|n| n.properties().is_visible) {
            surface.set_style(&node.properties().style)?;
            let mut local = Offset::new(surface, node.position());
            node.render(&mut local)?;
        }
        Ok(())
    }
}
