//! Undo/redo functionality for tracking and reversing user actions.
//!
//! Every action stores enough state to reverse itself, and reversing an action
//! yields the action that re-applies it. Resizes are restored through
//! [`EllipseNode::resize_to`] so the control offsets follow the restored size.

use crate::constants::MAX_UNDO_HISTORY;
use crate::ellipse::EllipseNode;
use crate::scene::Scene;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Represents different types of actions that can be undone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UndoAction {
    /// A node was moved from one position to another
    NodeMoved {
        /// Node that moved
        node_id: NodeId,
        /// Position before the move
        old_position: Position,
        /// Position after the move
        new_position: Position,
    },
    /// A node's bounding box was resized
    NodeResized {
        /// Node that was resized
        node_id: NodeId,
        /// Dimension before the resize
        old_dimension: Dimension,
        /// Dimension after the resize
        new_dimension: Dimension,
    },
    /// A node's name, style, pick mode or flags changed
    PropertiesChanged {
        /// Node whose properties changed
        node_id: NodeId,
        /// Properties before the change
        old_properties: NodeProperties,
        /// Properties after the change
        new_properties: NodeProperties,
    },
    /// A node was deleted from the given paint index
    NodeDeleted {
        /// The removed node
        node: EllipseNode,
        /// Paint index it was removed from
        index: usize,
    },
    /// A node was created (directly or by copying)
    NodeCreated {
        /// Node that was added
        node_id: NodeId,
    },
}

/// Manages undo/redo history for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UndoHistory {
    /// Stack of actions that can be undone
    #[serde(skip)]
    undo_stack: Vec<UndoAction>,
    /// Stack of actions that can be redone
    #[serde(skip)]
    redo_stack: Vec<UndoAction>,
}

impl UndoHistory {
    /// Creates a new empty undo history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action to the undo history.
    ///
    /// This clears the redo stack since a new action invalidates any previously undone actions.
    pub fn push_action(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Returns true if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the most recent action from the undo stack.
    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop()
    }

    /// Pops the most recent action from the redo stack.
    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop()
    }

    /// Pushes an action onto the redo stack.
    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push(action);
    }

    /// Pushes an action back onto the undo stack without touching redo history.
    pub fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
    }

    /// Clears all undo and redo history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Extension methods for applying undo/redo actions to a scene.
pub trait UndoableScene {
    /// Reverses an action, returning the action that re-applies it.
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction>;

    /// Re-applies a previously reversed action.
    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction>;
}

impl UndoableScene for Scene {
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        match action {
            UndoAction::NodeMoved {
                node_id,
                old_position,
                new_position,
            } => {
                let node = self.node_mut(node_id)?;
                node.translate_to(old_position.x, old_position.y);
                Some(UndoAction::NodeMoved {
                    node_id: *node_id,
                    old_position: *new_position,
                    new_position: *old_position,
                })
            }
            UndoAction::NodeResized {
                node_id,
                old_dimension,
                new_dimension,
            } => {
                let node = self.node_mut(node_id)?;
                node.resize_to(old_dimension.width, old_dimension.height);
                Some(UndoAction::NodeResized {
                    node_id: *node_id,
                    old_dimension: *new_dimension,
                    new_dimension: *old_dimension,
                })
            }
            UndoAction::PropertiesChanged {
                node_id,
                old_properties,
                new_properties,
            } => {
                let node = self.node_mut(node_id)?;
                *node.properties_mut() = old_properties.clone();
                Some(UndoAction::PropertiesChanged {
                    node_id: *node_id,
                    old_properties: new_properties.clone(),
                    new_properties: old_properties.clone(),
                })
            }
            UndoAction::NodeDeleted { node, index } => {
                let node_id = self.insert_node(*index, node.clone());
                Some(UndoAction::NodeCreated { node_id })
            }
            UndoAction::NodeCreated { node_id } => {
                let (index, node) = self.remove_node(node_id)?;
                Some(UndoAction::NodeDeleted { node, index })
            }
        }
    }

    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        // Redo is just applying the reverse of an undo
        self.apply_undo(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_limits_size() {
        let mut history = UndoHistory::new();
        for _ in 0..(MAX_UNDO_HISTORY + 5) {
            history.push_action(UndoAction::NodeCreated {
                node_id: uuid::Uuid::new_v4(),
            });
        }

        let mut count = 0;
        while history.pop_undo().is_some() {
            count += 1;
        }
        assert_eq!(count, MAX_UNDO_HISTORY);
    }

    #[test]
    fn test_push_action_clears_redo() {
        let mut history = UndoHistory::new();
        history.push_redo(UndoAction::NodeCreated {
            node_id: uuid::Uuid::new_v4(),
        });
        assert!(history.can_redo());

        history.push_action(UndoAction::NodeCreated {
            node_id: uuid::Uuid::new_v4(),
        });

        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn test_undo_resize_restores_offsets() {
        let mut scene = Scene::new();
        let id = scene.add_node(EllipseNode::new(0.0, 0.0, 100.0, 50.0));
        scene.node_mut(&id).unwrap().resize_by(2.0, 1.0);

        let action = UndoAction::NodeResized {
            node_id: id,
            old_dimension: Dimension::new(100.0, 50.0),
            new_dimension: Dimension::new(200.0, 50.0),
        };
        let redo = scene.apply_undo(&action).unwrap();

        let node = scene.node(&id).unwrap();
        assert_eq!(node.dimension(), Dimension::new(100.0, 50.0));
        assert_eq!(node.control_offset_right(), 100.0 * node.bezier_factor());

        scene.apply_redo(&redo).unwrap();
        assert_eq!(
            scene.node(&id).unwrap().dimension(),
            Dimension::new(200.0, 50.0)
        );
    }

    #[test]
    fn test_undo_create_then_redo() {
        let mut scene = Scene::new();
        let first = scene.add_node(EllipseNode::new(0.0, 0.0, 10.0, 10.0));
        let second = scene.add_node(EllipseNode::new(5.0, 5.0, 10.0, 10.0));

        let redo = scene
            .apply_undo(&UndoAction::NodeCreated { node_id: first })
            .unwrap();
        assert!(scene.node(&first).is_none());

        scene.apply_redo(&redo).unwrap();
        assert_eq!(scene.index_of(&first), Some(0));
        assert_eq!(scene.index_of(&second), Some(1));
    }

    #[test]
    fn test_undo_move_and_properties() {
        let mut scene = Scene::new();
        let id = scene.add_node(EllipseNode::new(0.0, 0.0, 10.0, 10.0));
        let old_properties = scene.node(&id).unwrap().properties().clone();
        let mut new_properties = old_properties.clone();
        new_properties.pick_mode = PickMode::Region;

        scene.node_mut(&id).unwrap().translate_to(40.0, 40.0);
        *scene.node_mut(&id).unwrap().properties_mut() = new_properties.clone();

        scene.apply_undo(&UndoAction::NodeMoved {
            node_id: id,
            old_position: Position::new(0.0, 0.0),
            new_position: Position::new(40.0, 40.0),
        });
        scene.apply_undo(&UndoAction::PropertiesChanged {
            node_id: id,
            old_properties: old_properties.clone(),
            new_properties,
        });

        let node = scene.node(&id).unwrap();
        assert_eq!(node.position(), Position::new(0.0, 0.0));
        assert_eq!(node.properties(), &old_properties);
    }

    #[test]
    fn test_undo_missing_node_is_noop() {
        let mut scene = Scene::new();
        let action = UndoAction::NodeMoved {
            node_id: uuid::Uuid::new_v4(),
            old_position: Position::default(),
            new_position: Position::default(),
        };

        assert!(scene.apply_undo(&action).is_none());
    }
}
