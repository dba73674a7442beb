//! Application state management structures.
//!
//! This module contains the state structures that track the viewer's current
//! UI state: canvas navigation, selection and dragging, the resize form,
//! file operations and the persisted user settings.

use super::undo::UndoHistory;
use crate::constants;
use crate::export::ExportOptions;
use crate::scene::Scene;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// User settings persisted between sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerSettings {
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Whether the grid should be displayed on the canvas
    pub show_grid: bool,
    /// Size of nodes created by double-clicking the canvas
    pub default_node_size: Dimension,
    /// Options used by SVG/PNG export
    pub export: ExportOptions,
    /// Remembered width of the properties panel
    pub properties_panel_width: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_grid: true,
            default_node_size: Dimension::new(constants::NODE_WIDTH, constants::NODE_HEIGHT),
            export: ExportOptions::default(),
            properties_panel_width: 300.0,
        }
    }
}

/// State related to canvas navigation and display.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasState {
    /// Current canvas pan offset for navigation (in screen space)
    #[serde(skip)]
    pub offset: egui::Vec2,
    /// Current zoom level (1.0 = normal, 2.0 = 2x zoom, 0.5 = 50% zoom)
    pub zoom_factor: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
        }
    }
}

/// State related to user interactions with nodes and canvas.
#[derive(Default)]
pub struct InteractionState {
    /// Currently selected node, if any
    pub selected_node: Option<NodeId>,
    /// Node currently being dragged by the user
    pub dragging_node: Option<NodeId>,
    /// Original node position before drag started (for undo)
    pub drag_original_position: Option<Position>,
    /// Offset from the pointer to the node's top-left corner during dragging (world units)
    pub node_drag_offset: egui::Vec2,
    /// Whether the user is currently panning the canvas
    pub is_panning: bool,
    /// Last mouse position during panning operation
    pub last_pan_pos: Option<egui::Pos2>,
    /// Text of the name field while it is being edited
    pub temp_node_name: String,
    /// Node whose name is being typed into `temp_node_name`, if any
    pub editing_node_name: Option<NodeId>,
    /// Panel edit applied live but not yet recorded for undo
    pub pending_panel_edit: Option<PanelEdit>,
}

/// Node state captured when a properties panel edit began.
///
/// Drags and colour picking change the node every frame; the edit is recorded
/// as a single undo entry against this snapshot once the pointer is released.
#[derive(Debug, Clone)]
pub struct PanelEdit {
    /// Node being edited
    pub node_id: NodeId,
    /// Position before the edit
    pub old_position: Position,
    /// Properties before the edit
    pub old_properties: NodeProperties,
}

/// Numeric inputs for the three resize operations in the properties panel.
#[derive(Debug, Clone, Copy)]
pub struct ResizeForm {
    /// Absolute size for `resize_to`
    pub to: (f64, f64),
    /// Factors for `resize_by`
    pub by: (f64, f64),
    /// Deltas for `resize_with`
    pub with: (f64, f64),
    /// Node the `to` fields were last seeded from
    pub seeded_from: Option<NodeId>,
}

impl Default for ResizeForm {
    fn default() -> Self {
        Self {
            to: (constants::NODE_WIDTH, constants::NODE_HEIGHT),
            by: (1.0, 1.0),
            with: (0.0, 0.0),
            seeded_from: None,
        }
    }
}

/// State related to file operations.
pub struct FileState {
    /// Current file path for save/load operations
    pub current_path: Option<String>,
    /// Flag indicating if the scene has unsaved changes
    pub has_unsaved_changes: bool,
    /// Save requested from the toolbar or a shortcut
    pub pending_save_operation: Option<PendingSaveOperation>,
    /// Load requested from the toolbar or a shortcut
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Channel for receiving file operation results from async contexts
    pub file_operation_sender: Option<Sender<FileOperationResult>>,
    pub file_operation_receiver: Option<Receiver<FileOperationResult>>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            has_unsaved_changes: false,
            pending_save_operation: None,
            pending_load_operation: None,
            file_operation_sender: Some(sender),
            file_operation_receiver: Some(receiver),
        }
    }
}

/// Represents a pending save operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingSaveOperation {
    /// Save with a new file path (show file picker)
    SaveAs,
    /// Save to the existing file path
    Save,
}

/// Represents a pending load operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker)
    Load,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(String),
    /// Load operation completed successfully with path and content
    LoadCompleted(String, String),
    /// Export finished and was written to the given path
    ExportCompleted(String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// The main application structure containing UI state and the scene.
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerApp {
    /// The scene being edited
    pub scene: Scene,
    /// Counter for generating unique default node names
    pub node_counter: u32,
    /// Canvas navigation and display state
    pub canvas: CanvasState,
    /// Persisted user settings
    pub settings: ViewerSettings,
    /// User interaction state
    #[serde(skip)]
    pub interaction: InteractionState,
    /// Inputs for the resize operations
    #[serde(skip)]
    pub resize_form: ResizeForm,
    /// File operations state
    #[serde(skip)]
    pub file: FileState,
    /// Undo/redo history for tracking and reversing actions
    #[serde(skip)]
    pub undo_history: UndoHistory,
}

impl Default for ViewerApp {
    fn default() -> Self {
        Self {
            scene: Scene::default(),
            node_counter: 0,
            canvas: CanvasState::default(),
            settings: ViewerSettings::default(),
            interaction: InteractionState::default(),
            resize_form: ResizeForm::default(),
            file: FileState::default(),
            undo_history: UndoHistory::new(),
        }
    }
}

impl ViewerApp {
    /// Restores the app from eframe storage, falling back to defaults.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.storage
            .and_then(|storage| storage.get_string(super::APP_STATE_KEY))
            .and_then(|json| match Self::from_json(&json) {
                Ok(app) => Some(app),
                Err(err) => {
                    log::warn!("Discarding stored app state: {err}");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Serializes the application state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes application state from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipse::EllipseNode;

    #[test]
    fn test_app_state_roundtrip_keeps_scene_and_settings() {
        let mut app = ViewerApp::default();
        app.scene.add_node(EllipseNode::new(1.0, 2.0, 30.0, 40.0));
        app.settings.dark_mode = false;
        app.settings.export.png_scale = 2.0;
        app.interaction.selected_node = Some(app.scene.nodes[0].id());

        let restored = ViewerApp::from_json(&app.to_json().unwrap()).unwrap();

        assert_eq!(restored.scene.nodes.len(), 1);
        assert_eq!(restored.settings, app.settings);
        assert!(restored.interaction.selected_node.is_none());
    }

    #[test]
    fn test_settings_fill_missing_fields() {
        let settings: ViewerSettings = serde_json::from_str(r#"{"show_grid":false}"#).unwrap();

        assert!(!settings.show_grid);
        assert!(settings.dark_mode);
        assert_eq!(settings.export, ExportOptions::default());
    }
}
