//! Canvas interaction and navigation functionality.
//!
//! This module handles canvas panning, zooming, selection, node dragging and
//! coordinate transformations between screen and world space.

use super::state::ViewerApp;
use super::undo::UndoAction;
use crate::constants;
use crate::ellipse::EllipseNode;
use crate::scene::Scene;
use crate::types::*;

/// Prefix of the default names given to new nodes.
const NODE_NAME_PREFIX: &str = "ellipse";

/// Largest `n` among default-style names (`ellipse<n>`) in the scene, or 0.
pub(super) fn highest_default_name_index(scene: &Scene) -> u32 {
    scene
        .nodes
        .iter()
        .filter_map(|node| {
            node.properties()
                .name
                .strip_prefix(NODE_NAME_PREFIX)?
                .parse::<u32>()
                .ok()
        })
        .max()
        .unwrap_or(0)
}

impl ViewerApp {
    /// Converts screen coordinates to world coordinates accounting for zoom and pan.
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.canvas.offset) / self.canvas.zoom_factor
    }

    /// Converts world coordinates to screen coordinates accounting for zoom and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Handles middle-click or Cmd/Ctrl+left-click canvas panning functionality.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        // modifiers.command is Cmd on macOS and Ctrl elsewhere
        let should_pan = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        });

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    self.canvas.offset += current_pos - last_pos;
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Handles scroll wheel zooming, keeping the world point under the cursor fixed.
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }

        let mouse_pos = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos());
        let Some(mouse_pos) = mouse_pos else {
            return;
        };
        if !response.rect.contains(mouse_pos) {
            return;
        }

        let anchor = self.screen_to_world(mouse_pos);
        let step = if scroll_delta > 0.0 {
            constants::ZOOM_STEP
        } else {
            -constants::ZOOM_STEP
        };
        let old_zoom = self.canvas.zoom_factor;
        self.canvas.zoom_factor =
            (old_zoom + step).clamp(constants::MIN_ZOOM, constants::MAX_ZOOM);

        if (self.canvas.zoom_factor - old_zoom).abs() > f32::EPSILON {
            let anchor_after = self.world_to_screen(anchor);
            self.canvas.offset += mouse_pos - anchor_after;
        }
    }

    /// Handles selection, dragging and double-click creation with the primary button.
    pub fn handle_node_interactions(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        if self.interaction.is_panning {
            return;
        }

        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let world = self.screen_to_world(pos);
                if self.scene.node_at(world.x as f64, world.y as f64).is_none() {
                    self.create_node_at(Position::new(world.x as f64, world.y as f64));
                    return;
                }
            }
        }

        if self.interaction.dragging_node.is_none() && ui.input(|i| i.pointer.primary_pressed()) {
            let press_pos = ui.input(|i| i.pointer.interact_pos());
            if let Some(pos) = press_pos.filter(|p| response.rect.contains(*p)) {
                self.begin_drag_or_select(pos);
            }
        }

        if let Some(node_id) = self.interaction.dragging_node {
            if ui.input(|i| i.pointer.primary_down()) {
                if let Some(pos) = ui.input(|i| i.pointer.interact_pos()) {
                    let world = self.screen_to_world(pos) - self.interaction.node_drag_offset;
                    if let Some(node) = self.scene.node_mut(&node_id) {
                        node.translate_to(world.x as f64, world.y as f64);
                    }
                }
            } else {
                self.finish_drag(node_id);
            }
        }
    }

    fn begin_drag_or_select(&mut self, screen_pos: egui::Pos2) {
        let world = self.screen_to_world(screen_pos);
        let hit = self.scene.node_at(world.x as f64, world.y as f64);
        self.interaction.selected_node = hit;

        let Some(node_id) = hit else {
            return;
        };
        let Some(node) = self.scene.node(&node_id) else {
            return;
        };
        if node.properties().is_draggable {
            let Position { x, y } = node.position();
            self.interaction.dragging_node = Some(node_id);
            self.interaction.drag_original_position = Some(node.position());
            self.interaction.node_drag_offset = world - egui::pos2(x as f32, y as f32);
        }
    }

    fn finish_drag(&mut self, node_id: NodeId) {
        self.interaction.dragging_node = None;
        let Some(old_position) = self.interaction.drag_original_position.take() else {
            return;
        };
        let Some(new_position) = self.scene.node(&node_id).map(EllipseNode::position) else {
            return;
        };
        if old_position != new_position {
            self.undo_history.push_action(UndoAction::NodeMoved {
                node_id,
                old_position,
                new_position,
            });
            self.file.has_unsaved_changes = true;
        }
    }

    /// Creates a node of the configured default size centred on `center`.
    pub fn create_node_at(&mut self, center: Position) -> NodeId {
        self.node_counter += 1;
        let Dimension { width, height } = self.settings.default_node_size;

        let mut node = EllipseNode::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        );
        node.properties_mut().name = format!("{NODE_NAME_PREFIX}{}", self.node_counter);

        let node_id = self.scene.add_node(node);
        self.undo_history
            .push_action(UndoAction::NodeCreated { node_id });
        self.interaction.selected_node = Some(node_id);
        self.file.has_unsaved_changes = true;
        log::debug!("created ellipse {node_id}");
        node_id
    }
}
