//! User interface components for the ellipse scene viewer.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main ViewerApp
//! - `canvas` - Canvas navigation, zooming, panning, selection and dragging
//! - `rendering` - Drawing the scene, grid and selection overlay
//! - `file_ops` - Scene save/load through native dialogs
//! - `export` - SVG/PNG export dialogs
//! - `undo` - Undo/redo history

mod canvas;
mod export;
mod file_ops;
mod rendering;
mod state;
mod undo;


pub use state::ViewerApp;
pub use undo::{UndoAction, UndoHistory, UndoableScene};

use self::export::ExportFormat;
use self::state::{PanelEdit, PendingLoadOperation, PendingSaveOperation};
use self::rendering::to_color32;
use crate::types::*;

/// Storage key under which the app state is persisted.
pub(crate) const APP_STATE_KEY: &str = "app_state";

/// One of the three resize operations an ellipse supports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOp {
    /// Replace the dimension
    To(f64, f64),
    /// Multiply the dimension
    By(f64, f64),
    /// Add to the dimension
    With(f64, f64),
}

impl eframe::App for ViewerApp {
    /// Persist entire app state between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => storage.set_string(APP_STATE_KEY, json),
            Err(err) => log::error!("Failed to serialize app state: {err}"),
        }
    }

    /// Main update function called by egui for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        let panel = egui::SidePanel::right("properties")
            .resizable(true)
            .default_width(self.settings.properties_panel_width)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_properties_panel(ui);
                });
            });
        self.settings.properties_panel_width = panel.response.rect.width();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });
    }
}

impl ViewerApp {
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::{Key, KeyboardShortcut, Modifiers};

        let redo_shift = KeyboardShortcut::new(Modifiers::COMMAND | Modifiers::SHIFT, Key::Z);
        let redo_y = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);
        let undo = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
        let copy = KeyboardShortcut::new(Modifiers::COMMAND, Key::D);
        let save = KeyboardShortcut::new(Modifiers::COMMAND, Key::S);
        let open = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);

        // Shift+Cmd+Z must be consumed before Cmd+Z, which would also match it
        if ctx.input_mut(|i| i.consume_shortcut(&redo_shift) || i.consume_shortcut(&redo_y)) {
            self.perform_redo();
        } else if ctx.input_mut(|i| i.consume_shortcut(&undo)) {
            self.perform_undo();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&copy)) {
            self.copy_selected();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&save)) {
            self.file.pending_save_operation = Some(PendingSaveOperation::Save);
        }
        if ctx.input_mut(|i| i.consume_shortcut(&open)) {
            self.file.pending_load_operation = Some(PendingLoadOperation::Load);
        }

        let delete = ctx.input(|i| i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace));
        // Don't steal Backspace from a focused text field
        if delete && !ctx.wants_keyboard_input() {
            self.delete_selected();
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("New").clicked() {
                self.scene = Default::default();
                self.interaction = Default::default();
                self.undo_history.clear();
                self.file.current_path = None;
                self.file.has_unsaved_changes = false;
                self.node_counter = 0;
            }
            if ui.button("Open…").clicked() {
                self.file.pending_load_operation = Some(PendingLoadOperation::Load);
            }
            if ui.button("Save").clicked() {
                self.file.pending_save_operation = Some(PendingSaveOperation::Save);
            }
            if ui.button("Save As…").clicked() {
                self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
            }

            ui.menu_button("Export", |ui| {
                let export = &mut self.settings.export;
                ui.add(
                    egui::DragValue::new(&mut export.margin)
                        .range(0.0..=500.0)
                        .prefix("margin: "),
                );
                ui.add(
                    egui::DragValue::new(&mut export.png_scale)
                        .range(crate::constants::PNG_SCALE_RANGE.0..=crate::constants::PNG_SCALE_RANGE.1)
                        .speed(0.05)
                        .prefix("PNG scale: "),
                );
                ui.checkbox(&mut export.include_background, "Background");
                if export.include_background {
                    let mut color = to_color32(export.background_color);
                    if ui.color_edit_button_srgba(&mut color).changed() {
                        export.background_color = from_color32(color);
                    }
                }
                ui.separator();
                if ui.button("SVG…").clicked() {
                    self.export_with_dialog(ui.ctx(), ExportFormat::Svg);
                }
                if ui.button("PNG…").clicked() {
                    self.export_with_dialog(ui.ctx(), ExportFormat::Png);
                }
            });

            ui.separator();
            if ui
                .add_enabled(self.undo_history.can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.perform_undo();
            }
            if ui
                .add_enabled(self.undo_history.can_redo(), egui::Button::new("Redo"))
                .clicked()
            {
                self.perform_redo();
            }

            ui.separator();
            ui.checkbox(&mut self.settings.show_grid, "Grid");
            ui.checkbox(&mut self.settings.dark_mode, "Dark");

            if self.file.has_unsaved_changes {
                ui.label("•");
            }
        });
    }

    fn draw_properties_panel(&mut self, ui: &mut egui::Ui) {
        let Some(node_id) = self.interaction.selected_node else {
            ui.heading("No selection");
            ui.label("Double-click the canvas to add an ellipse.");
            ui.separator();
            ui.label("New node size");
            let size = &mut self.settings.default_node_size;
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut size.width).prefix("w: "));
                ui.add(egui::DragValue::new(&mut size.height).prefix("h: "));
            });
            return;
        };
        if self
            .interaction
            .pending_panel_edit
            .as_ref()
            .is_some_and(|edit| edit.node_id != node_id)
        {
            self.commit_panel_edit();
        }
        let Some(node) = self.scene.node(&node_id) else {
            self.interaction.selected_node = None;
            return;
        };

        let class_type = node.class_type();
        let position = node.position();
        let dimension = node.dimension();
        let offsets = (node.control_offset_right(), node.control_offset_left());
        let before = node.properties().clone();

        if self.resize_form.seeded_from != Some(node_id) {
            self.resize_form.to = (dimension.width, dimension.height);
            self.resize_form.seeded_from = Some(node_id);
        }
        if self.interaction.editing_node_name.is_none() {
            self.interaction.temp_node_name.clone_from(&before.name);
        }

        ui.heading(class_type);

        // The name is committed once the field loses focus; everything else is
        // applied live and recorded when the pointer is released
        let mut edited = before.clone();
        let mut name_changed = false;
        let mut name_focused = false;
        egui::Grid::new("node_properties").num_columns(2).show(ui, |ui| {
            ui.label("Name");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.interaction.temp_node_name)
                    .id(node_name_field_id()),
            );
            name_changed = response.changed();
            name_focused = response.has_focus();
            ui.end_row();

            ui.label("Pick mode");
            ui.horizontal(|ui| {
                ui.radio_value(&mut edited.pick_mode, PickMode::Ghost, "Ghost");
                ui.radio_value(&mut edited.pick_mode, PickMode::Region, "Region");
            });
            ui.end_row();

            ui.label("Line width");
            ui.add(
                egui::DragValue::new(&mut edited.style.line_width)
                    .range(0.0..=50.0)
                    .speed(0.1),
            );
            ui.end_row();

            ui.label("Fill");
            let mut fill = to_color32(edited.style.fill_color);
            if ui.color_edit_button_srgba(&mut fill).changed() {
                edited.style.fill_color = from_color32(fill);
            }
            ui.end_row();

            ui.label("Stroke");
            let mut stroke = to_color32(edited.style.stroke_color);
            if ui.color_edit_button_srgba(&mut stroke).changed() {
                edited.style.stroke_color = from_color32(stroke);
            }
            ui.end_row();

            ui.label("Flags");
            ui.vertical(|ui| {
                ui.checkbox(&mut edited.is_visible, "Visible");
                ui.checkbox(&mut edited.is_clickable, "Clickable");
                ui.checkbox(&mut edited.is_draggable, "Draggable");
                ui.checkbox(&mut edited.is_resizable, "Resizable");
            });
            ui.end_row();
        });

        ui.separator();
        let mut new_position = position;
        ui.horizontal(|ui| {
            ui.label("Position");
            ui.add(egui::DragValue::new(&mut new_position.x).prefix("x: "));
            ui.add(egui::DragValue::new(&mut new_position.y).prefix("y: "));
        });

        if edited != before || new_position != position {
            self.stage_panel_edit(node_id, edited, new_position);
        }
        let settled = ui.input(|i| !i.pointer.any_down()) && !ui.ctx().wants_keyboard_input();
        if settled {
            self.commit_panel_edit();
        }

        if name_changed && self.interaction.editing_node_name.is_none() {
            self.interaction.editing_node_name = Some(node_id);
        }
        if !name_focused {
            if let Some(renamed) = self.interaction.editing_node_name.take() {
                self.save_node_name_change(renamed);
            }
        }

        ui.label(format!(
            "Size: {:.2} × {:.2}",
            dimension.width, dimension.height
        ));
        ui.label(format!(
            "Control offsets: right {:.3}, left {:.3}",
            offsets.0, offsets.1
        ));

        ui.separator();
        let mut requested = None;
        let form = &mut self.resize_form;
        ui.add_enabled_ui(before.is_resizable, |ui| {
            egui::Grid::new("resize_ops").num_columns(3).show(ui, |ui| {
                ui.add(egui::DragValue::new(&mut form.to.0).prefix("w: "));
                ui.add(egui::DragValue::new(&mut form.to.1).prefix("h: "));
                if ui.button("Resize to").clicked() {
                    requested = Some(ResizeOp::To(form.to.0, form.to.1));
                }
                ui.end_row();

                ui.add(egui::DragValue::new(&mut form.by.0).speed(0.01).prefix("×w: "));
                ui.add(egui::DragValue::new(&mut form.by.1).speed(0.01).prefix("×h: "));
                if ui.button("Resize by").clicked() {
                    requested = Some(ResizeOp::By(form.by.0, form.by.1));
                }
                ui.end_row();

                ui.add(egui::DragValue::new(&mut form.with.0).prefix("+w: "));
                ui.add(egui::DragValue::new(&mut form.with.1).prefix("+h: "));
                if ui.button("Resize with").clicked() {
                    requested = Some(ResizeOp::With(form.with.0, form.with.1));
                }
                ui.end_row();
            });
        });
        if let Some(op) = requested {
            self.apply_resize(node_id, op);
            if let Some(node) = self.scene.node(&node_id) {
                let d = node.dimension();
                self.resize_form.to = (d.width, d.height);
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Copy").clicked() {
                self.copy_selected();
            }
            if ui.button("Delete").clicked() {
                self.delete_selected();
            }
        });
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        // Centre the world origin on the first frame
        if self.canvas.offset == egui::Vec2::ZERO && self.scene.nodes.is_empty() {
            self.canvas.offset = response.rect.center().to_vec2();
        }

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);
        self.handle_node_interactions(ui, &response);

        self.render_scene(&painter, response.rect);
    }

    /// Applies a resize operation to a node and records it for undo.
    ///
    /// # Returns
    ///
    /// `true` if the node exists, is resizable and was resized.
    pub fn apply_resize(&mut self, node_id: NodeId, op: ResizeOp) -> bool {
        let Some(node) = self.scene.node_mut(&node_id) else {
            return false;
        };
        if !node.properties().is_resizable {
            return false;
        }

        let old_dimension = node.dimension();
        match op {
            ResizeOp::To(w, h) => node.resize_to(w, h),
            ResizeOp::By(wf, hf) => node.resize_by(wf, hf),
            ResizeOp::With(dw, dh) => node.resize_with(dw, dh),
        }
        let new_dimension = node.dimension();
        log::debug!("{op:?} on {node_id}: {old_dimension:?} -> {new_dimension:?}");

        self.undo_history.push_action(UndoAction::NodeResized {
            node_id,
            old_dimension,
            new_dimension,
        });
        self.file.has_unsaved_changes = true;
        true
    }

    /// Applies a panel edit to the node without recording it, remembering the
    /// node's state from before the first such edit.
    fn stage_panel_edit(
        &mut self,
        node_id: NodeId,
        properties: NodeProperties,
        position: Position,
    ) {
        let Some(node) = self.scene.node_mut(&node_id) else {
            return;
        };
        if self.interaction.pending_panel_edit.is_none() {
            self.interaction.pending_panel_edit = Some(PanelEdit {
                node_id,
                old_position: node.position(),
                old_properties: node.properties().clone(),
            });
        }
        node.translate_to(position.x, position.y);
        *node.properties_mut() = properties;
        self.file.has_unsaved_changes = true;
    }

    /// Records the staged panel edit, if any, as at most one move and one
    /// property change.
    fn commit_panel_edit(&mut self) {
        let Some(edit) = self.interaction.pending_panel_edit.take() else {
            return;
        };
        let Some(node) = self.scene.node(&edit.node_id) else {
            return;
        };
        let new_position = node.position();
        let new_properties = node.properties().clone();

        if new_position != edit.old_position {
            self.undo_history.push_action(UndoAction::NodeMoved {
                node_id: edit.node_id,
                old_position: edit.old_position,
                new_position,
            });
        }
        if new_properties != edit.old_properties {
            self.undo_history.push_action(UndoAction::PropertiesChanged {
                node_id: edit.node_id,
                old_properties: edit.old_properties,
                new_properties,
            });
        }
    }

    /// Saves the name typed into the properties panel to the given node.
    fn save_node_name_change(&mut self, node_id: NodeId) {
        self.commit_panel_edit();
        let Some(node) = self.scene.node_mut(&node_id) else {
            return;
        };
        // Only record undo if name actually changed
        if node.properties().name == self.interaction.temp_node_name {
            return;
        }
        let old_properties = node.properties().clone();
        node.properties_mut()
            .name
            .clone_from(&self.interaction.temp_node_name);
        self.undo_history.push_action(UndoAction::PropertiesChanged {
            node_id,
            old_properties,
            new_properties: node.properties().clone(),
        });
        self.file.has_unsaved_changes = true;
    }

    /// Copies the selected node, places the copy above it and selects the copy.
    pub fn copy_selected(&mut self) -> Option<NodeId> {
        let source = self.interaction.selected_node?;
        let node_id = self.scene.copy_node(&source)?;
        self.undo_history
            .push_action(UndoAction::NodeCreated { node_id });
        self.interaction.selected_node = Some(node_id);
        self.file.has_unsaved_changes = true;
        Some(node_id)
    }

    /// Deletes the selected node.
    pub fn delete_selected(&mut self) {
        let Some(node_id) = self.interaction.selected_node.take() else {
            return;
        };
        if let Some((index, node)) = self.scene.remove_node(&node_id) {
            self.undo_history
                .push_action(UndoAction::NodeDeleted { node, index });
            self.file.has_unsaved_changes = true;
        }
        self.interaction.dragging_node = None;
    }

    /// Reverses the most recent action.
    pub fn perform_undo(&mut self) {
        self.commit_panel_edit();
        if let Some(action) = self.undo_history.pop_undo() {
            if let Some(redo) = self.scene.apply_undo(&action) {
                self.undo_history.push_redo(redo);
                self.file.has_unsaved_changes = true;
            }
            self.drop_stale_selection();
        }
    }

    /// Re-applies the most recently undone action.
    pub fn perform_redo(&mut self) {
        self.commit_panel_edit();
        if let Some(action) = self.undo_history.pop_redo() {
            if let Some(undo) = self.scene.apply_redo(&action) {
                self.undo_history.push_undo(undo);
                self.file.has_unsaved_changes = true;
            }
            self.drop_stale_selection();
        }
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.interaction.selected_node {
            if self.scene.node(&id).is_none() {
                self.interaction.selected_node = None;
            }
        }
        self.resize_form.seeded_from = None;
    }
}

/// Id of the properties panel's name field.
fn node_name_field_id() -> egui::Id {
    egui::Id::new("node_name_field")
}

fn from_color32(color: egui::Color32) -> Color {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color::from_rgba8(r, g, b, a)
}
