//! File operations for saving and loading scenes.
//!
//! Dialogs run on the tokio runtime entered by `main`; their results come back
//! to the UI thread over the channel held in [`FileState`](super::state::FileState).

use super::canvas::highest_default_name_index;
use super::state::{FileOperationResult, PendingLoadOperation, PendingSaveOperation, ViewerApp};
use crate::scene::Scene;
use std::sync::mpsc::Sender;

impl ViewerApp {
    /// Handles completed async file operations and starts newly requested ones.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        let results: Vec<FileOperationResult> = match &self.file.file_operation_receiver {
            Some(receiver) => receiver.try_iter().collect(),
            None => Vec::new(),
        };
        for result in results {
            self.apply_file_result(result);
        }

        if let Some(save_op) = self.file.pending_save_operation.take() {
            self.start_save(ctx, save_op);
        }

        if let Some(PendingLoadOperation::Load) = self.file.pending_load_operation.take() {
            self.start_load(ctx);
        }
    }

    /// Applies the outcome of a finished file operation to the app state.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path) => {
                log::info!("Scene saved to {path}");
                self.file.current_path = Some(path);
                self.file.has_unsaved_changes = false;
            }
            FileOperationResult::LoadCompleted(path, content) => match Scene::from_json(&content) {
                Ok(scene) => {
                    log::info!("Loaded {} nodes from {path}", scene.nodes.len());
                    self.node_counter = highest_default_name_index(&scene);
                    self.scene = scene;
                    self.file.current_path = Some(path);
                    self.file.has_unsaved_changes = false;
                    self.interaction = Default::default();
                    self.undo_history.clear();
                }
                Err(e) => {
                    log::warn!("Failed to parse scene from {path}: {e}");
                }
            },
            FileOperationResult::ExportCompleted(path) => {
                log::info!("Exported scene to {path}");
            }
            FileOperationResult::OperationFailed(error) => {
                log::error!("File operation failed: {error}");
            }
        }
    }

    fn start_save(&mut self, ctx: &egui::Context, save_op: PendingSaveOperation) {
        let json = match self.scene.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize scene: {e}");
                return;
            }
        };
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();

        match (save_op, self.file.current_path.clone()) {
            (PendingSaveOperation::Save, Some(path)) => {
                tokio::spawn(async move {
                    let result = match std::fs::write(&path, json.as_bytes()) {
                        Ok(()) => FileOperationResult::SaveCompleted(path),
                        Err(e) => {
                            FileOperationResult::OperationFailed(format!("Failed to save file: {e}"))
                        }
                    };
                    send(&sender, result);
                    ctx.request_repaint();
                });
            }
            _ => {
                tokio::spawn(async move {
                    if let Some(handle) = rfd::AsyncFileDialog::new()
                        .add_filter("JSON", &["json"])
                        .set_file_name("scene.json")
                        .save_file()
                        .await
                    {
                        let path = handle.path();
                        let result = match std::fs::write(path, json.as_bytes()) {
                            Ok(()) => FileOperationResult::SaveCompleted(path.display().to_string()),
                            Err(e) => FileOperationResult::OperationFailed(format!(
                                "Failed to save file: {e}"
                            )),
                        };
                        send(&sender, result);
                    }
                    ctx.request_repaint();
                });
            }
        }
    }

    fn start_load(&mut self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();

        tokio::spawn(async move {
            if let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
                .await
            {
                let path = handle.path();
                let result = match std::fs::read_to_string(path) {
                    Ok(json) => FileOperationResult::LoadCompleted(path.display().to_string(), json),
                    Err(e) => {
                        FileOperationResult::OperationFailed(format!("Failed to read file: {e}"))
                    }
                };
                send(&sender, result);
            }
            ctx.request_repaint();
        });
    }
}

/// Delivers a result to the UI thread; a closed channel means the app is gone.
pub(super) fn send(sender: &Option<Sender<FileOperationResult>>, result: FileOperationResult) {
    if let Some(tx) = sender {
        let _ = tx.send(result);
    }
}
