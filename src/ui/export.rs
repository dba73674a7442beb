//! Export dialogs: write the current scene to SVG or PNG.

use super::file_ops::send;
use super::state::{FileOperationResult, ViewerApp};
use crate::export::{write_png, write_svg};

/// Output formats offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Scalable vector graphics
    Svg,
    /// Raster image rendered through resvg
    Png,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
        }
    }
}

impl ViewerApp {
    /// Opens a save dialog and exports a snapshot of the scene in the given format.
    pub fn export_with_dialog(&self, ctx: &egui::Context, format: ExportFormat) {
        let scene = self.scene.clone();
        let options = self.settings.export;
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();
        let ext = format.extension();

        tokio::spawn(async move {
            if let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter(ext.to_uppercase(), &[ext])
                .set_file_name(format!("scene.{ext}"))
                .save_file()
                .await
            {
                let path = handle.path();
                let written = match format {
                    ExportFormat::Svg => write_svg(&scene, &options, path),
                    ExportFormat::Png => write_png(&scene, &options, path),
                };
                let result = match written {
                    Ok(()) => FileOperationResult::ExportCompleted(path.display().to_string()),
                    Err(e) => FileOperationResult::OperationFailed(e.to_string()),
                };
                send(&sender, result);
            }
            ctx.request_repaint();
        });
    }
}
