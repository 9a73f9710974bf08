use eframe::egui;
use log::warn;

/// Collects image files dropped onto the window and hands their bytes to
/// the app, which turns them into icon elements.
#[derive(Debug, Default)]
pub struct FileIntake {
    processed: Vec<String>,
}

/// A dropped image: original file name plus raw bytes.
#[derive(Debug)]
pub struct DroppedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain newly dropped image files, skipping anything already handled
    /// and anything that is not an image.
    pub fn take_dropped_images(&mut self, ctx: &egui::Context) -> Vec<DroppedImage> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let mut images = Vec::new();

        for file in dropped {
            let file_name = if let Some(path) = &file.path {
                path.display().to_string()
            } else if !file.name.is_empty() {
                file.name.clone()
            } else {
                "unknown".to_owned()
            };
            if self.processed.contains(&file_name) {
                continue;
            }
            if !is_image_file(&file) {
                warn!("dropped file is not a supported image: {file_name}");
                continue;
            }

            let bytes = if let Some(bytes) = &file.bytes {
                Some(bytes.to_vec())
            } else if let Some(path) = &file.path {
                match std::fs::read(path) {
                    Ok(bytes) => Some(bytes),
                    Err(err) => {
                        warn!("failed to read dropped file {}: {err}", path.display());
                        None
                    }
                }
            } else {
                None
            };

            if let Some(bytes) = bytes {
                let short_name = file
                    .path
                    .as_deref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_name.clone());
                self.processed.push(file_name);
                images.push(DroppedImage {
                    file_name: short_name,
                    bytes,
                });
            }
        }

        images
    }

    /// Dim the window and list the files while a drag hovers over it.
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, Id, LayerId, Order, TextStyle};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let text = ctx.input(|i| {
            let mut text = "Drop to add as icon:".to_owned();
            for file in &i.raw.hovered_files {
                if let Some(path) = &file.path {
                    text += &format!("\n{}", path.display());
                } else {
                    text += "\n(unnamed file)";
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(160));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}

fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        file.mime.starts_with("image/")
    } else if let Some(path) = &file.path {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp")
            })
            .unwrap_or(false)
    } else {
        false
    }
}
