use egui::Ui;

use crate::store::ElementStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    AddText,
    AddIcon,
    Undo,
    Redo,
    SaveAll,
}

/// Top strip: element creation, history controls, save-all, and the
/// unsaved-changes indicator.
#[derive(Debug, Default)]
pub struct Toolbar;

impl Toolbar {
    pub fn new() -> Self {
        Self
    }

    pub fn show(&mut self, ui: &mut Ui, store: &ElementStore) -> Option<ToolbarAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            ui.heading("Overlay Editor");
            ui.separator();

            if ui.button("➕ Text").clicked() {
                action = Some(ToolbarAction::AddText);
            }
            if ui.button("🖼 Icon").clicked() {
                action = Some(ToolbarAction::AddIcon);
            }

            ui.separator();

            if ui
                .add_enabled(store.can_undo(), egui::Button::new("⟲ Undo"))
                .clicked()
            {
                action = Some(ToolbarAction::Undo);
            }
            if ui
                .add_enabled(store.can_redo(), egui::Button::new("⟳ Redo"))
                .clicked()
            {
                action = Some(ToolbarAction::Redo);
            }

            ui.separator();

            if ui
                .add_enabled(store.has_unsaved_changes(), egui::Button::new("💾 Save all"))
                .clicked()
            {
                action = Some(ToolbarAction::SaveAll);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if store.has_unsaved_changes() {
                    ui.colored_label(egui::Color32::from_rgb(230, 160, 30), "● unsaved changes");
                } else {
                    ui.weak("all changes saved");
                }
            });
        });
        action
    }
}
