use egui::{Response, Ui};

use crate::element::{Element, ElementId, Geometry, IconSource, Payload};
use crate::store::{ElementPatch, ElementStore};

/// Property panel bound to the selected element.
///
/// Continuous widgets (drag values, sliders, pickers) apply transiently
/// while held and collapse into a single history entry when released, the
/// same batching rule gestures follow. Discrete actions (z-order buttons)
/// record immediately.
#[derive(Debug, Default)]
pub struct Inspector {
    /// Snapshot taken when a continuous edit begins, committed when every
    /// bound widget is released.
    editing_before: Option<Element>,
    /// Set when the user asks to save or delete; the app consumes these and
    /// talks to the persistence pipeline.
    pub save_requested: Option<ElementId>,
    pub delete_requested: Option<ElementId>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut Ui, store: &mut ElementStore) {
        let Some(selected) = store.selected().cloned() else {
            self.flush_pending(store);
            ui.weak("Nothing selected");
            ui.label("Click an element or an editable page section.");
            return;
        };
        let Some(element) = store.find(&selected).cloned() else {
            // A page-native region: the editor only overlays a highlight and
            // never edits page content.
            self.flush_pending(store);
            ui.heading("Page section");
            ui.monospace(selected.as_str());
            ui.label("Page sections are highlighted only; their content is not editable here.");
            return;
        };

        // Selection moved while an edit was pending: commit the old one.
        if self
            .editing_before
            .as_ref()
            .is_some_and(|before| before.id != element.id)
        {
            self.flush_pending(store);
        }

        let mut geometry = element.geometry;
        let mut appearance = element.appearance.clone();
        let mut payload_patch: Option<Payload> = None;
        let mut changed = false;
        let mut active = false;
        let mut track = |response: Response| {
            changed |= response.changed();
            active |= response.dragged() || response.has_focus();
        };

        ui.heading(match element.kind() {
            crate::element::ElementKind::Icon => "Icon element",
            crate::element::ElementKind::Text => "Text element",
            crate::element::ElementKind::Unknown => "Element",
        });
        ui.monospace(element.id.as_str());
        if element.is_saved {
            ui.weak("saved");
        } else {
            ui.weak("draft");
        }
        if store.is_draft(&element.id) {
            ui.colored_label(egui::Color32::from_rgb(230, 160, 30), "unsaved changes");
        }
        ui.separator();

        ui.label("Position & size");
        egui::Grid::new("inspector_geometry").num_columns(2).show(ui, |ui| {
            ui.label("Left");
            track(ui.add(egui::DragValue::new(&mut geometry.left).speed(1.0)));
            ui.end_row();
            ui.label("Top");
            track(ui.add(egui::DragValue::new(&mut geometry.top).speed(1.0)));
            ui.end_row();
            ui.label("Width");
            track(ui.add(egui::DragValue::new(&mut geometry.width).speed(1.0)));
            ui.end_row();
            ui.label("Height");
            track(ui.add(egui::DragValue::new(&mut geometry.height).speed(1.0)));
            ui.end_row();
        });

        ui.separator();
        ui.label("Appearance");
        egui::Grid::new("inspector_appearance").num_columns(2).show(ui, |ui| {
            ui.label("Opacity");
            track(ui.add(egui::Slider::new(&mut appearance.opacity, 0.0..=1.0)));
            ui.end_row();
            ui.label("Rotation °");
            track(ui.add(
                egui::DragValue::new(&mut appearance.transform.rotation_degrees).speed(1.0),
            ));
            ui.end_row();
            ui.label("Scale X");
            track(ui.add(
                egui::DragValue::new(&mut appearance.transform.scale_x)
                    .speed(0.01)
                    .range(0.1..=10.0),
            ));
            ui.end_row();
            ui.label("Scale Y");
            track(ui.add(
                egui::DragValue::new(&mut appearance.transform.scale_y)
                    .speed(0.01)
                    .range(0.1..=10.0),
            ));
            ui.end_row();
            ui.label("Skew °");
            track(ui.add(
                egui::DragValue::new(&mut appearance.transform.skew_degrees)
                    .speed(0.5)
                    .range(-60.0..=60.0),
            ));
            ui.end_row();

            ui.label("Tint");
            ui.horizontal(|ui| {
                let mut enabled = appearance.color_filter.is_some();
                let toggle = ui.checkbox(&mut enabled, "");
                if toggle.changed() {
                    appearance.color_filter = enabled.then_some(egui::Color32::WHITE);
                }
                track(toggle);
                if let Some(color) = &mut appearance.color_filter {
                    track(egui::color_picker::color_edit_button_srgba(
                        ui,
                        color,
                        egui::color_picker::Alpha::Opaque,
                    ));
                }
            });
            ui.end_row();

            ui.label("Background");
            track(egui::color_picker::color_edit_button_srgba(
                ui,
                &mut appearance.background_color,
                egui::color_picker::Alpha::OnlyBlend,
            ));
            ui.end_row();
            ui.label("Border color");
            track(egui::color_picker::color_edit_button_srgba(
                ui,
                &mut appearance.border_color,
                egui::color_picker::Alpha::OnlyBlend,
            ));
            ui.end_row();
            ui.label("Border width");
            track(ui.add(
                egui::DragValue::new(&mut appearance.border_width)
                    .speed(0.5)
                    .range(0.0..=20.0),
            ));
            ui.end_row();
            ui.label("Corner radius");
            track(ui.add(
                egui::DragValue::new(&mut appearance.border_radius)
                    .speed(0.5)
                    .range(0.0..=100.0),
            ));
            ui.end_row();
        });

        ui.separator();
        let saving = store.is_saving(&element.id);
        match &element.payload {
            Payload::Text { content } => {
                ui.label("Text");
                let mut text = content.clone();
                let response = ui.add_enabled(!saving, egui::TextEdit::singleline(&mut text));
                if response.changed() {
                    payload_patch = Some(Payload::Text { content: text });
                }
                track(response);
            }
            Payload::Icon { source, file_name } => {
                ui.label("Image");
                match source {
                    IconSource::Inline(bytes) if bytes.is_empty() => {
                        ui.weak("no image yet; drop a file onto the element");
                    }
                    IconSource::Inline(bytes) => {
                        ui.monospace(file_name);
                        ui.weak(format!("{} bytes, not uploaded", bytes.len()));
                    }
                    IconSource::Public(path) => {
                        ui.monospace(file_name);
                        ui.weak(path);
                    }
                }
                if saving {
                    ui.weak("saving… image edits disabled");
                }
            }
            Payload::Unknown => {
                ui.weak("Unknown element type");
            }
        }

        ui.separator();
        ui.label("Stacking");
        ui.horizontal(|ui| {
            if ui.button("⬆ Raise").clicked() {
                store.update(&element.id, ElementPatch::z_index(element.z_index + 1));
            }
            if ui.button("⬇ Lower").clicked() {
                store.update(&element.id, ElementPatch::z_index(element.z_index - 1));
            }
            ui.label(format!("z = {}", element.z_index));
        });

        ui.separator();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!saving, egui::Button::new("💾 Save"))
                .clicked()
            {
                self.save_requested = Some(element.id.clone());
            }
            if ui.button("🗑 Delete").clicked() {
                self.delete_requested = Some(element.id.clone());
            }
        });

        // Apply whatever changed this frame.
        let geometry_changed = geometry != element.geometry;
        let appearance_changed = appearance != element.appearance;
        if changed && (geometry_changed || appearance_changed || payload_patch.is_some()) {
            if self.editing_before.is_none() {
                self.editing_before = Some(element.clone());
            }
            appearance.transform.rotation_degrees =
                appearance.transform.rotation_degrees.rem_euclid(360.0);
            let patch = ElementPatch {
                geometry: geometry_changed.then(|| {
                    Geometry::new(geometry.left, geometry.top, geometry.width, geometry.height)
                }),
                appearance: appearance_changed.then_some(appearance),
                payload: payload_patch,
                ..ElementPatch::default()
            };
            store.apply_transient(&element.id, patch);
        }

        // An open picker popup counts as an in-progress edit even though the
        // button itself reports neither drag nor focus.
        let popup_open = ui.memory(|mem| mem.any_popup_open());
        if !active && !popup_open {
            self.flush_pending(store);
        }
    }

    /// Commit the pending continuous edit as one history entry.
    fn flush_pending(&mut self, store: &mut ElementStore) {
        if let Some(before) = self.editing_before.take() {
            store.commit_gesture(before);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_text(id: &str) -> ElementStore {
        let mut store = ElementStore::new();
        store.add(Element::with_id(
            ElementId::from(id),
            Payload::Text {
                content: "x".to_owned(),
            },
            Geometry::new(0.0, 0.0, 100.0, 40.0),
        ));
        store
    }

    #[test]
    fn pending_edit_commits_as_one_entry_when_flushed() {
        let id = ElementId::from("text-1");
        let mut store = store_with_text("text-1");
        let mut inspector = Inspector::new();

        // Several transient tweaks while the edit is held open, e.g. while a
        // color picker popup stays up between clicks.
        inspector.editing_before = Some(store.find(&id).unwrap().clone());
        store.apply_transient(&id, ElementPatch::z_index(5));
        store.apply_transient(&id, ElementPatch::z_index(7));
        let history_before = store.history_len();

        inspector.flush_pending(&mut store);
        assert_eq!(store.history_len(), history_before + 1);

        store.undo();
        assert_eq!(store.find(&id).unwrap().z_index, 0);
    }

    #[test]
    fn flush_without_a_pending_edit_records_nothing() {
        let mut store = store_with_text("text-1");
        let mut inspector = Inspector::new();
        let history_before = store.history_len();

        inspector.flush_pending(&mut store);
        assert_eq!(store.history_len(), history_before);
    }
}
