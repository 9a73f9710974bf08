use eframe::egui;
use egui::{Color32, Key, Modifiers, Pos2, Rect, Sense, vec2};
use log::{error, info};
use std::path::PathBuf;

use crate::element::{Element, ElementId, Geometry, IconSource, MAX_ELEMENT_SIZE, Payload, clamp_dimension};
use crate::file_intake::FileIntake;
use crate::panels::{Inspector, Toolbar, ToolbarAction};
use crate::persist::{DirAssetStore, FileCache, JsonConfigStore, Pipeline};
use crate::renderer::ElementRenderer;
use crate::selection::{PageRegion, SelectionLayer};
use crate::store::{ElementPatch, ElementStore};
use crate::texture_cache::{TextureCache, image_size};

type EditorPipeline = Pipeline<JsonConfigStore, DirAssetStore, FileCache>;

#[derive(Debug)]
struct Status {
    text: String,
    ok: bool,
}

/// A demo section of the host page the editor overlays. Stands in for the
/// marketing page's DOM; the editor never mutates section content.
struct PageSection {
    title: &'static str,
    region: PageRegion,
}

/// The overlay editor application: wires the element store, selection
/// layer, renderer, inspector and persistence pipeline together.
pub struct EditorApp {
    store: ElementStore,
    renderer: ElementRenderer,
    selection: SelectionLayer,
    inspector: Inspector,
    toolbar: Toolbar,
    textures: TextureCache,
    intake: FileIntake,
    pipeline: EditorPipeline,
    confirm_delete: Option<ElementId>,
    status: Option<Status>,
    show_tutorial: bool,
}

impl EditorApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let data_dir = eframe::storage_dir("overlay-editor")
            .unwrap_or_else(|| PathBuf::from("overlay-editor-data"));
        Self::with_data_dir(cc, data_dir)
    }

    pub fn with_data_dir(_cc: &eframe::CreationContext<'_>, data_dir: PathBuf) -> Self {
        let pipeline = Pipeline::new(
            JsonConfigStore::new(data_dir.join("elements.json")),
            DirAssetStore::new(data_dir.join("assets")),
            FileCache::new(data_dir.join("cache")),
        );
        let mut app = Self {
            store: ElementStore::new(),
            renderer: ElementRenderer::new(),
            selection: SelectionLayer::new(),
            inspector: Inspector::new(),
            toolbar: Toolbar::new(),
            textures: TextureCache::new(64),
            intake: FileIntake::new(),
            pipeline,
            confirm_delete: None,
            status: None,
            show_tutorial: false,
        };
        if let Err(err) = app.pipeline.rehydrate(&mut app.store) {
            error!("failed to load saved elements: {err}");
            app.status = Some(Status {
                text: format!("Could not load saved elements: {err}"),
                ok: false,
            });
        }
        app.show_tutorial = !app.pipeline.tutorial_seen();
        app
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.store.clear_selection();
        }
        let undo = ctx.input_mut(|i| {
            i.consume_shortcut(&egui::KeyboardShortcut::new(Modifiers::COMMAND, Key::Z))
        });
        let redo = ctx.input_mut(|i| {
            i.consume_shortcut(&egui::KeyboardShortcut::new(
                Modifiers::COMMAND | Modifiers::SHIFT,
                Key::Z,
            )) || i.consume_shortcut(&egui::KeyboardShortcut::new(Modifiers::COMMAND, Key::Y))
        });
        // History jumps mid-gesture would fight the gesture's own updates.
        if !self.renderer.gesture_in_progress() {
            if undo {
                self.store.undo();
            }
            if redo {
                self.store.redo();
            }
        }
    }

    fn run_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::AddText => {
                let mut element = Element::new(
                    Payload::Text {
                        content: "New text".to_owned(),
                    },
                    Geometry::new(140.0, 180.0, 160.0, 40.0),
                );
                element.z_index = self.store.max_z_index() + 1;
                self.store.add(element);
            }
            ToolbarAction::AddIcon => {
                let mut element = Element::new(
                    Payload::empty_icon(),
                    Geometry::new(180.0, 220.0, 120.0, 120.0),
                );
                element.z_index = self.store.max_z_index() + 1;
                self.store.add(element);
            }
            ToolbarAction::Undo => self.store.undo(),
            ToolbarAction::Redo => self.store.redo(),
            ToolbarAction::SaveAll => {
                let failures = self.pipeline.save_all(&mut self.store);
                self.status = if failures.is_empty() {
                    Some(Status {
                        text: "All changes saved".to_owned(),
                        ok: true,
                    })
                } else {
                    let (id, err) = &failures[0];
                    Some(Status {
                        text: format!("{} element(s) failed to save, first: {id}: {err}", failures.len()),
                        ok: false,
                    })
                };
            }
        }
    }

    fn handle_inspector_requests(&mut self) {
        if let Some(id) = self.inspector.save_requested.take() {
            self.status = match self.pipeline.save_element(&mut self.store, &id) {
                Ok(()) => Some(Status {
                    text: format!("Saved {id}"),
                    ok: true,
                }),
                Err(err) => Some(Status {
                    text: err.to_string(),
                    ok: false,
                }),
            };
        }
        if let Some(id) = self.inspector.delete_requested.take() {
            // Every delete goes through the confirmation dialog.
            self.confirm_delete = Some(id);
        }
    }

    fn handle_dropped_images(&mut self, ctx: &egui::Context) {
        for image in self.intake.take_dropped_images(ctx) {
            let payload = Payload::Icon {
                source: IconSource::Inline(image.bytes.clone()),
                file_name: image.file_name.clone(),
            };

            // A selected placeholder icon receives the drop; otherwise the
            // image becomes a new element.
            let target = self
                .store
                .selected_element()
                .filter(|e| e.payload.is_empty_icon())
                .map(|e| e.id.clone());
            if let Some(id) = target {
                info!("filling placeholder {id} with {}", image.file_name);
                self.store.update(&id, ElementPatch::payload(payload));
                continue;
            }

            let (width, height) = match image_size(&image.bytes) {
                Ok((w, h)) => {
                    let scale = (MAX_ELEMENT_SIZE / w.max(h)).min(1.0);
                    (clamp_dimension(w * scale), clamp_dimension(h * scale))
                }
                Err(err) => {
                    self.status = Some(Status {
                        text: format!("Could not read {}: {err}", image.file_name),
                        ok: false,
                    });
                    continue;
                }
            };
            let mut element =
                Element::new(payload, Geometry::new(220.0, 200.0, width, height));
            element.z_index = self.store.max_z_index() + 1;
            info!("added icon element from {}", image.file_name);
            self.store.add(element);
        }
    }

    fn show_confirm_delete(&mut self, ctx: &egui::Context) {
        let Some(id) = self.confirm_delete.clone() else {
            return;
        };
        let mut decided = false;
        let response = egui::Window::new("Delete element?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let saved = self.store.find(&id).is_some_and(|e| e.is_saved);
                ui.monospace(id.as_str());
                if saved {
                    ui.label("This element is saved; deleting also removes its durable record.");
                } else {
                    ui.label("This element only exists in this session.");
                }
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        decided = true;
                        if saved {
                            match self.pipeline.delete_saved(&mut self.store, &id, true) {
                                Ok(()) => {
                                    self.textures.forget(&id);
                                    self.status = Some(Status {
                                        text: format!("Deleted {id}"),
                                        ok: true,
                                    });
                                }
                                Err(err) => {
                                    self.status = Some(Status {
                                        text: err.to_string(),
                                        ok: false,
                                    });
                                }
                            }
                        } else {
                            self.store.delete(&id);
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        decided = true;
                    }
                });
            });
        if let Some(response) = response {
            self.selection.register_chrome(response.response.rect);
        }
        if decided {
            self.confirm_delete = None;
        }
    }

    fn show_tutorial_window(&mut self, ctx: &egui::Context) {
        if !self.show_tutorial {
            return;
        }
        let response = egui::Window::new("Welcome")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Drag elements to move them. Use the corner handles to resize and the handle above an element to rotate.");
                ui.label("Drop an image file anywhere to add it as an icon. Nothing is durable until you save.");
                if ui.button("Got it").clicked() {
                    self.pipeline.mark_tutorial_seen();
                    self.show_tutorial = false;
                }
            });
        if let Some(response) = response {
            self.selection.register_chrome(response.response.rect);
        }
    }

    fn show_status(&mut self, ctx: &egui::Context) {
        let Some(status) = &self.status else {
            return;
        };
        let color = if status.ok {
            Color32::from_rgb(40, 160, 70)
        } else {
            Color32::from_rgb(200, 60, 50)
        };
        let text = status.text.clone();
        let mut dismissed = false;
        let response = egui::Area::new(egui::Id::new("status_toast"))
            .anchor(egui::Align2::RIGHT_BOTTOM, vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.colored_label(color, text);
                        if ui.small_button("✕").clicked() {
                            dismissed = true;
                        }
                    });
                });
            });
        self.selection.register_chrome(response.response.rect);
        if dismissed {
            self.status = None;
        }
    }
}

impl eframe::App for EditorApp {
    /// Called by the framework to persist state before shutdown.
    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        self.pipeline.snapshot_to_cache(&self.store);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.textures.begin_frame();
        self.selection.begin_frame();

        self.handle_shortcuts(ctx);
        self.handle_dropped_images(ctx);

        let toolbar_response = egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar.show(ui, &self.store)
        });
        self.selection.register_chrome(toolbar_response.response.rect);
        if let Some(action) = toolbar_response.inner {
            self.run_toolbar_action(action);
        }

        let inspector_response = egui::SidePanel::right("inspector")
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.inspector.show(ui, &mut self.store);
                });
            });
        self.selection.register_chrome(inspector_response.response.rect);
        self.handle_inspector_requests();

        egui::CentralPanel::default().show(ctx, |ui| {
            let canvas_rect = ui.max_rect();
            // Background interaction is registered first so elements painted
            // afterwards win overlapping pointer presses.
            let background = ui.interact(canvas_rect, egui::Id::new("page_canvas"), Sense::click());

            let sections = demo_sections(canvas_rect);
            paint_page(ui, &sections);
            let regions: Vec<PageRegion> =
                sections.into_iter().map(|s| s.region).collect();

            self.renderer.show(ui, &mut self.store, &mut self.textures);
            self.selection
                .draw_highlight(ui.painter(), &regions, &self.store);

            if background.clicked() {
                if let Some(pos) = background.interact_pointer_pos() {
                    self.selection
                        .handle_pointer_down(pos, &regions, &mut self.store);
                }
            }
        });

        self.show_confirm_delete(ctx);
        self.show_tutorial_window(ctx);
        self.show_status(ctx);
        self.intake.preview_files_being_dropped(ctx);
    }
}

/// The stand-in marketing page: a hero section, three benefit cards and a
/// footer. Hero and cards are flagged editable.
fn demo_sections(canvas: Rect) -> Vec<PageSection> {
    let margin = 16.0;
    let width = canvas.width() - 2.0 * margin;
    let left = canvas.min.x + margin;
    let mut top = canvas.min.y + margin;

    let mut sections = Vec::new();
    sections.push(PageSection {
        title: "Hero: handcrafted goods, delivered",
        region: PageRegion {
            id: Some("hero".to_owned()),
            rect: Rect::from_min_size(Pos2::new(left, top), vec2(width, 180.0)),
            editable: true,
        },
    });
    top += 180.0 + margin;

    let card_width = (width - 2.0 * margin) / 3.0;
    for (i, title) in ["Benefits", "Services", "Portfolio"].into_iter().enumerate() {
        sections.push(PageSection {
            title,
            region: PageRegion {
                id: None,
                rect: Rect::from_min_size(
                    Pos2::new(left + i as f32 * (card_width + margin), top),
                    vec2(card_width, 140.0),
                ),
                editable: true,
            },
        });
    }
    top += 140.0 + margin;

    sections.push(PageSection {
        title: "Footer",
        region: PageRegion {
            id: None,
            rect: Rect::from_min_size(
                Pos2::new(left, top),
                vec2(width, (canvas.max.y - top - margin).max(60.0)),
            ),
            editable: false,
        },
    });
    sections
}

fn paint_page(ui: &egui::Ui, sections: &[PageSection]) {
    for section in sections {
        let rect = section.region.rect;
        ui.painter().rect_filled(rect, 6.0, Color32::from_gray(242));
        ui.painter().rect_stroke(
            rect,
            6.0,
            egui::Stroke::new(1.0, Color32::from_gray(210)),
        );
        ui.painter().text(
            rect.left_top() + vec2(12.0, 12.0),
            egui::Align2::LEFT_TOP,
            section.title,
            egui::FontId::proportional(15.0),
            Color32::from_gray(90),
        );
    }
}
