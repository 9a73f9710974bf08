use egui::emath::Rot2;
use egui::epaint::TextShape;
use egui::{
    Align2, Color32, CursorIcon, FontId, Id, Mesh, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2,
    pos2, vec2,
};
use log::debug;

use crate::element::{Element, ElementId, Geometry, IconSource, Payload};
use crate::geometry;
use crate::store::{ElementPatch, ElementStore};
use crate::texture_cache::{TextureCache, TextureError};
use crate::widgets::{Corner, ResizeHandle};

pub const ROTATION_HANDLE_OFFSET: f32 = 30.0;

const ACCENT: Color32 = Color32::from_rgb(30, 120, 255);
const PLACEHOLDER_GRAY: Color32 = Color32::from_gray(150);
const DASH_LEN: f32 = 6.0;
const GAP_LEN: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureKind {
    Move,
    Resize(Corner),
    Rotate,
}

/// State captured at pointer-down and held for the lifetime of one gesture.
#[derive(Debug)]
struct ActiveGesture {
    id: ElementId,
    kind: GestureKind,
    pointer_down: Pos2,
    start_geometry: Geometry,
    /// Full snapshot for the single history entry committed at gesture end.
    start_element: Element,
    /// Rotation pivot, taken from the on-screen rect at gesture start.
    center: Pos2,
}

/// Paints every stored element and owns the drag/resize/rotate gestures.
///
/// At most one gesture is active at a time; pointer-downs on other elements
/// are ignored until the current gesture ends.
#[derive(Debug, Default)]
pub struct ElementRenderer {
    gesture: Option<ActiveGesture>,
}

impl ElementRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture_in_progress(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn show(&mut self, ui: &mut Ui, store: &mut ElementStore, textures: &mut TextureCache) {
        let elements: Vec<Element> = store.ordered().into_iter().cloned().collect();
        let selected = store.selected().cloned();

        for element in &elements {
            let is_selected = selected.as_ref() == Some(&element.id);
            let moving = self
                .gesture
                .as_ref()
                .is_some_and(|g| g.id == element.id && g.kind == GestureKind::Move);

            self.paint_element(ui, textures, element, moving);

            self.interact_body(ui, store, element);

            // Handles stay live through a resize/rotate gesture on this
            // element so the captured drag keeps receiving pointer input;
            // they hide during a body drag and while another element owns
            // the gesture.
            let handles_visible = is_selected
                && match &self.gesture {
                    None => true,
                    Some(g) => g.id == element.id && g.kind != GestureKind::Move,
                };
            if handles_visible {
                self.show_handles(ui, store, element);
            }
        }

        self.finish_if_released(ui, store);
    }

    // ---- gestures --------------------------------------------------------

    fn interact_body(&mut self, ui: &mut Ui, store: &mut ElementStore, element: &Element) {
        let response = ui.interact(
            element.rect(),
            Id::new(("element_body", &element.id)),
            Sense::click_and_drag(),
        );

        if response.clicked() {
            store.select(Some(element.id.clone()));
        }

        if response.drag_started() && self.gesture.is_none() {
            if let Some(pointer) = response.interact_pointer_pos() {
                store.select(Some(element.id.clone()));
                debug!("move gesture started on {}", element.id);
                self.gesture = Some(ActiveGesture {
                    id: element.id.clone(),
                    kind: GestureKind::Move,
                    pointer_down: pointer,
                    start_geometry: element.geometry,
                    start_element: element.clone(),
                    center: element.rect().center(),
                });
            }
        }

        if let Some(gesture) = &self.gesture {
            if gesture.id == element.id && gesture.kind == GestureKind::Move && response.dragged() {
                ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
                if let Some(current) = response.interact_pointer_pos() {
                    let next = geometry::drag(&gesture.start_geometry, gesture.pointer_down, current);
                    store.apply_transient(&gesture.id.clone(), ElementPatch::geometry(next));
                }
            }
        }
    }

    fn show_handles(&mut self, ui: &mut Ui, store: &mut ElementStore, element: &Element) {
        let rect = element.rect();

        // Rotation stem and handle, offset above the element to show the
        // pivot.
        let rotate_pos = pos2(rect.center().x, rect.min.y - ROTATION_HANDLE_OFFSET);
        ui.painter()
            .line_segment([rect.center(), rotate_pos], Stroke::new(1.0, ACCENT));
        ResizeHandle::draw_marker(ui, rotate_pos, 5.0);
        ResizeHandle::draw_marker(ui, rect.center(), 3.0);

        let rotate_response = ui.interact(
            Rect::from_center_size(rotate_pos, Vec2::splat(16.0)),
            Id::new(("rotate_handle", &element.id)),
            Sense::click_and_drag(),
        );
        if rotate_response.drag_started() && self.gesture.is_none() {
            if let Some(pointer) = rotate_response.interact_pointer_pos() {
                debug!("rotate gesture started on {}", element.id);
                self.gesture = Some(ActiveGesture {
                    id: element.id.clone(),
                    kind: GestureKind::Rotate,
                    pointer_down: pointer,
                    start_geometry: element.geometry,
                    start_element: element.clone(),
                    center: rect.center(),
                });
            }
        }
        self.drive_rotate(ui, store, &rotate_response, element);

        for corner in Corner::ALL {
            let handle = ResizeHandle::new(&element.id, corner, corner.of_rect(rect));
            let response = handle.show(ui);
            if response.drag_started() && self.gesture.is_none() {
                if let Some(pointer) = response.interact_pointer_pos() {
                    debug!("resize gesture started on {} ({})", element.id, corner.as_str());
                    self.gesture = Some(ActiveGesture {
                        id: element.id.clone(),
                        kind: GestureKind::Resize(corner),
                        pointer_down: pointer,
                        start_geometry: element.geometry,
                        start_element: element.clone(),
                        center: rect.center(),
                    });
                }
            }
            self.drive_resize(store, &response, corner);
        }
    }

    fn drive_resize(&self, store: &mut ElementStore, response: &egui::Response, corner: Corner) {
        let Some(gesture) = &self.gesture else {
            return;
        };
        if gesture.kind != GestureKind::Resize(corner) || !response.dragged() {
            return;
        }
        if let Some(current) = response.interact_pointer_pos() {
            let next = geometry::resize(&gesture.start_geometry, corner, gesture.pointer_down, current);
            store.apply_transient(&gesture.id.clone(), ElementPatch::geometry(next));
        }
    }

    fn drive_rotate(
        &self,
        ui: &Ui,
        store: &mut ElementStore,
        response: &egui::Response,
        element: &Element,
    ) {
        let Some(gesture) = &self.gesture else {
            return;
        };
        if gesture.kind != GestureKind::Rotate || gesture.id != element.id || !response.dragged() {
            return;
        }
        ui.ctx().set_cursor_icon(CursorIcon::Crosshair);
        if let Some(current) = response.interact_pointer_pos() {
            let degrees = geometry::rotation_from_pointer(gesture.center, current);
            let mut appearance = match store.find(&gesture.id) {
                Some(e) => e.appearance.clone(),
                None => return,
            };
            appearance.transform.rotation_degrees = degrees;
            store.apply_transient(&gesture.id.clone(), ElementPatch::appearance(appearance));
        }
    }

    /// Commit the gesture's single history entry once the pointer is
    /// released, wherever it ended up on screen.
    fn finish_if_released(&mut self, ui: &Ui, store: &mut ElementStore) {
        let released = ui.input(|i| i.pointer.any_released() || !i.pointer.any_down());
        if released {
            if let Some(gesture) = self.gesture.take() {
                debug!("gesture finished on {}", gesture.id);
                store.commit_gesture(gesture.start_element);
                ui.ctx().set_cursor_icon(CursorIcon::Default);
            }
        }
    }

    // ---- painting --------------------------------------------------------

    fn paint_element(
        &self,
        ui: &mut Ui,
        textures: &mut TextureCache,
        element: &Element,
        moving: bool,
    ) {
        // In-gesture styling is cosmetic only; the stored geometry is never
        // touched by it.
        let rect = if moving {
            element.rect().expand(2.0)
        } else {
            element.rect()
        };
        let appearance = &element.appearance;
        let opacity = appearance.opacity.clamp(0.0, 1.0);
        let angle = appearance.transform.rotation_radians();
        let center = rect.center();

        if appearance.background_color.a() > 0 {
            paint_quad(
                ui,
                rect,
                angle,
                appearance.border_radius,
                appearance.background_color.gamma_multiply(opacity),
            );
        }

        match &element.payload {
            Payload::Icon { source, .. } => {
                if element.payload.is_empty_icon() {
                    self.paint_placeholder(ui, rect);
                } else {
                    self.paint_icon(ui, textures, element, source, rect, opacity);
                }
            }
            Payload::Text { content } => {
                let color = appearance
                    .color_filter
                    .unwrap_or(Color32::BLACK)
                    .gamma_multiply(opacity);
                let font = FontId::proportional(16.0 * appearance.transform.scale_y.max(0.1));
                let galley = ui.painter().layout_no_wrap(content.clone(), font, color);
                // Anchor so the galley rotates about the element center.
                let offset = Rot2::from_angle(angle) * (-galley.size() / 2.0);
                let mut text = TextShape::new(center + offset, galley, color);
                text.angle = angle;
                ui.painter().add(text);
            }
            Payload::Unknown => {
                self.paint_placeholder(ui, rect);
                ui.painter().text(
                    rect.center_bottom() + vec2(0.0, -12.0),
                    Align2::CENTER_CENTER,
                    "unsupported element",
                    FontId::proportional(11.0),
                    PLACEHOLDER_GRAY,
                );
            }
        }

        if appearance.border_width > 0.0 {
            let stroke = Stroke::new(
                appearance.border_width,
                appearance.border_color.gamma_multiply(opacity),
            );
            if angle == 0.0 {
                ui.painter()
                    .rect_stroke(rect, appearance.border_radius, stroke);
            } else {
                ui.painter()
                    .add(Shape::closed_line(rotated_corners(rect, angle), stroke));
            }
        }

        if moving {
            dashed_rect(ui, rect, Stroke::new(1.5, ACCENT));
            ui.painter().text(
                rect.center_top() + vec2(0.0, -10.0),
                Align2::CENTER_CENTER,
                "moving",
                FontId::proportional(11.0),
                ACCENT,
            );
        }
    }

    fn paint_icon(
        &self,
        ui: &mut Ui,
        textures: &mut TextureCache,
        element: &Element,
        source: &IconSource,
        rect: Rect,
        opacity: f32,
    ) {
        let transform = &element.appearance.transform;
        let texture = textures.icon_texture(
            ui.ctx(),
            &element.id,
            element.payload_version,
            source,
        );
        match texture {
            Ok(texture_id) => {
                let center = rect.center();
                let scaled = Rect::from_center_size(
                    center,
                    vec2(
                        rect.width() * transform.scale_x.max(0.0),
                        rect.height() * transform.scale_y.max(0.0),
                    ),
                );
                let tint = element
                    .appearance
                    .color_filter
                    .unwrap_or(Color32::WHITE)
                    .gamma_multiply(opacity);

                let mut mesh = Mesh::with_texture(texture_id);
                mesh.add_rect_with_uv(
                    scaled,
                    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                    tint,
                );
                let skew = transform.skew_tangent();
                if skew != 0.0 {
                    for vertex in &mut mesh.vertices {
                        vertex.pos.x += (vertex.pos.y - center.y) * skew;
                    }
                }
                let angle = transform.rotation_radians();
                if angle != 0.0 {
                    mesh.rotate(Rot2::from_angle(angle), center);
                }
                ui.painter().add(Shape::mesh(mesh));
            }
            Err(TextureError::Empty) => self.paint_placeholder(ui, rect),
            Err(err) => {
                debug!("icon texture unavailable for {}: {err}", element.id);
                self.paint_placeholder(ui, rect);
            }
        }
    }

    /// Dashed upload prompt for an icon element that has no image yet.
    fn paint_placeholder(&self, ui: &Ui, rect: Rect) {
        dashed_rect(ui, rect, Stroke::new(1.0, PLACEHOLDER_GRAY));
        ui.painter().text(
            rect.center(),
            Align2::CENTER_CENTER,
            "Drop an image",
            FontId::proportional(12.0),
            PLACEHOLDER_GRAY,
        );
    }
}

fn rotated_corners(rect: Rect, angle: f32) -> Vec<Pos2> {
    let rot = Rot2::from_angle(angle);
    let center = rect.center();
    [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ]
    .iter()
    .map(|p| center + rot * (*p - center))
    .collect()
}

fn paint_quad(ui: &Ui, rect: Rect, angle: f32, radius: f32, fill: Color32) {
    if angle == 0.0 {
        ui.painter().rect_filled(rect, radius, fill);
    } else {
        // Rounded corners are dropped for rotated quads; the painter has no
        // rotated rounded-rect primitive.
        ui.painter().add(Shape::convex_polygon(
            rotated_corners(rect, angle),
            fill,
            Stroke::NONE,
        ));
    }
}

fn dashed_rect(ui: &Ui, rect: Rect, stroke: Stroke) {
    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
        rect.left_top(),
    ];
    for pair in corners.windows(2) {
        ui.painter()
            .extend(Shape::dashed_line(pair, stroke, DASH_LEN, GAP_LEN));
    }
}
