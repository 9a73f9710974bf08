use egui::{Color32, CursorIcon, Id, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2};

use crate::element::ElementId;

pub const HANDLE_SIZE: f32 = 9.0;

const HANDLE_FILL: Color32 = Color32::from_rgb(30, 120, 255);

/// Corner of an element's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Corner::TopLeft | Corner::BottomRight => CursorIcon::ResizeNwSe,
            Corner::TopRight | Corner::BottomLeft => CursorIcon::ResizeNeSw,
        }
    }

    pub fn of_rect(&self, rect: Rect) -> Pos2 {
        match self {
            Corner::TopLeft => rect.left_top(),
            Corner::TopRight => rect.right_top(),
            Corner::BottomLeft => rect.left_bottom(),
            Corner::BottomRight => rect.right_bottom(),
        }
    }
}

/// A draggable corner handle shown on the selected element.
pub struct ResizeHandle<'a> {
    element_id: &'a ElementId,
    corner: Corner,
    position: Pos2,
}

impl<'a> ResizeHandle<'a> {
    pub fn new(element_id: &'a ElementId, corner: Corner, position: Pos2) -> Self {
        Self {
            element_id,
            corner,
            position,
        }
    }

    pub fn show(&self, ui: &mut Ui) -> Response {
        let id = Id::new(("resize_handle", self.element_id, self.corner.as_str()));
        let rect = Rect::from_center_size(self.position, Vec2::splat(HANDLE_SIZE));

        ui.painter().rect_filled(rect, 2.0, HANDLE_FILL);
        ui.painter()
            .rect_stroke(rect, 2.0, Stroke::new(1.0, Color32::WHITE));

        ui.interact(rect, id, Sense::click_and_drag())
            .on_hover_cursor(self.corner.cursor_icon())
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    /// Non-interactive round marker (rotation pivot, center dot).
    pub fn draw_marker(ui: &Ui, position: Pos2, radius: f32) {
        ui.painter().circle_filled(position, radius, HANDLE_FILL);
        ui.painter()
            .circle_stroke(position, radius, Stroke::new(1.0, Color32::WHITE));
    }
}
