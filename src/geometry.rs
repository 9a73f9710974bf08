//! Pure gesture math.
//!
//! Every function maps a pointer delta and the geometry captured at gesture
//! start to a new geometry; nothing here reads or writes editor state, so
//! re-applying the same input always yields the same output and a gesture
//! cannot drift.

use egui::Pos2;

use crate::element::{Geometry, clamp_dimension};
use crate::widgets::Corner;

fn finite(pos: Pos2) -> bool {
    pos.x.is_finite() && pos.y.is_finite()
}

/// New position from a body drag. No boundary clamping: parking an element
/// partially or fully off-screen is allowed.
pub fn drag(initial: &Geometry, pointer_down: Pos2, current: Pos2) -> Geometry {
    if !finite(pointer_down) || !finite(current) {
        return *initial;
    }
    Geometry {
        left: initial.left + (current.x - pointer_down.x),
        top: initial.top + (current.y - pointer_down.y),
        ..*initial
    }
}

/// Resize from one corner handle, pivoting around the diagonally opposite
/// corner.
///
/// Width and height are clamped to the allowed range, and the position is
/// recomputed from the clamped dimension: when the clamp stops an edge from
/// moving, the element does not shift either.
pub fn resize(initial: &Geometry, corner: Corner, pointer_down: Pos2, current: Pos2) -> Geometry {
    if !finite(pointer_down) || !finite(current) {
        return *initial;
    }
    let dx = current.x - pointer_down.x;
    let dy = current.y - pointer_down.y;

    let (raw_width, raw_height) = match corner {
        Corner::BottomRight => (initial.width + dx, initial.height + dy),
        Corner::BottomLeft => (initial.width - dx, initial.height + dy),
        Corner::TopRight => (initial.width + dx, initial.height - dy),
        Corner::TopLeft => (initial.width - dx, initial.height - dy),
    };
    let width = clamp_dimension(raw_width);
    let height = clamp_dimension(raw_height);

    let left = match corner {
        Corner::TopLeft | Corner::BottomLeft => initial.left + (initial.width - width),
        Corner::TopRight | Corner::BottomRight => initial.left,
    };
    let top = match corner {
        Corner::TopLeft | Corner::TopRight => initial.top + (initial.height - height),
        Corner::BottomLeft | Corner::BottomRight => initial.top,
    };

    Geometry {
        left,
        top,
        width,
        height,
    }
}

/// Rotation in degrees for a pointer position relative to the element's
/// center, normalized into `[0, 360)`. A pointer directly above the center
/// is 0°, directly right of it is 90°.
///
/// The center must be taken from the element's current on-screen rect at
/// gesture start; earlier moves and resizes shift it.
pub fn rotation_from_pointer(center: Pos2, pointer: Pos2) -> f32 {
    if !finite(center) || !finite(pointer) {
        return 0.0;
    }
    let dx = pointer.x - center.x;
    let dy = pointer.y - center.y;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    let degrees = dy.atan2(dx).to_degrees() + 90.0;
    degrees.rem_euclid(360.0)
}
