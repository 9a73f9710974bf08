use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

mod common;

pub use common::{MIN_ELEMENT_SIZE, MAX_ELEMENT_SIZE, clamp_dimension};

// Single static counter for all elements. Ids are never reused within a
// session, so history entries referencing a deleted id can never collide
// with a later element.
static NEXT_ELEMENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an editor-managed element, or a synthetic id for a
/// page-native region the editor overlays.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Generate a fresh id of the form `"{kind}-{seq}"`.
    pub fn generate(kind: ElementKind) -> Self {
        let seq = NEXT_ELEMENT_SEQ.fetch_add(1, Ordering::SeqCst);
        Self(format!("{}-{}", kind.as_str(), seq))
    }

    /// Stable synthetic id for a page-native region without an explicit id.
    pub fn synthetic(index: usize) -> Self {
        Self(format!("section-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing sequence number, when the id carries one.
    pub(crate) fn sequence(&self) -> Option<u64> {
        self.0.rsplit_once('-').and_then(|(_, seq)| seq.parse().ok())
    }
}

/// Keep generated ids ahead of any sequence observed in loaded records;
/// without this a fresh session would re-issue ids that saved elements from
/// earlier sessions still hold.
pub(crate) fn reserve_sequence(seq: u64) {
    NEXT_ELEMENT_SEQ.fetch_max(seq.saturating_add(1), Ordering::SeqCst);
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element variant tag. Derived from the payload, never stored separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Icon,
    Text,
    Unknown,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Icon => "icon",
            ElementKind::Text => "text",
            ElementKind::Unknown => "unknown",
        }
    }
}

/// Absolute-positioned bounding box in page pixels. `left`/`top` may be
/// negative or beyond the viewport so elements can be parked off-screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Geometry {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width: clamp_dimension(width),
            height: clamp_dimension(height),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.left, self.top),
            Vec2::new(self.width, self.height),
        )
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.min.x, rect.min.y, rect.width(), rect.height())
    }
}

/// Structured visual transform. Serialized to the paint layer's
/// rotation/scale inputs by [`Transform::rotation_radians`] and friends;
/// there is no string-encoded form anywhere.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation_degrees: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub skew_degrees: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation_degrees: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_degrees: 0.0,
        }
    }
}

impl Transform {
    pub fn rotation_radians(&self) -> f32 {
        self.rotation_degrees.to_radians()
    }

    pub fn skew_tangent(&self) -> f32 {
        self.skew_degrees.to_radians().tan()
    }
}

/// Everything about an element's look that is not position or payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// In `[0, 1]`.
    pub opacity: f32,
    pub transform: Transform,
    /// Tint applied to icon pixels; `None` leaves them untouched.
    pub color_filter: Option<Color32>,
    pub border_radius: f32,
    pub border_width: f32,
    pub border_color: Color32,
    pub background_color: Color32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            transform: Transform::default(),
            color_filter: None,
            border_radius: 0.0,
            border_width: 0.0,
            border_color: Color32::TRANSPARENT,
            background_color: Color32::TRANSPARENT,
        }
    }
}

/// Where an icon's pixels live: still inline in the working session, or
/// already uploaded to a public path by the persistence pipeline.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum IconSource {
    Inline(Vec<u8>),
    Public(String),
}

impl fmt::Debug for IconSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconSource::Inline(bytes) => f.debug_tuple("Inline").field(&bytes.len()).finish(),
            IconSource::Public(path) => f.debug_tuple("Public").field(path).finish(),
        }
    }
}

/// Element content, dispatched exhaustively by the renderer and inspector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Icon {
        source: IconSource,
        file_name: String,
    },
    Text {
        content: String,
    },
    Unknown,
}

impl Payload {
    pub fn kind(&self) -> ElementKind {
        match self {
            Payload::Icon { .. } => ElementKind::Icon,
            Payload::Text { .. } => ElementKind::Text,
            Payload::Unknown => ElementKind::Unknown,
        }
    }

    /// An icon with no pixels yet; renders as the upload placeholder.
    pub fn empty_icon() -> Self {
        Payload::Icon {
            source: IconSource::Inline(Vec::new()),
            file_name: String::new(),
        }
    }

    pub fn is_empty_icon(&self) -> bool {
        matches!(
            self,
            Payload::Icon { source: IconSource::Inline(bytes), .. } if bytes.is_empty()
        )
    }
}

/// The unit the editor manages: an overlay object placed on top of the page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub z_index: i32,
    pub geometry: Geometry,
    pub appearance: Appearance,
    pub payload: Payload,
    /// True once a durable copy exists in the configuration store.
    pub is_saved: bool,
    /// Bumped whenever the payload is replaced; keys the texture cache.
    #[serde(default, skip)]
    pub payload_version: u64,
}

impl Element {
    pub fn new(payload: Payload, geometry: Geometry) -> Self {
        let id = ElementId::generate(payload.kind());
        Self::with_id(id, payload, geometry)
    }

    pub fn with_id(id: ElementId, payload: Payload, geometry: Geometry) -> Self {
        Self {
            id,
            z_index: 0,
            geometry,
            appearance: Appearance::default(),
            payload,
            is_saved: false,
            payload_version: 0,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.payload.kind()
    }

    pub fn rect(&self) -> Rect {
        self.geometry.rect()
    }

    pub fn hit_test(&self, pos: Pos2) -> bool {
        self.rect().contains(pos)
    }
}
