use egui::{Color32, Painter, Pos2, Rect, Stroke};
use log::debug;

use crate::element::ElementId;
use crate::store::ElementStore;

const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(30, 120, 255);

/// A page-native region the host page exposes to the editor.
///
/// Mirrors the DOM contract: only regions flagged `editable` can be
/// selected, an explicit `id` is optional, and the editor never mutates the
/// region itself; it only overlays a highlight.
#[derive(Clone, Debug)]
pub struct PageRegion {
    pub id: Option<String>,
    pub rect: Rect,
    pub editable: bool,
}

impl PageRegion {
    /// Stable id used for selection: the explicit one when present,
    /// otherwise synthesized from the region's index in the page.
    pub fn selection_id(&self, index: usize) -> ElementId {
        match &self.id {
            Some(id) => ElementId::from(id.as_str()),
            None => ElementId::synthetic(index),
        }
    }
}

/// Routes pointer-downs that were not claimed by an editor element to either
/// a page-native region or a selection clear, and draws the highlight
/// overlay for a selected region.
#[derive(Debug, Default)]
pub struct SelectionLayer {
    /// Editor chrome (inspector, toolbar, dialogs) registered each frame;
    /// presses inside chrome never change selection.
    chrome: Vec<Rect>,
}

impl SelectionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.chrome.clear();
    }

    pub fn register_chrome(&mut self, rect: Rect) {
        self.chrome.push(rect);
    }

    pub fn is_chrome(&self, pos: Pos2) -> bool {
        self.chrome.iter().any(|r| r.contains(pos))
    }

    /// Handle a pointer-down that no editor element consumed.
    ///
    /// Editor-managed elements are not handled here at all; the renderer
    /// owns their drag-start semantics and a press on one never reaches
    /// this method.
    pub fn handle_pointer_down(
        &self,
        pos: Pos2,
        regions: &[PageRegion],
        store: &mut ElementStore,
    ) {
        if self.is_chrome(pos) {
            return;
        }
        // Topmost editable region wins; later regions paint on top.
        let hit = regions
            .iter()
            .enumerate()
            .rev()
            .find(|(_, region)| region.editable && region.rect.contains(pos));
        match hit {
            Some((index, region)) => {
                let id = region.selection_id(index);
                debug!("page region selected: {id}");
                store.select(Some(id));
            }
            None => store.clear_selection(),
        }
    }

    /// Draw the highlight rectangle for a selected page-native region.
    ///
    /// The rect is re-read from the region list every frame, so the overlay
    /// follows layout changes; if the selected region no longer exists the
    /// highlight simply disappears.
    pub fn draw_highlight(
        &self,
        painter: &Painter,
        regions: &[PageRegion],
        store: &ElementStore,
    ) {
        let Some(selected) = store.selected() else {
            return;
        };
        // An id that belongs to an editor element is the renderer's to
        // highlight, not ours.
        if store.find(selected).is_some() {
            return;
        }
        let hit = regions
            .iter()
            .enumerate()
            .find(|(index, region)| region.editable && &region.selection_id(*index) == selected);
        if let Some((_, region)) = hit {
            painter.rect_stroke(region.rect, 2.0, Stroke::new(2.0, HIGHLIGHT_COLOR));
        }
    }
}
