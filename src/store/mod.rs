use std::collections::HashSet;

use log::debug;

use crate::element::{Appearance, Element, ElementId, Geometry, Payload};

mod history;

pub use history::{HISTORY_LIMIT, History, HistoryEntry, HistoryKind};

/// Partial update applied to an element. Nested structures (`geometry`,
/// `appearance`) are replaced whole, never deep-merged; callers pass the full
/// replacement value.
#[derive(Clone, Debug, Default)]
pub struct ElementPatch {
    pub geometry: Option<Geometry>,
    pub z_index: Option<i32>,
    pub appearance: Option<Appearance>,
    pub payload: Option<Payload>,
}

impl ElementPatch {
    pub fn geometry(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::default()
        }
    }

    pub fn z_index(z_index: i32) -> Self {
        Self {
            z_index: Some(z_index),
            ..Self::default()
        }
    }

    pub fn appearance(appearance: Appearance) -> Self {
        Self {
            appearance: Some(appearance),
            ..Self::default()
        }
    }

    pub fn payload(payload: Payload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }
}

/// Authoritative registry of editable elements plus selection, the draft
/// set, and the undo/redo history.
///
/// Constructed explicitly by the app that owns the editor and passed by
/// reference to panels and the renderer; there is no ambient global state.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
    selected: Option<ElementId>,
    /// Ids mutated since the last successful save.
    drafts: HashSet<ElementId>,
    /// Ids with a save currently in flight; conflicting payload edits are
    /// refused while a member.
    saving: HashSet<ElementId>,
    history: History,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- lookup ----------------------------------------------------------

    pub fn find(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    fn find_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in paint order: ascending `z_index`, ties broken by id so
    /// the order is stable across frames.
    pub fn ordered(&self) -> Vec<&Element> {
        let mut out: Vec<&Element> = self.elements.iter().collect();
        out.sort_by(|a, b| {
            a.z_index
                .cmp(&b.z_index)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        out
    }

    /// Topmost element containing `pos`, for hit-testing.
    pub fn top_element_at(&self, pos: egui::Pos2) -> Option<&Element> {
        self.ordered().into_iter().rev().find(|e| e.hit_test(pos))
    }

    pub fn max_z_index(&self) -> i32 {
        self.elements.iter().map(|e| e.z_index).max().unwrap_or(0)
    }

    // ---- selection -------------------------------------------------------

    /// At most one id is selected; selecting a new one implicitly drops the
    /// previous selection. The id may be synthetic (a page-native region).
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id;
    }

    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.as_ref().and_then(|id| self.find(id))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // ---- mutations -------------------------------------------------------

    /// Insert a new element and select it. Silently a no-op if the id is
    /// already present; callers must guarantee uniqueness.
    pub fn add(&mut self, element: Element) {
        if self.find(&element.id).is_some() {
            debug!("add ignored, id already present: {}", element.id);
            return;
        }
        let id = element.id.clone();
        self.history.record(HistoryEntry {
            kind: HistoryKind::Add,
            element_id: id.clone(),
            before: None,
            after: Some(element.clone()),
            timestamp: history::timestamp_secs(),
        });
        self.elements.push(element);
        self.drafts.insert(id.clone());
        self.selected = Some(id);
    }

    /// Apply a patch as one discrete, undoable edit (inspector field commit).
    /// Unknown id is a silent no-op.
    pub fn update(&mut self, id: &ElementId, patch: ElementPatch) {
        let Some(before) = self.find(id).cloned() else {
            return;
        };
        self.apply_patch(id, patch);
        let after = self.find(id).cloned();
        self.history.record(HistoryEntry {
            kind: HistoryKind::Update,
            element_id: id.clone(),
            before: Some(before),
            after,
            timestamp: history::timestamp_secs(),
        });
    }

    /// Apply a patch without recording history. Used for the stream of
    /// micro-updates a continuous gesture produces; the gesture records one
    /// entry at its end via [`ElementStore::commit_gesture`].
    pub fn apply_transient(&mut self, id: &ElementId, patch: ElementPatch) {
        if self.find(id).is_none() {
            return;
        }
        self.apply_patch(id, patch);
    }

    /// Record a single `Update` entry spanning a whole gesture, from the
    /// snapshot taken at gesture start to the element's current state.
    pub fn commit_gesture(&mut self, before: Element) {
        let Some(after) = self.find(&before.id).cloned() else {
            return;
        };
        if after == before {
            return;
        }
        self.history.record(HistoryEntry {
            kind: HistoryKind::Update,
            element_id: before.id.clone(),
            before: Some(before),
            after: Some(after),
            timestamp: history::timestamp_secs(),
        });
    }

    fn apply_patch(&mut self, id: &ElementId, patch: ElementPatch) {
        let payload_changed = patch.payload.is_some();
        if let Some(element) = self.find_mut(id) {
            if let Some(geometry) = patch.geometry {
                element.geometry = Geometry::new(
                    geometry.left,
                    geometry.top,
                    geometry.width,
                    geometry.height,
                );
            }
            if let Some(z_index) = patch.z_index {
                element.z_index = z_index;
            }
            if let Some(appearance) = patch.appearance {
                element.appearance = appearance;
            }
            if let Some(payload) = patch.payload {
                element.payload = payload;
            }
            if payload_changed {
                element.payload_version += 1;
            }
        }
        self.drafts.insert(id.clone());
    }

    /// Remove an element. Unknown id is a silent no-op. The full prior
    /// snapshot rides on the history entry so undo restores it exactly.
    pub fn delete(&mut self, id: &ElementId) {
        let Some(index) = self.elements.iter().position(|e| &e.id == id) else {
            return;
        };
        let removed = self.elements.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        // A never-saved element vanishes without a trace; deleting a saved
        // one leaves the session diverged from its durable record.
        if removed.is_saved {
            self.drafts.insert(id.clone());
        } else {
            self.drafts.remove(id);
        }
        self.history.record(HistoryEntry {
            kind: HistoryKind::Delete,
            element_id: id.clone(),
            before: Some(removed),
            after: None,
            timestamp: history::timestamp_secs(),
        });
    }

    // ---- undo / redo -----------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply the inverse of the entry at the cursor. No-op when the cursor
    /// is already before the first entry.
    pub fn undo(&mut self) {
        let Some(entry) = self.history.peek_undo().cloned() else {
            return;
        };
        debug!("undo {:?} {}", entry.kind, entry.element_id);
        match entry.kind {
            HistoryKind::Add => {
                // Mirrors delete: if the element was saved after the add,
                // removing it diverges the session from its durable record.
                let saved = self
                    .find(&entry.element_id)
                    .is_some_and(|element| element.is_saved);
                self.remove_silent(&entry.element_id);
                if saved {
                    self.drafts.insert(entry.element_id.clone());
                } else {
                    self.drafts.remove(&entry.element_id);
                }
            }
            HistoryKind::Delete => {
                if let Some(snapshot) = entry.before {
                    self.restore_snapshot(snapshot);
                }
            }
            HistoryKind::Update => {
                if let Some(snapshot) = entry.before {
                    self.replace_silent(snapshot);
                    self.drafts.insert(entry.element_id.clone());
                }
            }
        }
        self.history.step_back();
    }

    /// Re-apply the entry just past the cursor. No-op at the end of history.
    pub fn redo(&mut self) {
        let Some(entry) = self.history.peek_redo().cloned() else {
            return;
        };
        debug!("redo {:?} {}", entry.kind, entry.element_id);
        match entry.kind {
            HistoryKind::Add => {
                if let Some(snapshot) = entry.after {
                    let id = snapshot.id.clone();
                    self.elements.push(snapshot);
                    self.drafts.insert(id.clone());
                    self.selected = Some(id);
                }
            }
            HistoryKind::Delete => {
                if let Some(snapshot) = &entry.before {
                    let saved = snapshot.is_saved;
                    self.remove_silent(&entry.element_id);
                    if saved {
                        self.drafts.insert(entry.element_id.clone());
                    } else {
                        self.drafts.remove(&entry.element_id);
                    }
                }
            }
            HistoryKind::Update => {
                if let Some(snapshot) = entry.after {
                    self.replace_silent(snapshot);
                    self.drafts.insert(entry.element_id.clone());
                }
            }
        }
        self.history.step_forward();
    }

    fn remove_silent(&mut self, id: &ElementId) {
        self.elements.retain(|e| &e.id != id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
    }

    fn replace_silent(&mut self, snapshot: Element) {
        if let Some(element) = self.find_mut(&snapshot.id) {
            *element = snapshot;
        }
    }

    fn restore_snapshot(&mut self, snapshot: Element) {
        let id = snapshot.id.clone();
        let saved = snapshot.is_saved;
        self.elements.push(snapshot);
        if saved {
            // Restored state matches the durable record again.
            self.drafts.remove(&id);
        } else {
            self.drafts.insert(id);
        }
    }

    // ---- drafts & saving -------------------------------------------------

    /// Unsaved-changes tracking is based solely on the draft set; the
    /// history stack is not consulted and a save does not touch it.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.drafts.is_empty()
    }

    pub fn is_draft(&self, id: &ElementId) -> bool {
        self.drafts.contains(id)
    }

    pub fn draft_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.drafts.iter().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub fn is_saving(&self, id: &ElementId) -> bool {
        self.saving.contains(id)
    }

    pub(crate) fn set_saving(&mut self, id: &ElementId, saving: bool) {
        if saving {
            self.saving.insert(id.clone());
        } else {
            self.saving.remove(id);
        }
    }

    /// Called by the persistence pipeline once an element's durable write
    /// has succeeded: swap in the saved payload, set the flag, clear the
    /// draft entry. Deliberately not a history entry.
    pub(crate) fn mark_saved(&mut self, id: &ElementId, payload: Payload) {
        if let Some(element) = self.find_mut(id) {
            element.payload = payload;
            element.payload_version += 1;
            element.is_saved = true;
        }
        self.drafts.remove(id);
    }

    /// Remove an element without recording history. Used after a durable
    /// deletion succeeds; an explicit durable removal is not undoable.
    pub(crate) fn remove_unrecorded(&mut self, id: &ElementId) {
        self.remove_silent(id);
        self.drafts.remove(id);
    }

    // ---- startup ---------------------------------------------------------

    /// Load previously saved elements at editor startup. No history entries
    /// and no draft marks; the session starts clean.
    pub fn rehydrate(&mut self, elements: Vec<Element>) {
        for mut element in elements {
            if self.find(&element.id).is_some() {
                continue;
            }
            element.is_saved = true;
            if let Some(seq) = element.id.sequence() {
                crate::element::reserve_sequence(seq);
            }
            // Saved records from older versions may predate the size limits.
            element.geometry = Geometry::new(
                element.geometry.left,
                element.geometry.top,
                element.geometry.width,
                element.geometry.height,
            );
            self.elements.push(element);
        }
    }

    /// Current working set, for local-cache snapshots.
    pub fn snapshot(&self) -> Vec<Element> {
        self.elements.clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
