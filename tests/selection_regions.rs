use egui::{Pos2, Rect, vec2};

use overlay_editor::element::{Element, ElementId, Geometry, Payload};
use overlay_editor::selection::{PageRegion, SelectionLayer};
use overlay_editor::store::ElementStore;

fn region(left: f32, top: f32, width: f32, height: f32, id: Option<&str>, editable: bool) -> PageRegion {
    PageRegion {
        id: id.map(str::to_owned),
        rect: Rect::from_min_size(Pos2::new(left, top), vec2(width, height)),
        editable,
    }
}

#[test]
fn editable_region_selects_with_its_explicit_id() {
    let layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    let regions = vec![region(0.0, 0.0, 200.0, 100.0, Some("hero"), true)];

    layer.handle_pointer_down(Pos2::new(50.0, 50.0), &regions, &mut store);
    assert_eq!(store.selected(), Some(&ElementId::from("hero")));
}

#[test]
fn anonymous_region_selects_with_a_synthetic_id() {
    let layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    let regions = vec![
        region(0.0, 0.0, 200.0, 100.0, Some("hero"), true),
        region(0.0, 120.0, 200.0, 100.0, None, true),
    ];

    layer.handle_pointer_down(Pos2::new(50.0, 150.0), &regions, &mut store);
    assert_eq!(store.selected(), Some(&ElementId::from("section-1")));

    // The synthetic id is stable: the same press resolves to the same id.
    layer.handle_pointer_down(Pos2::new(120.0, 200.0), &regions, &mut store);
    assert_eq!(store.selected(), Some(&ElementId::from("section-1")));
}

#[test]
fn topmost_editable_region_wins_overlap() {
    let layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    // Later regions paint on top; both contain the press point.
    let regions = vec![
        region(0.0, 0.0, 200.0, 200.0, Some("below"), true),
        region(50.0, 50.0, 100.0, 100.0, Some("above"), true),
    ];

    layer.handle_pointer_down(Pos2::new(75.0, 75.0), &regions, &mut store);
    assert_eq!(store.selected(), Some(&ElementId::from("above")));
}

#[test]
fn non_editable_regions_are_skipped() {
    let layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    store.select(Some(ElementId::from("hero")));
    let regions = vec![region(0.0, 0.0, 200.0, 100.0, Some("footer"), false)];

    // The press lands on a region, but one the page has not opened up for
    // editing; it behaves like empty space.
    layer.handle_pointer_down(Pos2::new(50.0, 50.0), &regions, &mut store);
    assert_eq!(store.selected(), None);
}

#[test]
fn empty_space_clears_selection() {
    let layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    store.select(Some(ElementId::from("hero")));

    layer.handle_pointer_down(Pos2::new(500.0, 500.0), &[], &mut store);
    assert_eq!(store.selected(), None);
}

#[test]
fn chrome_swallows_pointer_presses() {
    let mut layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    store.select(Some(ElementId::from("hero")));
    let regions = vec![region(0.0, 0.0, 200.0, 100.0, Some("hero"), true)];

    // An inspector-like panel covers part of the canvas; a press inside it
    // must change nothing, even over an editable region.
    layer.register_chrome(Rect::from_min_size(Pos2::new(0.0, 0.0), vec2(300.0, 300.0)));
    layer.handle_pointer_down(Pos2::new(50.0, 50.0), &regions, &mut store);
    assert_eq!(store.selected(), Some(&ElementId::from("hero")));
    assert!(layer.is_chrome(Pos2::new(50.0, 50.0)));
}

#[test]
fn chrome_registry_resets_each_frame() {
    let mut layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    let regions = vec![region(0.0, 0.0, 200.0, 100.0, Some("hero"), true)];

    layer.register_chrome(Rect::from_min_size(Pos2::new(0.0, 0.0), vec2(300.0, 300.0)));
    layer.begin_frame();

    layer.handle_pointer_down(Pos2::new(50.0, 50.0), &regions, &mut store);
    assert_eq!(store.selected(), Some(&ElementId::from("hero")));
}

#[test]
fn element_selection_is_not_a_region_selection() {
    let layer = SelectionLayer::new();
    let mut store = ElementStore::new();
    store.add(Element::with_id(
        ElementId::from("icon-1"),
        Payload::empty_icon(),
        Geometry::new(300.0, 300.0, 100.0, 100.0),
    ));
    let regions = vec![region(0.0, 0.0, 200.0, 100.0, Some("hero"), true)];

    // A press on empty space drops the element selection too.
    layer.handle_pointer_down(Pos2::new(600.0, 600.0), &regions, &mut store);
    assert_eq!(store.selected(), None);
}
