use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use overlay_editor::element::{Element, ElementId, Geometry, IconSource, Payload};
use overlay_editor::persist::{
    AssetStore, ConfigStore, FileCache, JsonConfigStore, LocalCache, MemoryCache, PersistError,
    Pipeline, SaveError, WORKING_SET_KEY,
};
use overlay_editor::store::ElementStore;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "overlay-editor-test-{}-{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn inline_icon(id: &str, file_name: &str, bytes: &[u8]) -> Element {
    Element::with_id(
        ElementId::from(id),
        Payload::Icon {
            source: IconSource::Inline(bytes.to_vec()),
            file_name: file_name.to_owned(),
        },
        Geometry::new(10.0, 10.0, 100.0, 100.0),
    )
}

fn text(id: &str, content: &str) -> Element {
    Element::with_id(
        ElementId::from(id),
        Payload::Text {
            content: content.to_owned(),
        },
        Geometry::new(10.0, 10.0, 120.0, 40.0),
    )
}

/// In-memory config store for exercising the pipeline without disk.
#[derive(Default)]
struct MemoryConfigStore {
    records: HashMap<String, Element>,
}

impl ConfigStore for MemoryConfigStore {
    fn load_all(&self) -> Result<HashMap<String, Element>, PersistError> {
        Ok(self.records.clone())
    }

    fn put(&mut self, element: &Element) -> Result<(), PersistError> {
        self.records
            .insert(element.id.as_str().to_owned(), element.clone());
        Ok(())
    }

    fn remove(&mut self, id: &ElementId) -> Result<(), PersistError> {
        self.records.remove(id.as_str());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryAssetStore {
    uploads: Vec<String>,
}

impl AssetStore for MemoryAssetStore {
    fn upload(&mut self, file_name: &str, _bytes: &[u8]) -> Result<String, PersistError> {
        let path = format!("/assets/{file_name}");
        self.uploads.push(path.clone());
        Ok(path)
    }

    fn delete(&mut self, public_path: &str) -> Result<(), PersistError> {
        self.uploads.retain(|p| p != public_path);
        Ok(())
    }
}

struct FailingAssetStore;

impl AssetStore for FailingAssetStore {
    fn upload(&mut self, _file_name: &str, _bytes: &[u8]) -> Result<String, PersistError> {
        Err(PersistError::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "upload rejected",
        )))
    }

    fn delete(&mut self, _public_path: &str) -> Result<(), PersistError> {
        Err(PersistError::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "delete rejected",
        )))
    }
}

struct FailingConfigStore;

impl ConfigStore for FailingConfigStore {
    fn load_all(&self) -> Result<HashMap<String, Element>, PersistError> {
        Err(PersistError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "config unreadable",
        )))
    }

    fn put(&mut self, _element: &Element) -> Result<(), PersistError> {
        Err(PersistError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "config unwritable",
        )))
    }

    fn remove(&mut self, _id: &ElementId) -> Result<(), PersistError> {
        Err(PersistError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "config unwritable",
        )))
    }
}

#[test]
fn saving_an_inline_icon_uploads_and_records_the_public_path() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("icon-1");
    store.add(inline_icon("icon-1", "logo.png", b"png-bytes"));

    pipeline.save_element(&mut store, &id).unwrap();

    let saved = store.find(&id).unwrap();
    assert!(saved.is_saved);
    match &saved.payload {
        Payload::Icon {
            source: IconSource::Public(path),
            file_name,
        } => {
            assert_eq!(path, "/assets/icon-1-logo.png");
            assert_eq!(file_name, "logo.png");
        }
        other => panic!("expected a public icon payload, got {other:?}"),
    }
    assert!(!store.is_draft(&id));
    assert!(!store.has_unsaved_changes());
}

#[test]
fn saving_a_text_element_skips_the_asset_store() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("text-1");
    store.add(text("text-1", "headline"));

    pipeline.save_element(&mut store, &id).unwrap();

    let saved = store.find(&id).unwrap();
    assert!(saved.is_saved);
    assert!(matches!(saved.payload, Payload::Text { .. }));
    assert!(!store.has_unsaved_changes());
}

#[test]
fn save_round_trips_through_the_filesystem_backends() {
    let root = temp_dir("roundtrip");
    let mut pipeline = Pipeline::new(
        JsonConfigStore::new(root.join("elements.json")),
        overlay_editor::persist::DirAssetStore::new(root.join("assets")),
        FileCache::new(root.join("cache")),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("icon-1");
    store.add(inline_icon("icon-1", "badge.png", b"fake image bytes"));

    pipeline.save_element(&mut store, &id).unwrap();

    let saved = store.find(&id).unwrap();
    let Payload::Icon {
        source: IconSource::Public(path),
        ..
    } = &saved.payload
    else {
        panic!("expected a public icon payload");
    };
    assert_eq!(std::fs::read(path).unwrap(), b"fake image bytes");

    // A fresh pipeline over the same directory sees the saved record.
    let mut fresh = Pipeline::new(
        JsonConfigStore::new(root.join("elements.json")),
        overlay_editor::persist::DirAssetStore::new(root.join("assets")),
        FileCache::new(root.join("cache")),
    );
    let mut restored = ElementStore::new();
    fresh.rehydrate(&mut restored).unwrap();
    assert_eq!(restored.len(), 1);
    let element = restored.find(&id).unwrap();
    assert!(element.is_saved);
    assert!(!restored.has_unsaved_changes());
    assert!(!restored.can_undo());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn failed_upload_leaves_the_element_untouched() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        FailingAssetStore,
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("icon-1");
    store.add(inline_icon("icon-1", "logo.png", b"png-bytes"));
    let before = store.find(&id).unwrap().clone();

    let err = pipeline.save_element(&mut store, &id).unwrap_err();
    assert!(matches!(err, SaveError::Upload { .. }));

    let after = store.find(&id).unwrap();
    assert_eq!(after, &before);
    assert!(!after.is_saved);
    assert!(store.is_draft(&id));
    assert!(!store.is_saving(&id));
}

#[test]
fn failed_config_write_leaves_the_element_untouched() {
    let mut pipeline = Pipeline::new(
        FailingConfigStore,
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("text-1");
    store.add(text("text-1", "headline"));
    let before = store.find(&id).unwrap().clone();

    let err = pipeline.save_element(&mut store, &id).unwrap_err();
    assert!(matches!(err, SaveError::ConfigWrite { .. }));

    assert_eq!(store.find(&id).unwrap(), &before);
    assert!(store.is_draft(&id));
}

#[test]
fn save_unknown_id_is_a_no_op() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    pipeline
        .save_element(&mut store, &ElementId::from("missing"))
        .unwrap();
    assert!(store.is_empty());
}

#[test]
fn save_all_clears_every_draft() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    store.add(text("text-1", "one"));
    store.add(inline_icon("icon-1", "a.png", b"aa"));
    store.add(text("text-2", "two"));
    assert!(store.has_unsaved_changes());

    let failures = pipeline.save_all(&mut store);
    assert!(failures.is_empty());
    assert!(!store.has_unsaved_changes());
    assert!(store.snapshot().iter().all(|e| e.is_saved));
}

#[test]
fn save_all_skips_draft_entries_for_deleted_elements() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("text-1");
    store.add(text("text-1", "one"));
    pipeline.save_element(&mut store, &id).unwrap();

    // Deleting a saved element leaves a draft entry; save_all must not try
    // to save the now-missing element.
    store.delete(&id);
    assert!(store.has_unsaved_changes());

    let failures = pipeline.save_all(&mut store);
    assert!(failures.is_empty());
    assert!(store.find(&id).is_none());
}

#[test]
fn undoing_an_add_after_save_leaves_a_draft() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("text-1");
    store.add(text("text-1", "headline"));
    pipeline.save_element(&mut store, &id).unwrap();
    assert!(!store.has_unsaved_changes());

    store.undo();

    // The element is gone from the session but its durable record survives;
    // that divergence must keep the unsaved indicator lit.
    assert!(store.find(&id).is_none());
    assert!(store.is_draft(&id));
    assert!(store.has_unsaved_changes());
}

#[test]
fn delete_saved_removes_record_asset_and_element() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("icon-1");
    store.add(inline_icon("icon-1", "logo.png", b"png-bytes"));
    pipeline.save_element(&mut store, &id).unwrap();

    pipeline.delete_saved(&mut store, &id, true).unwrap();

    assert!(store.find(&id).is_none());
    assert!(!store.has_unsaved_changes());
    // A durable delete is not an editor action; it must not be undoable.
    store.undo();
    assert!(store.find(&id).is_none());
}

#[test]
fn failed_durable_delete_keeps_the_element() {
    let mut pipeline = Pipeline::new(
        FailingConfigStore,
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("text-1");
    let mut element = text("text-1", "headline");
    element.is_saved = true;
    store.rehydrate(vec![element]);

    let err = pipeline.delete_saved(&mut store, &id, false).unwrap_err();
    assert!(matches!(err, SaveError::Remove { .. }));
    assert!(store.find(&id).is_some());
}

#[test]
fn asset_delete_failure_does_not_fail_the_durable_delete() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        FailingAssetStore,
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    let id = ElementId::from("icon-1");
    let mut element = inline_icon("icon-1", "logo.png", b"");
    element.payload = Payload::Icon {
        source: IconSource::Public("/assets/icon-1-logo.png".to_owned()),
        file_name: "logo.png".to_owned(),
    };
    element.is_saved = true;
    store.rehydrate(vec![element]);

    pipeline.delete_saved(&mut store, &id, true).unwrap();
    assert!(store.find(&id).is_none());
}

#[test]
fn rehydrated_elements_carry_no_drafts_or_history() {
    let root = temp_dir("rehydrate");
    let mut config = JsonConfigStore::new(root.join("elements.json"));
    let mut a = text("text-1", "one");
    a.is_saved = true;
    let mut b = text("text-2", "two");
    b.is_saved = true;
    config.put(&a).unwrap();
    config.put(&b).unwrap();

    let mut pipeline = Pipeline::new(config, MemoryAssetStore::default(), MemoryCache::new());
    let mut store = ElementStore::new();
    pipeline.rehydrate(&mut store).unwrap();

    assert_eq!(store.len(), 2);
    assert!(!store.has_unsaved_changes());
    assert!(!store.can_undo());
    assert_eq!(store.selected(), None);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn rehydrate_surfaces_a_config_read_failure() {
    let mut pipeline = Pipeline::new(
        FailingConfigStore,
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    let mut store = ElementStore::new();
    assert!(pipeline.rehydrate(&mut store).is_err());
    assert!(store.is_empty());
}

#[test]
fn working_set_snapshot_lands_in_the_cache() {
    let root = temp_dir("snapshot");
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        FileCache::new(root.join("cache")),
    );
    let mut store = ElementStore::new();
    store.add(text("text-1", "cached"));
    store.add(text("text-2", "also cached"));
    pipeline.snapshot_to_cache(&store);

    // A second cache over the same directory sees the snapshot, drafts
    // included, and it decodes back into the working set.
    let cache = FileCache::new(root.join("cache"));
    let json = cache.get(WORKING_SET_KEY).unwrap();
    let decoded: Vec<Element> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.len(), 2);
    assert!(decoded.iter().all(|e| !e.is_saved));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn file_cache_round_trips_across_instances() {
    let root = temp_dir("file-cache");
    {
        let mut cache = FileCache::new(&root);
        cache.set(WORKING_SET_KEY, "[{\"fake\":true}]").ok();
        cache.set("overlay-editor.tutorial-seen", "1").unwrap();
    }
    let cache = FileCache::new(&root);
    assert_eq!(
        cache.get("overlay-editor.tutorial-seen").as_deref(),
        Some("1")
    );
    let mut cache = FileCache::new(&root);
    cache.remove("overlay-editor.tutorial-seen");
    assert_eq!(cache.get("overlay-editor.tutorial-seen"), None);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn tutorial_flag_is_sticky() {
    let mut pipeline = Pipeline::new(
        MemoryConfigStore::default(),
        MemoryAssetStore::default(),
        MemoryCache::new(),
    );
    assert!(!pipeline.tutorial_seen());
    pipeline.mark_tutorial_seen();
    assert!(pipeline.tutorial_seen());
}
