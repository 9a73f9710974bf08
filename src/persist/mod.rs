//! Persistence pipeline: asset upload, durable element configuration, and
//! the local working-set cache.
//!
//! A save either completes fully (Uploading → Writing Config → Applying →
//! Saved) or leaves the in-memory element exactly as it was; there is no
//! partial-success state for a single element.

use log::{info, warn};
use thiserror::Error;

use crate::element::{Element, ElementId, IconSource, Payload};
use crate::store::ElementStore;

mod asset_store;
mod config_store;
mod local_cache;

pub use asset_store::{AssetStore, DirAssetStore};
pub use config_store::{ConfigStore, JsonConfigStore};
pub use local_cache::{FileCache, LocalCache, MemoryCache, TUTORIAL_SEEN_KEY, WORKING_SET_KEY};

/// Low-level storage failures.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode element data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A failed save or durable delete, surfaced to the user with the element it
/// concerns. The element's in-memory state is unchanged when one of these is
/// returned.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to upload {name}: {source}")]
    Upload {
        name: String,
        #[source]
        source: PersistError,
    },

    #[error("failed to write configuration for {id}: {source}")]
    ConfigWrite {
        id: ElementId,
        #[source]
        source: PersistError,
    },

    #[error("failed to remove durable record for {id}: {source}")]
    Remove {
        id: ElementId,
        #[source]
        source: PersistError,
    },
}

/// Wires the three storage seams together and drives the per-element save
/// state machine.
#[derive(Debug)]
pub struct Pipeline<C, A, L> {
    config: C,
    assets: A,
    cache: L,
}

impl<C: ConfigStore, A: AssetStore, L: LocalCache> Pipeline<C, A, L> {
    pub fn new(config: C, assets: A, cache: L) -> Self {
        Self {
            config,
            assets,
            cache,
        }
    }

    /// Save one element. Unknown ids are a no-op.
    pub fn save_element(
        &mut self,
        store: &mut ElementStore,
        id: &ElementId,
    ) -> Result<(), SaveError> {
        let Some(element) = store.find(id).cloned() else {
            return Ok(());
        };
        store.set_saving(id, true);
        let result = self.save_inner(element);
        store.set_saving(id, false);

        let payload = result?;
        store.mark_saved(id, payload);
        info!("saved element {id}");
        self.snapshot_to_cache(store);
        Ok(())
    }

    fn save_inner(&mut self, mut record: Element) -> Result<Payload, SaveError> {
        // Uploading: inline icon bytes go to the asset store first. A failed
        // upload aborts the whole save; falling back to recording the inline
        // blob would defeat durability.
        let payload = match record.payload.clone() {
            Payload::Icon {
                source: IconSource::Inline(bytes),
                file_name,
            } if !bytes.is_empty() => {
                let name = asset_name(&record.id, &file_name);
                let public_path = self
                    .assets
                    .upload(&name, &bytes)
                    .map_err(|source| SaveError::Upload { name, source })?;
                Payload::Icon {
                    source: IconSource::Public(public_path),
                    file_name,
                }
            }
            other => other,
        };

        // Writing config: the durable record carries the uploaded reference,
        // never inline bytes.
        record.payload = payload.clone();
        record.is_saved = true;
        self.config
            .put(&record)
            .map_err(|source| SaveError::ConfigWrite {
                id: record.id.clone(),
                source,
            })?;

        Ok(payload)
    }

    /// Save every element currently in the draft set, collecting per-element
    /// failures. Draft entries for deleted elements are skipped; their
    /// durable removal is an explicit separate operation.
    pub fn save_all(&mut self, store: &mut ElementStore) -> Vec<(ElementId, SaveError)> {
        let mut failures = Vec::new();
        for id in store.draft_ids() {
            if store.find(&id).is_none() {
                continue;
            }
            if let Err(err) = self.save_element(store, &id) {
                warn!("save failed for {id}: {err}");
                failures.push((id, err));
            }
        }
        failures
    }

    /// Remove a previously saved element's durable record, then drop it from
    /// the store. If the durable removal fails the in-memory element is kept,
    /// so the user never loses sight of a record that still exists remotely.
    pub fn delete_saved(
        &mut self,
        store: &mut ElementStore,
        id: &ElementId,
        remove_asset: bool,
    ) -> Result<(), SaveError> {
        let Some(element) = store.find(id).cloned() else {
            return Ok(());
        };
        self.config
            .remove(id)
            .map_err(|source| SaveError::Remove {
                id: id.clone(),
                source,
            })?;

        if remove_asset {
            if let Payload::Icon {
                source: IconSource::Public(path),
                ..
            } = &element.payload
            {
                // Asset removal is best-effort; the record is already gone.
                if let Err(err) = self.assets.delete(path) {
                    warn!("asset delete failed for {path}: {err}");
                }
            }
        }

        store.remove_unrecorded(id);
        info!("deleted saved element {id}");
        self.snapshot_to_cache(store);
        Ok(())
    }

    /// Load saved elements into the store at startup.
    pub fn rehydrate(&mut self, store: &mut ElementStore) -> Result<(), PersistError> {
        let records = self.config.load_all()?;
        let count = records.len();
        store.rehydrate(records.into_values().collect());
        if count > 0 {
            info!("rehydrated {count} saved element(s)");
        }
        self.snapshot_to_cache(store);
        Ok(())
    }

    /// Duplicate the working set into the local cache. Quota or
    /// serialization failures degrade to a logged warning; the durable save
    /// path does not depend on this.
    pub fn snapshot_to_cache(&mut self, store: &ElementStore) {
        let snapshot = store.snapshot();
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(err) = self.cache.set(WORKING_SET_KEY, &json) {
                    warn!("working set not cached: {err}");
                }
            }
            Err(err) => warn!("working set not cached: {err}"),
        }
    }

    pub fn tutorial_seen(&self) -> bool {
        self.cache.get(TUTORIAL_SEEN_KEY).is_some()
    }

    pub fn mark_tutorial_seen(&mut self) {
        if let Err(err) = self.cache.set(TUTORIAL_SEEN_KEY, "1") {
            warn!("tutorial flag not cached: {err}");
        }
    }
}

fn asset_name(id: &ElementId, file_name: &str) -> String {
    if file_name.is_empty() {
        format!("{id}.bin")
    } else {
        format!("{id}-{file_name}")
    }
}
