use std::collections::HashMap;
use std::path::PathBuf;

use super::PersistError;

/// Key of the working-set snapshot kept for instant reload.
pub const WORKING_SET_KEY: &str = "overlay-editor.elements";
/// Key of the flag recording that the onboarding tutorial was shown.
pub const TUTORIAL_SEEN_KEY: &str = "overlay-editor.tutorial-seen";

/// Simple key→string storage used as a fast local duplicate of the durable
/// store. Failures here must degrade to "changes not cached", never crash
/// the editor; callers log and continue.
pub trait LocalCache {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// One file per key under a cache directory; survives restarts the way
/// browser local storage would.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are dotted identifiers, safe as file names.
        self.dir.join(key)
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}
