use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::element::{Element, ElementId};

use super::PersistError;

/// Durable keyed map from element id to its full attribute record. Read at
/// editor startup to rehydrate saved elements, written on save, and able to
/// delete a single entry by id.
pub trait ConfigStore {
    fn load_all(&self) -> Result<HashMap<String, Element>, PersistError>;
    fn put(&mut self, element: &Element) -> Result<(), PersistError>;
    fn remove(&mut self, id: &ElementId) -> Result<(), PersistError>;
}

/// Single pretty-printed JSON file holding the id-keyed element map.
#[derive(Debug)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<HashMap<String, Element>, PersistError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    fn write_map(&self, map: &HashMap<String, Element>) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| *p != Path::new("")) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn load_all(&self) -> Result<HashMap<String, Element>, PersistError> {
        self.read_map()
    }

    fn put(&mut self, element: &Element) -> Result<(), PersistError> {
        let mut map = self.read_map()?;
        map.insert(element.id.as_str().to_owned(), element.clone());
        self.write_map(&map)
    }

    fn remove(&mut self, id: &ElementId) -> Result<(), PersistError> {
        let mut map = self.read_map()?;
        map.remove(id.as_str());
        self.write_map(&map)
    }
}
