use std::path::PathBuf;

use super::PersistError;

/// File-storage endpoint for icon payloads: accepts bytes plus a desired
/// filename and returns the public path recorded in the element's saved
/// configuration.
pub trait AssetStore {
    fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<String, PersistError>;
    fn delete(&mut self, public_path: &str) -> Result<(), PersistError>;
}

/// Directory-backed asset store; the "public path" is the written file's
/// path.
#[derive(Debug)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for DirAssetStore {
    fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<String, PersistError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(sanitize(file_name));
        std::fs::write(&path, bytes)?;
        Ok(path.display().to_string())
    }

    fn delete(&mut self, public_path: &str) -> Result<(), PersistError> {
        std::fs::remove_file(public_path)?;
        Ok(())
    }
}

/// Keep asset names to a safe character set regardless of what the original
/// file was called.
fn sanitize(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "asset".to_owned()
    } else {
        cleaned
    }
}
