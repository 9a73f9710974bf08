use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use log::warn;
use thiserror::Error;

use crate::element::{ElementId, IconSource};

/// Errors that can occur while turning an icon payload into a texture.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode icon image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to read icon file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("icon has no image data")]
    Empty,
}

/// Texture cache for icon elements, keyed by `(id, payload_version)` so a
/// payload replacement naturally invalidates the old entry.
#[derive(Default)]
pub struct TextureCache {
    cache: HashMap<(ElementId, u64), TextureHandle>,
    /// Frame of last use, for pruning.
    last_used: HashMap<(ElementId, u64), u64>,
    current_frame: u64,
    max_entries: usize,
}

impl TextureCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Fetch or decode the texture for an icon payload. Decode failures are
    /// reported once and the caller falls back to placeholder rendering.
    pub fn icon_texture(
        &mut self,
        ctx: &Context,
        id: &ElementId,
        payload_version: u64,
        source: &IconSource,
    ) -> Result<TextureId, TextureError> {
        let key = (id.clone(), payload_version);
        if let Some(handle) = self.cache.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }
        self.prune_if_needed();

        let color_image = decode_icon(source)?;
        let name = format!("icon_{id}_v{payload_version}");
        let handle = ctx.load_texture(&name, color_image, TextureOptions::LINEAR);
        let texture_id = handle.id();
        self.cache.insert(key.clone(), handle);
        self.last_used.insert(key, self.current_frame);
        Ok(texture_id)
    }

    pub fn forget(&mut self, id: &ElementId) {
        self.cache.retain(|(cached, _), _| cached != id);
        self.last_used.retain(|(cached, _), _| cached != id);
    }

    fn prune_if_needed(&mut self) {
        if self.max_entries == 0 || self.cache.len() < self.max_entries {
            return;
        }
        let oldest = self
            .last_used
            .iter()
            .min_by_key(|(_, frame)| **frame)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            warn!("texture cache full, evicting {}", key.0);
            self.cache.remove(&key);
            self.last_used.remove(&key);
        }
    }
}

fn decode_icon(source: &IconSource) -> Result<ColorImage, TextureError> {
    let bytes = match source {
        IconSource::Inline(bytes) => {
            if bytes.is_empty() {
                return Err(TextureError::Empty);
            }
            bytes.clone()
        }
        IconSource::Public(path) => std::fs::read(path).map_err(|source| TextureError::Read {
            path: path.clone(),
            source,
        })?,
    };
    let decoded = image::load_from_memory(&bytes)?;
    let size = [decoded.width() as usize, decoded.height() as usize];
    let rgba = decoded.to_rgba8();
    Ok(ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}

/// Natural pixel size of an image payload, used to size newly dropped icons.
pub fn image_size(bytes: &[u8]) -> Result<(f32, f32), TextureError> {
    let decoded = image::load_from_memory(bytes)?;
    Ok((decoded.width() as f32, decoded.height() as f32))
}
