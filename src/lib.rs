#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod element;
pub mod file_intake;
pub mod geometry;
pub mod panels;
pub mod persist;
pub mod renderer;
pub mod selection;
pub mod store;
pub mod texture_cache;
pub mod widgets;

pub use app::EditorApp;
pub use element::{Appearance, Element, ElementId, ElementKind, Geometry, IconSource, Payload, Transform};
pub use persist::{AssetStore, ConfigStore, LocalCache, Pipeline, SaveError};
pub use renderer::ElementRenderer;
pub use selection::{PageRegion, SelectionLayer};
pub use store::{ElementPatch, ElementStore, HistoryEntry, HistoryKind};
pub use widgets::Corner;
