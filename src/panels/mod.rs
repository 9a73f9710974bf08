pub mod inspector;
pub mod toolbar;

pub use inspector::Inspector;
pub use toolbar::{Toolbar, ToolbarAction};
