//! Rendering of build reports and source previews.

mod json;
mod outline;

pub use json::{to_json, JsonFormat};
pub use outline::{outline, to_outline, OutlineEntry, OutlineKind};
