//! Developer tooling: scene inspector and hierarchy outline.
//!
//! # Invariants
//! - Tools are read-only over scene state.
//! - Field listings come from the per-component schemas, never from
//!   instance introspection.

pub mod inspector;
pub mod outline;

pub use inspector::{ComponentInfo, EntityInfo, SceneInspector, SceneSummary};
pub use outline::SceneOutline;

pub fn crate_info() -> &'static str {
    "scenery-tools v0.1.0"
}
