//! Project persistence: versioned scene saves with integrity chaining.
//!
//! # Invariants
//! - Saves are append-only; an existing save file is never rewritten.
//! - Every payload is hash-chained in the integrity manifest.
//! - Schema version mismatches fail closed on open.
//! - Callers hand over a quiescent scene record, never one captured
//!   mid-cascade.

pub mod store;

pub use store::{IntegrityManifest, ProjectMeta, ProjectStore, StoreError};

pub fn crate_info() -> &'static str {
    "scenery-persist v0.1.0"
}
