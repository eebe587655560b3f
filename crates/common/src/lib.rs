//! Shared types for the scenery editor core.
//!
//! # Invariants
//! - Entity ids are stable and never reused.
//! - Value types here carry no behavior beyond construction and formatting.

pub mod types;

pub use types::{Color, EntityId};
