//! Explicit per-component field schemas.
//!
//! Inspector UIs consume these descriptors instead of introspecting component
//! instances: each component kind declares an ordered list of its editable
//! fields alongside the type itself.

/// The editing widget a field maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Float,
    Vec3,
    Color,
    Text,
}

/// One editable field of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}
