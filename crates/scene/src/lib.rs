//! Scene graph core: entities carrying components, a parent-child transform
//! hierarchy with cascading world-matrix recomputation, play-mode
//! snapshot/restore, and the frame runtime that drives lifecycle phases.
//!
//! # Invariants
//! - At most one component per kind per entity; adding replaces.
//! - World matrices are always computed parent-before-child.
//! - Snapshot state is structurally independent of live state; restore
//!   reconciles in place so live component identity (and the UI listeners
//!   attached to it) survives.
//! - Hierarchy edges live in one authoritative adjacency structure mutated
//!   only through `Scene::reparent`.

pub mod component;
pub mod components;
pub mod entity;
pub mod record;
pub mod runtime;
pub mod scene;
pub mod schema;

pub use component::{schema_for, AnyComponent, Component, ComponentKind, ComponentRecord};
pub use components::{
    CameraComponent, LightComponent, LightKind, MeshComponent, OrbitComponent, RotateComponent,
    TransformComponent,
};
pub use entity::Entity;
pub use record::{EntityRecord, ParentLink, SceneRecord};
pub use runtime::{PlayState, Runtime};
pub use scene::{Scene, SceneError};
pub use schema::{FieldDescriptor, FieldKind};
