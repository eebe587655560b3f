use crate::component::{AnyComponent, ComponentKind};
use crate::components::{
    CameraComponent, LightComponent, MeshComponent, OrbitComponent, RotateComponent,
    TransformComponent,
};
use crate::record::EntityRecord;
use scenery_common::EntityId;
use scenery_reactive::Cell;
use std::collections::BTreeMap;
use tracing::warn;

/// Identity plus a keyed set of components and lifecycle flags.
///
/// The id is immutable for the entity's lifetime. Components are keyed by
/// kind with at-most-one-per-kind enforced by replacement. Hierarchy edges
/// are not stored here; the owning `Scene` holds the authoritative
/// adjacency.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    pub name: Cell<String>,
    pub is_enabled: bool,
    pub is_awaked: bool,
    pub is_started: bool,
    components: BTreeMap<ComponentKind, AnyComponent>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(EntityId::new(), name)
    }

    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Cell::new(name.into()),
            is_enabled: true,
            is_awaked: false,
            is_started: false,
            components: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Store a component keyed by its kind. An existing component of the
    /// same kind is replaced (and returned), not rejected.
    pub fn add_component(&mut self, component: impl Into<AnyComponent>) -> Option<AnyComponent> {
        let component = component.into();
        self.components.insert(component.kind(), component)
    }

    pub fn component(&self, kind: ComponentKind) -> Option<&AnyComponent> {
        self.components.get(&kind)
    }

    pub fn component_mut(&mut self, kind: ComponentKind) -> Option<&mut AnyComponent> {
        self.components.get_mut(&kind)
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Remove and destroy the component of the given kind.
    /// Returns false if absent.
    pub fn remove_component(&mut self, kind: ComponentKind) -> bool {
        match self.components.remove(&kind) {
            Some(mut component) => {
                component.destroy();
                true
            }
            None => false,
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &AnyComponent> {
        self.components.values()
    }

    pub fn component_kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    // Typed accessors for the common lookups.

    pub fn transform(&self) -> Option<&TransformComponent> {
        self.component(ComponentKind::Transform)?.as_transform()
    }

    pub fn transform_mut(&mut self) -> Option<&mut TransformComponent> {
        self.component_mut(ComponentKind::Transform)?.as_transform_mut()
    }

    pub fn mesh(&self) -> Option<&MeshComponent> {
        self.component(ComponentKind::Mesh)?.as_mesh()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshComponent> {
        self.component_mut(ComponentKind::Mesh)?.as_mesh_mut()
    }

    pub fn camera(&self) -> Option<&CameraComponent> {
        self.component(ComponentKind::Camera)?.as_camera()
    }

    pub fn light(&self) -> Option<&LightComponent> {
        self.component(ComponentKind::Light)?.as_light()
    }

    pub fn orbit(&self) -> Option<&OrbitComponent> {
        self.component(ComponentKind::Orbit)?.as_orbit()
    }

    pub fn orbit_mut(&mut self) -> Option<&mut OrbitComponent> {
        self.component_mut(ComponentKind::Orbit)?.as_orbit_mut()
    }

    pub fn rotate(&self) -> Option<&RotateComponent> {
        self.component(ComponentKind::Rotate)?.as_rotate()
    }

    /// Reconcile this live entity against a snapshot of itself.
    ///
    /// Three-way diff keyed by component kind: kinds only in the snapshot
    /// are added as clones; kinds in both are `copy_from`'d so the live
    /// component instance, and every UI listener bound to it, survives;
    /// kinds only in self are removed and destroyed. A wholesale overwrite
    /// would orphan those bindings.
    pub fn restore_from(&mut self, snapshot: &Entity) {
        self.name.set(snapshot.name.cloned());
        self.is_enabled = snapshot.is_enabled;
        self.is_awaked = snapshot.is_awaked;
        self.is_started = snapshot.is_started;

        for (kind, snap_component) in &snapshot.components {
            match self.components.get_mut(kind) {
                Some(live) => live.copy_from(snap_component),
                None => {
                    self.components.insert(*kind, snap_component.clone());
                }
            }
        }

        let stale: Vec<ComponentKind> = self
            .components
            .keys()
            .filter(|kind| !snapshot.components.contains_key(*kind))
            .copied()
            .collect();
        for kind in stale {
            self.remove_component(kind);
        }
    }

    /// Destroy every component. The entity is left empty but keeps its id.
    pub fn destroy(&mut self) {
        for component in self.components.values_mut() {
            component.destroy();
        }
        self.components.clear();
    }

    pub fn to_record(&self) -> EntityRecord {
        EntityRecord {
            id: self.id,
            name: self.name.cloned(),
            is_enabled: self.is_enabled,
            is_awaked: self.is_awaked,
            is_started: self.is_started,
            components: self.components.values().map(|c| c.to_record()).collect(),
        }
    }

    /// Rebuild an entity from a record. Unknown component types are skipped
    /// with a warning; the entity is constructed with whatever resolved.
    pub fn from_record(record: &EntityRecord) -> Self {
        let mut entity = Self::with_id(record.id, record.name.clone());
        entity.is_enabled = record.is_enabled;
        entity.is_awaked = record.is_awaked;
        entity.is_started = record.is_started;
        for component_record in &record.components {
            match AnyComponent::from_record(component_record) {
                Some(component) => {
                    entity.add_component(component);
                }
                None => {
                    warn!(
                        entity = %record.id,
                        kind = %component_record.kind,
                        "entity record component dropped"
                    );
                }
            }
        }
        entity
    }
}

/// Deep clone: same id, cloned flags and name, independently cloned
/// components. No cell is shared between an entity and its clone.
impl Clone for Entity {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            is_enabled: self.is_enabled,
            is_awaked: self.is_awaked,
            is_started: self.is_started,
            components: self.components.clone(),
        }
    }
}
