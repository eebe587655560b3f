use crate::registry::Registry;
use crate::vertex::interleave_mesh;
use scenery_common::EntityId;
use scenery_scene::Entity;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;
use wgpu::util::DeviceExt;

/// GPU buffers owned by one entity's record.
#[derive(Debug)]
pub struct EntityBuffers {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    index: Option<(wgpu::Buffer, u32)>,
}

impl EntityBuffers {
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index(&self) -> Option<(&wgpu::Buffer, u32)> {
        self.index.as_ref().map(|(buffer, count)| (buffer, *count))
    }

    /// Explicit teardown; runs on every removal path before the record is
    /// dropped.
    fn destroy(&self) {
        self.vertex_buffer.destroy();
        if let Some((index_buffer, _)) = &self.index {
            index_buffer.destroy();
        }
    }
}

/// How an entity's geometry reaches the GPU.
#[derive(Debug)]
pub enum EntityGeometry {
    /// Per-entity buffers built from the mesh's inline vertex data.
    /// Owned exclusively by this manager.
    Owned(EntityBuffers),
    /// Reference to a shared primitive whose buffers the registry owns.
    Shared { primitive: String },
}

/// Mirrors the live entity set into GPU buffers, 1:1 with entity lifetime.
///
/// Additions and removals arrive as explicit calls from the scene layer;
/// GPU allocation is an out-of-band side effect, not a reactive listener.
/// Geometry edits after `add_entity` are not reflected until the entity is
/// removed and re-added.
pub struct RendererManager {
    device: Arc<wgpu::Device>,
    entries: BTreeMap<EntityId, EntityGeometry>,
}

impl RendererManager {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            entries: BTreeMap::new(),
        }
    }

    /// Allocate GPU resources for an entity carrying a Mesh component.
    ///
    /// Inline vertex data becomes per-entity buffers; a mesh referencing a
    /// registered primitive records the reference (the registry keeps buffer
    /// ownership). Requires a Mesh; missing mesh, empty geometry, or an
    /// unknown primitive id logs a warning and returns false. Re-adding an
    /// id replaces its record, destroying owned buffers first.
    pub fn add_entity(&mut self, entity: &Entity, registry: &Registry) -> bool {
        let id = entity.id();
        let Some(mesh) = entity.mesh() else {
            warn!(entity = %id, "add_entity requires a Mesh component");
            return false;
        };

        let geometry = if mesh.positions.is_empty() {
            match mesh.primitive.get() {
                Some(primitive_id) if registry.primitive(primitive_id).is_some() => {
                    EntityGeometry::Shared {
                        primitive: primitive_id.clone(),
                    }
                }
                Some(primitive_id) => {
                    warn!(entity = %id, primitive = %primitive_id, "unknown shared primitive");
                    return false;
                }
                None => {
                    warn!(entity = %id, "mesh has no geometry and no primitive reference");
                    return false;
                }
            }
        } else {
            let Some(data) = interleave_mesh(mesh) else {
                return false;
            };
            let vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("entity_vertices_{id}")),
                    contents: bytemuck::cast_slice(&data.vertices),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
            let index = data.indices.map(|indices| {
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("entity_indices_{id}")),
                        contents: bytemuck::cast_slice(&indices),
                        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                    });
                (buffer, indices.len() as u32)
            });
            EntityGeometry::Owned(EntityBuffers {
                vertex_buffer,
                vertex_count: data.vertices.len() as u32,
                index,
            })
        };

        if let Some(EntityGeometry::Owned(old)) = self.entries.insert(id, geometry) {
            old.destroy();
        }
        true
    }

    /// Destroy an entity's GPU resources and evict its record.
    /// Unknown ids log a warning and are a no-op.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        match self.entries.remove(&id) {
            Some(EntityGeometry::Owned(buffers)) => {
                buffers.destroy();
                true
            }
            Some(EntityGeometry::Shared { .. }) => true,
            None => {
                warn!(entity = %id, "remove_entity: no GPU resources recorded");
                false
            }
        }
    }

    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn entry(&self, id: EntityId) -> Option<&EntityGeometry> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &EntityGeometry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroy every owned buffer and drop all records.
    pub fn clear(&mut self) {
        for geometry in self.entries.values() {
            if let EntityGeometry::Owned(buffers) = geometry {
                buffers.destroy();
            }
        }
        self.entries.clear();
    }
}

impl Drop for RendererManager {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Primitive;
    use crate::test_support::test_device;
    use scenery_scene::MeshComponent;

    fn manager_and_registry() -> Option<(RendererManager, Registry)> {
        let (device, _queue) = test_device()?;
        let device = Arc::new(device);
        let layout = Registry::material_bind_group_layout(&device);
        let mut registry = Registry::new();
        registry.initialize(device.clone(), layout);
        Some((RendererManager::new(device), registry))
    }

    #[test]
    fn add_then_remove_leaves_zero_records() {
        let Some((mut manager, registry)) = manager_and_registry() else {
            return;
        };
        let mut entity = Entity::new("box");
        entity.add_component(MeshComponent::unit_cube());

        assert!(manager.add_entity(&entity, &registry));
        assert!(manager.has_entity(entity.id()));
        assert!(manager.remove_entity(entity.id()));
        assert!(!manager.has_entity(entity.id()));
        assert!(manager.is_empty());
    }

    #[test]
    fn add_without_mesh_is_rejected() {
        let Some((mut manager, registry)) = manager_and_registry() else {
            return;
        };
        let entity = Entity::new("bare");
        assert!(!manager.add_entity(&entity, &registry));
        assert!(manager.is_empty());
    }

    #[test]
    fn remove_unknown_is_noop() {
        let Some((mut manager, _registry)) = manager_and_registry() else {
            return;
        };
        assert!(!manager.remove_entity(EntityId::new()));
    }

    #[test]
    fn shared_primitive_reference_is_recorded() {
        let Some((mut manager, mut registry)) = manager_and_registry() else {
            return;
        };
        registry.add_primitive(Primitive::unit_cube());

        let mut entity = Entity::new("box");
        entity.add_component(MeshComponent::from_primitive("box", "unit_cube"));

        assert!(manager.add_entity(&entity, &registry));
        assert!(matches!(
            manager.entry(entity.id()),
            Some(EntityGeometry::Shared { primitive }) if primitive == "unit_cube"
        ));
    }

    #[test]
    fn unknown_shared_primitive_is_rejected() {
        let Some((mut manager, registry)) = manager_and_registry() else {
            return;
        };
        let mut entity = Entity::new("box");
        entity.add_component(MeshComponent::from_primitive("box", "missing"));
        assert!(!manager.add_entity(&entity, &registry));
    }
}
