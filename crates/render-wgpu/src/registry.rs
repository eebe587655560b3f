use crate::vertex::{interleave_mesh, Vertex};
use bytemuck::{Pod, Zeroable};
use scenery_scene::MeshComponent;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};
use wgpu::util::DeviceExt;

/// CPU-side shared geometry descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub id: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Primitive {
    /// Interleave a mesh component into a primitive descriptor.
    /// Returns `None` (logged) when the mesh has no positions.
    pub fn from_mesh(id: impl Into<String>, mesh: &MeshComponent) -> Option<Self> {
        let data = interleave_mesh(mesh)?;
        Some(Self {
            id: id.into(),
            vertices: data.vertices,
            indices: data.indices.unwrap_or_default(),
        })
    }

    pub fn unit_cube() -> Self {
        Self::from_mesh("unit_cube", &MeshComponent::unit_cube())
            .unwrap_or_else(|| unreachable!("unit cube always has positions"))
    }

    pub fn unit_plane() -> Self {
        Self::from_mesh("unit_plane", &MeshComponent::unit_plane())
            .unwrap_or_else(|| unreachable!("unit plane always has positions"))
    }
}

/// CPU-side material descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: String,
    pub base_color: [f32; 4],
}

impl Material {
    pub fn new(id: impl Into<String>, base_color: [f32; 4]) -> Self {
        Self {
            id: id.into(),
            base_color,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [0.8, 0.8, 0.8, 1.0])
    }
}

/// Shader-side material block (group 2, binding 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
}

/// GPU counterpart of a primitive.
#[derive(Debug)]
pub struct GpuPrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
}

impl GpuPrimitive {
    fn destroy(&self) {
        self.vertex_buffer.destroy();
        if let Some(index_buffer) = &self.index_buffer {
            index_buffer.destroy();
        }
    }
}

/// GPU counterpart of a material.
#[derive(Debug)]
pub struct GpuMaterial {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    fn destroy(&self) {
        self.uniform_buffer.destroy();
    }
}

struct GpuContext {
    device: Arc<wgpu::Device>,
    material_layout: wgpu::BindGroupLayout,
}

/// Cache mapping primitive/material ids to CPU descriptors and their GPU
/// counterparts.
///
/// Mutators called before `initialize` log an error and return false; a bad
/// call degrades a feature instead of crashing the editor. Once initialized,
/// every registered CPU descriptor has exactly one GPU counterpart, built
/// eagerly on add and destroyed on remove.
pub struct Registry {
    gpu: Option<GpuContext>,
    primitives: BTreeMap<String, Primitive>,
    gpu_primitives: BTreeMap<String, GpuPrimitive>,
    materials: BTreeMap<String, Material>,
    gpu_materials: BTreeMap<String, GpuMaterial>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            gpu: None,
            primitives: BTreeMap::new(),
            gpu_primitives: BTreeMap::new(),
            materials: BTreeMap::new(),
            gpu_materials: BTreeMap::new(),
        }
    }

    /// The bind group layout every material bind group is built against
    /// (group 2: one uniform at binding 0).
    pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }

    /// One-time device wiring. A second call logs and keeps the first.
    pub fn initialize(&mut self, device: Arc<wgpu::Device>, material_layout: wgpu::BindGroupLayout) {
        if self.gpu.is_some() {
            warn!("registry already initialized; ignoring");
            return;
        }
        self.gpu = Some(GpuContext {
            device,
            material_layout,
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    /// Register a primitive and eagerly build its GPU buffers.
    /// Re-registering an id replaces both sides (old buffers destroyed).
    pub fn add_primitive(&mut self, primitive: Primitive) -> bool {
        let Some(gpu) = &self.gpu else {
            error!(id = %primitive.id, "registry not initialized; add_primitive dropped");
            return false;
        };

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("primitive_vertices_{}", primitive.id)),
                contents: bytemuck::cast_slice(&primitive.vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let index_buffer = if primitive.indices.is_empty() {
            None
        } else {
            Some(
                gpu.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("primitive_indices_{}", primitive.id)),
                        contents: bytemuck::cast_slice(&primitive.indices),
                        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                    }),
            )
        };

        let gpu_primitive = GpuPrimitive {
            vertex_buffer,
            vertex_count: primitive.vertices.len() as u32,
            index_buffer,
            index_count: primitive.indices.len() as u32,
        };

        let id = primitive.id.clone();
        if let Some(old) = self.gpu_primitives.insert(id.clone(), gpu_primitive) {
            old.destroy();
        }
        self.primitives.insert(id, primitive);
        true
    }

    /// Tear down a primitive's GPU buffers and drop both descriptors.
    pub fn remove_primitive(&mut self, id: &str) -> bool {
        match self.gpu_primitives.remove(id) {
            Some(gpu_primitive) => {
                gpu_primitive.destroy();
                self.primitives.remove(id);
                true
            }
            None => {
                warn!(id, "remove_primitive: unknown id");
                false
            }
        }
    }

    /// Register a material and eagerly build its uniform buffer + bind group.
    pub fn add_material(&mut self, material: Material) -> bool {
        let Some(gpu) = &self.gpu else {
            error!(id = %material.id, "registry not initialized; add_material dropped");
            return false;
        };

        let uniform_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("material_uniform_{}", material.id)),
                contents: bytemuck::bytes_of(&MaterialUniform {
                    base_color: material.base_color,
                }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("material_bind_group_{}", material.id)),
            layout: &gpu.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let id = material.id.clone();
        if let Some(old) = self.gpu_materials.insert(
            id.clone(),
            GpuMaterial {
                uniform_buffer,
                bind_group,
            },
        ) {
            old.destroy();
        }
        self.materials.insert(id, material);
        true
    }

    /// Tear down a material's GPU objects and drop both descriptors.
    pub fn remove_material(&mut self, id: &str) -> bool {
        match self.gpu_materials.remove(id) {
            Some(gpu_material) => {
                gpu_material.destroy();
                self.materials.remove(id);
                true
            }
            None => {
                warn!(id, "remove_material: unknown id");
                false
            }
        }
    }

    pub fn primitive(&self, id: &str) -> Option<&Primitive> {
        let found = self.primitives.get(id);
        if found.is_none() {
            warn!(id, "primitive not found");
        }
        found
    }

    pub fn gpu_primitive(&self, id: &str) -> Option<&GpuPrimitive> {
        let found = self.gpu_primitives.get(id);
        if found.is_none() {
            warn!(id, "gpu primitive not found");
        }
        found
    }

    pub fn material(&self, id: &str) -> Option<&Material> {
        let found = self.materials.get(id);
        if found.is_none() {
            warn!(id, "material not found");
        }
        found
    }

    pub fn gpu_material(&self, id: &str) -> Option<&GpuMaterial> {
        let found = self.gpu_materials.get(id);
        if found.is_none() {
            warn!(id, "gpu material not found");
        }
        found
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn gpu_primitive_count(&self) -> usize {
        self.gpu_primitives.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn gpu_material_count(&self) -> usize {
        self.gpu_materials.len()
    }

    /// Tear down everything GPU-side and drop all descriptors.
    pub fn clear(&mut self) {
        for gpu_primitive in self.gpu_primitives.values() {
            gpu_primitive.destroy();
        }
        for gpu_material in self.gpu_materials.values() {
            gpu_material.destroy();
        }
        self.gpu_primitives.clear();
        self.gpu_materials.clear();
        self.primitives.clear();
        self.materials.clear();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_device;

    #[test]
    fn mutators_before_initialize_are_noops() {
        let mut registry = Registry::new();
        assert!(!registry.add_primitive(Primitive::unit_cube()));
        assert!(!registry.add_material(Material::default()));
        assert!(!registry.remove_primitive("unit_cube"));
        assert_eq!(registry.primitive_count(), 0);
        assert_eq!(registry.material_count(), 0);
    }

    #[test]
    fn unit_primitives_interleave() {
        let cube = Primitive::unit_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        let plane = Primitive::unit_plane();
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.indices.len(), 6);
    }

    #[test]
    fn gpu_count_tracks_cpu_count() {
        let Some((device, _queue)) = test_device() else {
            return; // no adapter available in this environment
        };
        let device = Arc::new(device);
        let layout = Registry::material_bind_group_layout(&device);
        let mut registry = Registry::new();
        registry.initialize(device, layout);

        assert!(registry.add_primitive(Primitive::unit_cube()));
        assert!(registry.add_material(Material::default()));
        assert_eq!(registry.primitive_count(), registry.gpu_primitive_count());
        assert_eq!(registry.material_count(), registry.gpu_material_count());

        assert!(registry.remove_primitive("unit_cube"));
        assert!(registry.remove_material("default"));
        assert_eq!(registry.primitive_count(), 0);
        assert_eq!(registry.gpu_primitive_count(), 0);
        assert_eq!(registry.material_count(), 0);
        assert_eq!(registry.gpu_material_count(), 0);
    }

    #[test]
    fn unknown_lookups_return_none() {
        let registry = Registry::new();
        assert!(registry.primitive("nope").is_none());
        assert!(registry.material("nope").is_none());
    }
}
