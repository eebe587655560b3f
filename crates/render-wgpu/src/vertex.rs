use bytemuck::{Pod, Zeroable};
use scenery_scene::MeshComponent;
use tracing::warn;

/// Interleaved vertex layout shared by every mesh pipeline:
/// position + normal + color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

/// Synthesized when a mesh carries no normals.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
/// Synthesized when a mesh carries no colors.
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side interleaved geometry ready for buffer upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshVertexData {
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
}

/// Interleave a mesh component's attribute lists into upload-ready vertices.
///
/// Positions are required; a per-vertex normal or color missing at an index
/// (short or empty list) is synthesized from the defaults. An empty index
/// list maps to non-indexed drawing. A mesh with no positions is a
/// precondition violation: logged, `None` returned.
pub fn interleave_mesh(mesh: &MeshComponent) -> Option<MeshVertexData> {
    if mesh.positions.is_empty() {
        warn!(name = %mesh.name.get(), "mesh has no vertex positions");
        return None;
    }

    let vertices = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, position)| Vertex {
            position: position.to_array(),
            normal: mesh
                .normals
                .get(i)
                .map_or(DEFAULT_NORMAL, |n| n.to_array()),
            color: mesh.colors.get(i).map_or(DEFAULT_COLOR, |c| c.to_array()),
        })
        .collect();

    let indices = if mesh.indices.is_empty() {
        None
    } else {
        Some(mesh.indices.iter().copied().collect())
    };

    Some(MeshVertexData { vertices, indices })
}
