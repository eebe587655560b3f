use crate::component::{Component, ComponentKind};
use crate::schema::{FieldDescriptor, FieldKind};
use glam::Vec3;
use scenery_common::Color;
use scenery_reactive::{Cell, ListCell};
use serde::{Deserialize, Serialize};

/// Renderable geometry: vertex positions, optional per-vertex normals and
/// colors, and an optional index list.
///
/// Normals and colors may be shorter than positions (or empty); the GPU
/// mirroring layer synthesizes defaults per vertex when an attribute is
/// absent. An empty index list means non-indexed drawing.
///
/// Instead of inline vertex data a mesh may reference a registered shared
/// primitive by id (`primitive`); `material` likewise names a registered
/// material. Both are resolved by the GPU-facing layer, which warns and
/// falls back when an id is unknown.
#[derive(Debug, Clone)]
pub struct MeshComponent {
    enabled: Cell<bool>,
    pub name: Cell<String>,
    pub positions: ListCell<Vec3>,
    pub normals: ListCell<Vec3>,
    pub colors: ListCell<Color>,
    pub indices: ListCell<u32>,
    pub primitive: Cell<Option<String>>,
    pub material: Cell<Option<String>>,
}

/// Persisted mesh fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub enabled: bool,
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Color>,
    pub indices: Vec<u32>,
    pub primitive: Option<String>,
    pub material: Option<String>,
}

impl MeshComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            enabled: Cell::new(true),
            name: Cell::new(name.into()),
            positions: ListCell::new(),
            normals: ListCell::new(),
            colors: ListCell::new(),
            indices: ListCell::new(),
            primitive: Cell::new(None),
            material: Cell::new(None),
        }
    }

    /// Mesh that references a registered shared primitive instead of
    /// carrying inline vertex data.
    pub fn from_primitive(name: impl Into<String>, primitive: impl Into<String>) -> Self {
        let mut mesh = Self::new(name);
        mesh.primitive.set(Some(primitive.into()));
        mesh
    }

    pub fn from_data(data: &MeshData) -> Self {
        Self {
            enabled: Cell::new(data.enabled),
            name: Cell::new(data.name.clone()),
            positions: ListCell::from_vec(data.positions.clone()),
            normals: ListCell::from_vec(data.normals.clone()),
            colors: ListCell::from_vec(data.colors.clone()),
            indices: ListCell::from_vec(data.indices.clone()),
            primitive: Cell::new(data.primitive.clone()),
            material: Cell::new(data.material.clone()),
        }
    }

    pub fn to_data(&self) -> MeshData {
        MeshData {
            enabled: self.enabled.copied(),
            name: self.name.cloned(),
            positions: self.positions.iter().copied().collect(),
            normals: self.normals.iter().copied().collect(),
            colors: self.colors.iter().copied().collect(),
            indices: self.indices.iter().copied().collect(),
            primitive: self.primitive.cloned(),
            material: self.material.cloned(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Unit cube centered at the origin: 24 vertices (4 per face, so normals
    /// stay flat) and 36 indices.
    pub fn unit_cube() -> Self {
        let p = 0.5_f32;
        let faces: [(Vec3, [Vec3; 4]); 6] = [
            (
                Vec3::Z,
                [
                    Vec3::new(-p, -p, p),
                    Vec3::new(p, -p, p),
                    Vec3::new(p, p, p),
                    Vec3::new(-p, p, p),
                ],
            ),
            (
                Vec3::NEG_Z,
                [
                    Vec3::new(p, -p, -p),
                    Vec3::new(-p, -p, -p),
                    Vec3::new(-p, p, -p),
                    Vec3::new(p, p, -p),
                ],
            ),
            (
                Vec3::X,
                [
                    Vec3::new(p, -p, p),
                    Vec3::new(p, -p, -p),
                    Vec3::new(p, p, -p),
                    Vec3::new(p, p, p),
                ],
            ),
            (
                Vec3::NEG_X,
                [
                    Vec3::new(-p, -p, -p),
                    Vec3::new(-p, -p, p),
                    Vec3::new(-p, p, p),
                    Vec3::new(-p, p, -p),
                ],
            ),
            (
                Vec3::Y,
                [
                    Vec3::new(-p, p, p),
                    Vec3::new(p, p, p),
                    Vec3::new(p, p, -p),
                    Vec3::new(-p, p, -p),
                ],
            ),
            (
                Vec3::NEG_Y,
                [
                    Vec3::new(-p, -p, -p),
                    Vec3::new(p, -p, -p),
                    Vec3::new(p, -p, p),
                    Vec3::new(-p, -p, p),
                ],
            ),
        ];

        let mut mesh = Self::new("unit_cube");
        for (face, (normal, corners)) in faces.iter().enumerate() {
            let base = (face * 4) as u32;
            for corner in corners {
                mesh.positions.push(*corner);
                mesh.normals.push(*normal);
            }
            for offset in [0, 1, 2, 2, 3, 0] {
                mesh.indices.push(base + offset);
            }
        }
        mesh
    }

    /// Unit plane in XZ, facing +Y.
    pub fn unit_plane() -> Self {
        let p = 0.5_f32;
        let mut mesh = Self::new("unit_plane");
        for corner in [
            Vec3::new(-p, 0.0, -p),
            Vec3::new(p, 0.0, -p),
            Vec3::new(p, 0.0, p),
            Vec3::new(-p, 0.0, p),
        ] {
            mesh.positions.push(corner);
            mesh.normals.push(Vec3::Y);
        }
        for index in [0u32, 2, 1, 0, 3, 2] {
            mesh.indices.push(index);
        }
        mesh
    }
}

impl Component for MeshComponent {
    const KIND: ComponentKind = ComponentKind::Mesh;

    fn enabled(&self) -> &Cell<bool> {
        &self.enabled
    }

    fn enabled_mut(&mut self) -> &mut Cell<bool> {
        &mut self.enabled
    }

    fn copy_from(&mut self, other: &Self) {
        self.enabled.set(other.enabled.copied());
        self.name.set(other.name.cloned());
        self.positions.assign(other.positions.iter().copied());
        self.normals.assign(other.normals.iter().copied());
        self.colors.assign(other.colors.iter().copied());
        self.indices.assign(other.indices.iter().copied());
        self.primitive.set(other.primitive.cloned());
        self.material.set(other.material.cloned());
    }

    fn schema() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("enabled", FieldKind::Bool),
            FieldDescriptor::new("name", FieldKind::Text),
            FieldDescriptor::new("primitive", FieldKind::Text),
            FieldDescriptor::new("material", FieldKind::Text),
        ];
        FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_shape() {
        let cube = MeshComponent::unit_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.normals.len(), 24);
        assert!(cube.colors.is_empty());
    }

    #[test]
    fn unit_cube_indices_in_range() {
        let cube = MeshComponent::unit_cube();
        assert!(cube.indices.iter().all(|&i| (i as usize) < 24));
    }

    #[test]
    fn data_round_trip() {
        let cube = MeshComponent::unit_cube();
        let back = MeshComponent::from_data(&cube.to_data());
        assert_eq!(back.to_data(), cube.to_data());
    }

    #[test]
    fn copy_from_overwrites_geometry() {
        let mut live = MeshComponent::new("empty");
        let cube = MeshComponent::unit_cube();
        live.copy_from(&cube);
        assert_eq!(live.name.cloned(), "unit_cube");
        assert_eq!(live.vertex_count(), 24);
    }

    #[test]
    fn primitive_reference_round_trips() {
        let mesh = MeshComponent::from_primitive("box", "unit_cube");
        assert_eq!(mesh.vertex_count(), 0);
        let back = MeshComponent::from_data(&mesh.to_data());
        assert_eq!(back.primitive.cloned(), Some("unit_cube".to_string()));
    }

    #[test]
    fn clone_is_deep() {
        let cube = MeshComponent::unit_cube();
        let mut copy = cube.clone();
        copy.positions.clear();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(copy.vertex_count(), 0);
    }
}
