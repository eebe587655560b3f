use crate::component::{Component, ComponentKind};
use crate::schema::{FieldDescriptor, FieldKind};
use glam::{EulerRot, Mat4, Quat, Vec3};
use scenery_reactive::Cell;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Local position/rotation/scale with derived local and world matrices.
///
/// Rotation is Euler degrees, XYZ order. The matrices are derived state:
/// `local` is the TRS composition of the fields at last recompute, `world`
/// is `parent.world × local` (or `local` at the root). Field writes mark
/// the transform dirty via listeners wired at construction; the owning
/// scene recomputes dirty subtrees synchronously on its mutation entry
/// points and once per frame for direct cell writes.
#[derive(Debug)]
pub struct TransformComponent {
    enabled: Cell<bool>,
    pub position: Cell<Vec3>,
    pub rotation: Cell<Vec3>,
    pub scale: Cell<Vec3>,
    local_matrix: Cell<Mat4>,
    world_matrix: Cell<Mat4>,
    dirty: Rc<std::cell::Cell<bool>>,
}

/// Persisted transform fields. Matrices are derived and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    pub enabled: bool,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            enabled: true,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl TransformComponent {
    pub fn new() -> Self {
        Self::from_data(&TransformData::default())
    }

    pub fn from_data(data: &TransformData) -> Self {
        let dirty = Rc::new(std::cell::Cell::new(true));

        let mut position = Cell::new(data.position);
        let mut rotation = Cell::new(data.rotation);
        let mut scale = Cell::new(data.scale);
        for cell in [&mut position, &mut rotation, &mut scale] {
            let flag = dirty.clone();
            cell.subscribe(move |_| flag.set(true));
        }

        Self {
            enabled: Cell::new(data.enabled),
            position,
            rotation,
            scale,
            local_matrix: Cell::new(Mat4::IDENTITY),
            world_matrix: Cell::new(Mat4::IDENTITY),
            dirty,
        }
    }

    pub fn to_data(&self) -> TransformData {
        TransformData {
            enabled: self.enabled.copied(),
            position: self.position.copied(),
            rotation: self.rotation.copied(),
            scale: self.scale.copied(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.local_matrix.copied()
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix.copied()
    }

    /// Observable world matrix, for UI bindings.
    pub fn world_matrix_cell(&self) -> &Cell<Mat4> {
        &self.world_matrix
    }

    pub fn world_matrix_cell_mut(&mut self) -> &mut Cell<Mat4> {
        &mut self.world_matrix
    }

    /// TRS composition of the current field values.
    pub fn compose_local(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.copied(),
            euler_deg_to_quat(self.rotation.copied()),
            self.position.copied(),
        )
    }

    /// Recompute both matrices against the given parent world matrix and
    /// clear the dirty mark. Called parent-before-child by the scene.
    pub fn refresh(&mut self, parent_world: Option<Mat4>) {
        let local = self.compose_local();
        self.local_matrix.set(local);
        let world = match parent_world {
            Some(parent) => parent * local,
            None => local,
        };
        self.world_matrix.set(world);
        self.dirty.set(false);
    }

    /// Write position/rotation/scale so that the world matrix becomes `world`
    /// under the given parent. The fields fire their listeners, marking the
    /// transform dirty for the follow-up recompute.
    pub fn set_world_matrix(&mut self, world: Mat4, parent_world: Option<Mat4>) {
        let local = match parent_world {
            Some(parent) => parent.inverse() * world,
            None => world,
        };
        let (scale, rotation, translation) = local.to_scale_rotation_translation();
        self.position.set(translation);
        self.rotation.set(quat_to_euler_deg(rotation));
        self.scale.set(scale);
    }
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep value clone: fresh cells, fresh dirty wiring, no shared listeners.
impl Clone for TransformComponent {
    fn clone(&self) -> Self {
        Self::from_data(&self.to_data())
    }
}

impl Component for TransformComponent {
    const KIND: ComponentKind = ComponentKind::Transform;

    fn enabled(&self) -> &Cell<bool> {
        &self.enabled
    }

    fn enabled_mut(&mut self) -> &mut Cell<bool> {
        &mut self.enabled
    }

    fn copy_from(&mut self, other: &Self) {
        self.enabled.set(other.enabled.copied());
        self.position.set(other.position.copied());
        self.rotation.set(other.rotation.copied());
        self.scale.set(other.scale.copied());
    }

    fn schema() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("enabled", FieldKind::Bool),
            FieldDescriptor::new("position", FieldKind::Vec3),
            FieldDescriptor::new("rotation", FieldKind::Vec3),
            FieldDescriptor::new("scale", FieldKind::Vec3),
        ];
        FIELDS
    }
}

/// Euler degrees (XYZ order) to quaternion.
pub fn euler_deg_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        euler.x.to_radians(),
        euler.y.to_radians(),
        euler.z.to_radians(),
    )
}

/// Quaternion back to Euler degrees (XYZ order). The asin domain clamp for
/// the middle axis lives inside the glam decomposition.
pub fn quat_to_euler_deg(quat: Quat) -> Vec3 {
    let (x, y, z) = quat.to_euler(EulerRot::XYZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec3_close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn field_write_marks_dirty() {
        let mut t = TransformComponent::new();
        t.refresh(None);
        assert!(!t.is_dirty());

        t.position.set(Vec3::new(1.0, 0.0, 0.0));
        assert!(t.is_dirty());
    }

    #[test]
    fn refresh_composes_trs() {
        let mut t = TransformComponent::new();
        t.position.set(Vec3::new(2.0, 3.0, 4.0));
        t.scale.set(Vec3::splat(2.0));
        t.refresh(None);

        let local = t.local_matrix();
        assert!(vec3_close(
            local.transform_point3(Vec3::ZERO),
            Vec3::new(2.0, 3.0, 4.0)
        ));
        assert!(vec3_close(
            local.transform_point3(Vec3::X),
            Vec3::new(4.0, 3.0, 4.0)
        ));
        assert_eq!(t.world_matrix(), local);
    }

    #[test]
    fn refresh_with_parent_composes_world() {
        let mut parent = TransformComponent::new();
        parent.position.set(Vec3::new(5.0, 0.0, 0.0));
        parent.refresh(None);

        let mut child = TransformComponent::new();
        child.position.set(Vec3::new(1.0, 0.0, 0.0));
        child.refresh(Some(parent.world_matrix()));

        assert!(vec3_close(
            child.world_matrix().transform_point3(Vec3::ZERO),
            Vec3::new(6.0, 0.0, 0.0)
        ));
    }

    #[test]
    fn set_world_matrix_inverts_parent() {
        let mut parent = TransformComponent::new();
        parent.position.set(Vec3::new(10.0, 0.0, 0.0));
        parent.refresh(None);

        let mut child = TransformComponent::new();
        let desired = Mat4::from_translation(Vec3::new(12.0, 1.0, 0.0));
        child.set_world_matrix(desired, Some(parent.world_matrix()));
        assert!(vec3_close(
            child.position.copied(),
            Vec3::new(2.0, 1.0, 0.0)
        ));

        child.refresh(Some(parent.world_matrix()));
        assert!(vec3_close(
            child.world_matrix().transform_point3(Vec3::ZERO),
            Vec3::new(12.0, 1.0, 0.0)
        ));
    }

    #[test]
    fn euler_round_trip() {
        let angles = Vec3::new(30.0, 45.0, -60.0);
        let back = quat_to_euler_deg(euler_deg_to_quat(angles));
        assert!(vec3_close(angles, back));
    }

    #[test]
    fn clone_is_independent() {
        let mut t = TransformComponent::new();
        t.position.set(Vec3::new(1.0, 2.0, 3.0));
        let mut copy = t.clone();

        copy.position.set(Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(*t.position.get(), Vec3::new(1.0, 2.0, 3.0));
        // Clone's dirty wiring is its own.
        assert!(copy.is_dirty());
    }

    #[test]
    fn copy_from_preserves_subscriptions() {
        let mut live = TransformComponent::new();
        live.position.subscribe(|_| {});
        let listener_count = live.position.listener_count();

        let mut snapshot = TransformComponent::new();
        snapshot.position.set(Vec3::new(4.0, 5.0, 6.0));
        live.copy_from(&snapshot);

        assert_eq!(*live.position.get(), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(live.position.listener_count(), listener_count);
    }

    #[test]
    fn data_round_trip() {
        let mut t = TransformComponent::new();
        t.position.set(Vec3::new(1.0, 2.0, 3.0));
        t.rotation.set(Vec3::new(0.0, 90.0, 0.0));
        let back = TransformComponent::from_data(&t.to_data());
        assert_eq!(back.to_data(), t.to_data());
    }
}
