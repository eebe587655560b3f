//! Component model: the closed component set and the uniform operations
//! every concrete component provides.
//!
//! The original editor discovered component capabilities by reflection; here
//! the set is closed over an enum, so dispatch is a match and the record
//! format's type-name table is a fixed two-way mapping.

use crate::components::{
    CameraComponent, LightComponent, MeshComponent, OrbitComponent, RotateComponent,
    TransformComponent,
};
use crate::schema::FieldDescriptor;
use scenery_reactive::Cell;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tag identifying a concrete component variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    Mesh,
    Camera,
    Light,
    Orbit,
    Rotate,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Transform,
        ComponentKind::Mesh,
        ComponentKind::Camera,
        ComponentKind::Light,
        ComponentKind::Orbit,
        ComponentKind::Rotate,
    ];

    /// The type name used by the external record format.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::Mesh => "Mesh",
            ComponentKind::Camera => "Camera",
            ComponentKind::Light => "Light",
            ComponentKind::Orbit => "Orbit",
            ComponentKind::Rotate => "Rotate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Operations every concrete component implements.
///
/// `copy_from` overwrites field values without replacing identity: the
/// receiver keeps its own cells and therefore its own subscriptions, which
/// is what lets a restore run under live UI bindings.
pub trait Component {
    const KIND: ComponentKind;

    fn enabled(&self) -> &Cell<bool>;
    fn enabled_mut(&mut self) -> &mut Cell<bool>;

    /// Overwrite own field values from `other`. Own listeners fire; own
    /// identity and subscriptions are untouched.
    fn copy_from(&mut self, other: &Self);

    /// Ordered field descriptors consumed by inspector UIs.
    fn schema() -> &'static [FieldDescriptor];

    /// Release non-cell resources. Idempotent; the CPU-side components hold
    /// none, the hook mirrors the GPU managers' teardown contract.
    fn destroy(&mut self) {}
}

/// Schema lookup by kind, for callers holding only a tag.
pub fn schema_for(kind: ComponentKind) -> &'static [FieldDescriptor] {
    match kind {
        ComponentKind::Transform => TransformComponent::schema(),
        ComponentKind::Mesh => MeshComponent::schema(),
        ComponentKind::Camera => CameraComponent::schema(),
        ComponentKind::Light => LightComponent::schema(),
        ComponentKind::Orbit => OrbitComponent::schema(),
        ComponentKind::Rotate => RotateComponent::schema(),
    }
}

/// Serialized component envelope: `{ "type": "...", "data": { ... } }`.
///
/// `data` stays a raw JSON value so unknown types survive far enough to be
/// skipped with a warning instead of failing the whole entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

/// A component of any concrete kind.
///
/// Cloning is deep and independent: every cell is cloned value-only, so a
/// clone never shares mutable state or listeners with its source.
#[derive(Debug, Clone)]
pub enum AnyComponent {
    Transform(TransformComponent),
    Mesh(MeshComponent),
    Camera(CameraComponent),
    Light(LightComponent),
    Orbit(OrbitComponent),
    Rotate(RotateComponent),
}

impl AnyComponent {
    pub fn kind(&self) -> ComponentKind {
        match self {
            AnyComponent::Transform(_) => ComponentKind::Transform,
            AnyComponent::Mesh(_) => ComponentKind::Mesh,
            AnyComponent::Camera(_) => ComponentKind::Camera,
            AnyComponent::Light(_) => ComponentKind::Light,
            AnyComponent::Orbit(_) => ComponentKind::Orbit,
            AnyComponent::Rotate(_) => ComponentKind::Rotate,
        }
    }

    pub fn enabled_cell(&self) -> &Cell<bool> {
        match self {
            AnyComponent::Transform(c) => c.enabled(),
            AnyComponent::Mesh(c) => c.enabled(),
            AnyComponent::Camera(c) => c.enabled(),
            AnyComponent::Light(c) => c.enabled(),
            AnyComponent::Orbit(c) => c.enabled(),
            AnyComponent::Rotate(c) => c.enabled(),
        }
    }

    pub fn enabled_cell_mut(&mut self) -> &mut Cell<bool> {
        match self {
            AnyComponent::Transform(c) => c.enabled_mut(),
            AnyComponent::Mesh(c) => c.enabled_mut(),
            AnyComponent::Camera(c) => c.enabled_mut(),
            AnyComponent::Light(c) => c.enabled_mut(),
            AnyComponent::Orbit(c) => c.enabled_mut(),
            AnyComponent::Rotate(c) => c.enabled_mut(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled_cell().get()
    }

    /// Overwrite own field values from a component of the same kind.
    ///
    /// # Panics
    /// On kind mismatch: a programmer error, surfaced immediately rather
    /// than swallowed.
    pub fn copy_from(&mut self, other: &AnyComponent) {
        match (self, other) {
            (AnyComponent::Transform(a), AnyComponent::Transform(b)) => a.copy_from(b),
            (AnyComponent::Mesh(a), AnyComponent::Mesh(b)) => a.copy_from(b),
            (AnyComponent::Camera(a), AnyComponent::Camera(b)) => a.copy_from(b),
            (AnyComponent::Light(a), AnyComponent::Light(b)) => a.copy_from(b),
            (AnyComponent::Orbit(a), AnyComponent::Orbit(b)) => a.copy_from(b),
            (AnyComponent::Rotate(a), AnyComponent::Rotate(b)) => a.copy_from(b),
            (a, b) => panic!("copy_from kind mismatch: {} vs {}", a.kind(), b.kind()),
        }
    }

    pub fn schema(&self) -> &'static [FieldDescriptor] {
        schema_for(self.kind())
    }

    pub fn destroy(&mut self) {
        match self {
            AnyComponent::Transform(c) => c.destroy(),
            AnyComponent::Mesh(c) => c.destroy(),
            AnyComponent::Camera(c) => c.destroy(),
            AnyComponent::Light(c) => c.destroy(),
            AnyComponent::Orbit(c) => c.destroy(),
            AnyComponent::Rotate(c) => c.destroy(),
        }
    }

    /// Lossless round trip of field values; listener registries and derived
    /// matrices are excluded by construction.
    pub fn to_record(&self) -> ComponentRecord {
        let data = match self {
            AnyComponent::Transform(c) => serde_json::to_value(c.to_data()),
            AnyComponent::Mesh(c) => serde_json::to_value(c.to_data()),
            AnyComponent::Camera(c) => serde_json::to_value(c.to_data()),
            AnyComponent::Light(c) => serde_json::to_value(c.to_data()),
            AnyComponent::Orbit(c) => serde_json::to_value(c.to_data()),
            AnyComponent::Rotate(c) => serde_json::to_value(c.to_data()),
        };
        ComponentRecord {
            kind: self.kind().name().to_string(),
            // Component data structs are plain serde values; encoding them
            // cannot fail.
            data: data.unwrap_or(serde_json::Value::Null),
        }
    }

    /// Rebuild a component from its record. Unknown type names and malformed
    /// payloads are skipped with a warning (data loss, not a fatal error).
    pub fn from_record(record: &ComponentRecord) -> Option<AnyComponent> {
        let Some(kind) = ComponentKind::from_name(&record.kind) else {
            warn!(kind = %record.kind, "skipping unknown component type");
            return None;
        };
        let parsed = match kind {
            ComponentKind::Transform => serde_json::from_value(record.data.clone())
                .map(|d| AnyComponent::Transform(TransformComponent::from_data(&d))),
            ComponentKind::Mesh => serde_json::from_value(record.data.clone())
                .map(|d| AnyComponent::Mesh(MeshComponent::from_data(&d))),
            ComponentKind::Camera => serde_json::from_value(record.data.clone())
                .map(|d| AnyComponent::Camera(CameraComponent::from_data(&d))),
            ComponentKind::Light => serde_json::from_value(record.data.clone())
                .map(|d| AnyComponent::Light(LightComponent::from_data(&d))),
            ComponentKind::Orbit => serde_json::from_value(record.data.clone())
                .map(|d| AnyComponent::Orbit(OrbitComponent::from_data(&d))),
            ComponentKind::Rotate => serde_json::from_value(record.data.clone())
                .map(|d| AnyComponent::Rotate(RotateComponent::from_data(&d))),
        };
        match parsed {
            Ok(component) => Some(component),
            Err(err) => {
                warn!(kind = %record.kind, %err, "skipping malformed component data");
                None
            }
        }
    }

    pub fn as_transform(&self) -> Option<&TransformComponent> {
        match self {
            AnyComponent::Transform(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_transform_mut(&mut self) -> Option<&mut TransformComponent> {
        match self {
            AnyComponent::Transform(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&MeshComponent> {
        match self {
            AnyComponent::Mesh(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshComponent> {
        match self {
            AnyComponent::Mesh(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_camera(&self) -> Option<&CameraComponent> {
        match self {
            AnyComponent::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&LightComponent> {
        match self {
            AnyComponent::Light(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_orbit(&self) -> Option<&OrbitComponent> {
        match self {
            AnyComponent::Orbit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_orbit_mut(&mut self) -> Option<&mut OrbitComponent> {
        match self {
            AnyComponent::Orbit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_rotate(&self) -> Option<&RotateComponent> {
        match self {
            AnyComponent::Rotate(c) => Some(c),
            _ => None,
        }
    }
}

impl From<TransformComponent> for AnyComponent {
    fn from(c: TransformComponent) -> Self {
        AnyComponent::Transform(c)
    }
}

impl From<MeshComponent> for AnyComponent {
    fn from(c: MeshComponent) -> Self {
        AnyComponent::Mesh(c)
    }
}

impl From<CameraComponent> for AnyComponent {
    fn from(c: CameraComponent) -> Self {
        AnyComponent::Camera(c)
    }
}

impl From<LightComponent> for AnyComponent {
    fn from(c: LightComponent) -> Self {
        AnyComponent::Light(c)
    }
}

impl From<OrbitComponent> for AnyComponent {
    fn from(c: OrbitComponent) -> Self {
        AnyComponent::Orbit(c)
    }
}

impl From<RotateComponent> for AnyComponent {
    fn from(c: RotateComponent) -> Self {
        AnyComponent::Rotate(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn kind_name_table_round_trips() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ComponentKind::from_name("Teleporter"), None);
    }

    #[test]
    fn record_round_trip_every_kind() {
        let components: Vec<AnyComponent> = vec![
            TransformComponent::new().into(),
            MeshComponent::unit_cube().into(),
            CameraComponent::new().into(),
            LightComponent::new().into(),
            OrbitComponent::new().into(),
            RotateComponent::new().into(),
        ];
        for component in components {
            let record = component.to_record();
            let back = AnyComponent::from_record(&record)
                .unwrap_or_else(|| panic!("{} failed to round trip", record.kind));
            assert_eq!(back.kind(), component.kind());
            assert_eq!(back.to_record().data, record.data);
        }
    }

    #[test]
    fn unknown_type_is_skipped() {
        let record = ComponentRecord {
            kind: "Teleporter".into(),
            data: serde_json::json!({}),
        };
        assert!(AnyComponent::from_record(&record).is_none());
    }

    #[test]
    fn malformed_data_is_skipped() {
        let record = ComponentRecord {
            kind: "Transform".into(),
            data: serde_json::json!("not an object"),
        };
        assert!(AnyComponent::from_record(&record).is_none());
    }

    #[test]
    #[should_panic(expected = "copy_from kind mismatch")]
    fn copy_from_kind_mismatch_panics() {
        let mut transform: AnyComponent = TransformComponent::new().into();
        let camera: AnyComponent = CameraComponent::new().into();
        transform.copy_from(&camera);
    }

    #[test]
    fn copy_from_same_kind_copies_values() {
        let mut any_a: AnyComponent = TransformComponent::new().into();
        let mut b = TransformComponent::new();
        b.position.set(Vec3::new(1.0, 2.0, 3.0));
        let any_b: AnyComponent = b.into();

        any_a.copy_from(&any_b);
        assert_eq!(
            *any_a.as_transform().unwrap().position.get(),
            Vec3::new(1.0, 2.0, 3.0)
        );
    }
}
