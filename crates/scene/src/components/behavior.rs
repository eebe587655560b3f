use crate::component::{Component, ComponentKind};
use crate::schema::{FieldDescriptor, FieldKind};
use glam::Vec3;
use scenery_reactive::Cell;
use serde::{Deserialize, Serialize};

/// Spins the owning entity: adds `speed_deg_per_sec × dt` to its rotation
/// every update phase while the runtime is playing.
#[derive(Debug, Clone)]
pub struct RotateComponent {
    enabled: Cell<bool>,
    pub speed_deg_per_sec: Cell<Vec3>,
}

/// Persisted rotate fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotateData {
    pub enabled: bool,
    pub speed_deg_per_sec: Vec3,
}

impl Default for RotateData {
    fn default() -> Self {
        Self {
            enabled: true,
            speed_deg_per_sec: Vec3::new(0.0, 45.0, 0.0),
        }
    }
}

impl RotateComponent {
    pub fn new() -> Self {
        Self::from_data(&RotateData::default())
    }

    pub fn from_data(data: &RotateData) -> Self {
        Self {
            enabled: Cell::new(data.enabled),
            speed_deg_per_sec: Cell::new(data.speed_deg_per_sec),
        }
    }

    pub fn to_data(&self) -> RotateData {
        RotateData {
            enabled: self.enabled.copied(),
            speed_deg_per_sec: self.speed_deg_per_sec.copied(),
        }
    }
}

impl Default for RotateComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for RotateComponent {
    const KIND: ComponentKind = ComponentKind::Rotate;

    fn enabled(&self) -> &Cell<bool> {
        &self.enabled
    }

    fn enabled_mut(&mut self) -> &mut Cell<bool> {
        &mut self.enabled
    }

    fn copy_from(&mut self, other: &Self) {
        self.enabled.set(other.enabled.copied());
        self.speed_deg_per_sec.set(other.speed_deg_per_sec.copied());
    }

    fn schema() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("enabled", FieldKind::Bool),
            FieldDescriptor::new("speed_deg_per_sec", FieldKind::Vec3),
        ];
        FIELDS
    }
}

/// Moves the owning entity on a circle in the XZ plane around `target`.
/// `angle_deg` is runtime state that advances while playing; it is persisted
/// so a restored scene resumes from the saved phase.
#[derive(Debug, Clone)]
pub struct OrbitComponent {
    enabled: Cell<bool>,
    pub target: Cell<Vec3>,
    pub distance: Cell<f32>,
    pub speed_deg_per_sec: Cell<f32>,
    pub angle_deg: Cell<f32>,
}

/// Persisted orbit fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitData {
    pub enabled: bool,
    pub target: Vec3,
    pub distance: f32,
    pub speed_deg_per_sec: f32,
    pub angle_deg: f32,
}

impl Default for OrbitData {
    fn default() -> Self {
        Self {
            enabled: true,
            target: Vec3::ZERO,
            distance: 5.0,
            speed_deg_per_sec: 30.0,
            angle_deg: 0.0,
        }
    }
}

impl OrbitComponent {
    pub fn new() -> Self {
        Self::from_data(&OrbitData::default())
    }

    pub fn from_data(data: &OrbitData) -> Self {
        Self {
            enabled: Cell::new(data.enabled),
            target: Cell::new(data.target),
            distance: Cell::new(data.distance),
            speed_deg_per_sec: Cell::new(data.speed_deg_per_sec),
            angle_deg: Cell::new(data.angle_deg),
        }
    }

    pub fn to_data(&self) -> OrbitData {
        OrbitData {
            enabled: self.enabled.copied(),
            target: self.target.copied(),
            distance: self.distance.copied(),
            speed_deg_per_sec: self.speed_deg_per_sec.copied(),
            angle_deg: self.angle_deg.copied(),
        }
    }

    /// Position on the orbit circle for the current angle.
    pub fn position_at_angle(&self) -> Vec3 {
        let angle = self.angle_deg.copied().to_radians();
        self.target.copied() + Vec3::new(angle.cos(), 0.0, angle.sin()) * self.distance.copied()
    }
}

impl Default for OrbitComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for OrbitComponent {
    const KIND: ComponentKind = ComponentKind::Orbit;

    fn enabled(&self) -> &Cell<bool> {
        &self.enabled
    }

    fn enabled_mut(&mut self) -> &mut Cell<bool> {
        &mut self.enabled
    }

    fn copy_from(&mut self, other: &Self) {
        self.enabled.set(other.enabled.copied());
        self.target.set(other.target.copied());
        self.distance.set(other.distance.copied());
        self.speed_deg_per_sec.set(other.speed_deg_per_sec.copied());
        self.angle_deg.set(other.angle_deg.copied());
    }

    fn schema() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("enabled", FieldKind::Bool),
            FieldDescriptor::new("target", FieldKind::Vec3),
            FieldDescriptor::new("distance", FieldKind::Float),
            FieldDescriptor::new("speed_deg_per_sec", FieldKind::Float),
            FieldDescriptor::new("angle_deg", FieldKind::Float),
        ];
        FIELDS
    }
}
