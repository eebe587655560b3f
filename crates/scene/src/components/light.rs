use crate::component::{Component, ComponentKind};
use crate::schema::{FieldDescriptor, FieldKind};
use scenery_reactive::Cell;
use serde::{Deserialize, Serialize};

/// Light variant. Directional lights use the entity's world orientation;
/// point lights its world translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point,
}

/// Scene light parameters.
#[derive(Debug, Clone)]
pub struct LightComponent {
    enabled: Cell<bool>,
    pub kind: Cell<LightKind>,
    pub color: Cell<[f32; 3]>,
    pub intensity: Cell<f32>,
}

/// Persisted light fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightData {
    pub enabled: bool,
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: LightKind::Directional,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

impl LightComponent {
    pub fn new() -> Self {
        Self::from_data(&LightData::default())
    }

    pub fn from_data(data: &LightData) -> Self {
        Self {
            enabled: Cell::new(data.enabled),
            kind: Cell::new(data.kind),
            color: Cell::new(data.color),
            intensity: Cell::new(data.intensity),
        }
    }

    pub fn to_data(&self) -> LightData {
        LightData {
            enabled: self.enabled.copied(),
            kind: self.kind.copied(),
            color: self.color.copied(),
            intensity: self.intensity.copied(),
        }
    }
}

impl Default for LightComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for LightComponent {
    const KIND: ComponentKind = ComponentKind::Light;

    fn enabled(&self) -> &Cell<bool> {
        &self.enabled
    }

    fn enabled_mut(&mut self) -> &mut Cell<bool> {
        &mut self.enabled
    }

    fn copy_from(&mut self, other: &Self) {
        self.enabled.set(other.enabled.copied());
        self.kind.set(other.kind.copied());
        self.color.set(other.color.copied());
        self.intensity.set(other.intensity.copied());
    }

    fn schema() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("enabled", FieldKind::Bool),
            FieldDescriptor::new("kind", FieldKind::Text),
            FieldDescriptor::new("color", FieldKind::Color),
            FieldDescriptor::new("intensity", FieldKind::Float),
        ];
        FIELDS
    }
}
