use crate::component::{Component, ComponentKind};
use crate::schema::{FieldDescriptor, FieldKind};
use glam::Mat4;
use scenery_common::Color;
use scenery_reactive::Cell;
use serde::{Deserialize, Serialize};

/// Perspective camera parameters. The view matrix is the inverse of the
/// owning entity's world matrix; only projection lives here.
#[derive(Debug, Clone)]
pub struct CameraComponent {
    enabled: Cell<bool>,
    pub fov_degrees: Cell<f32>,
    pub near: Cell<f32>,
    pub far: Cell<f32>,
    pub clear_color: Cell<Color>,
}

/// Persisted camera fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    pub enabled: bool,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub clear_color: Color,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            enabled: true,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            clear_color: Color::new(0.1, 0.1, 0.15, 1.0),
        }
    }
}

impl CameraComponent {
    pub fn new() -> Self {
        Self::from_data(&CameraData::default())
    }

    pub fn from_data(data: &CameraData) -> Self {
        Self {
            enabled: Cell::new(data.enabled),
            fov_degrees: Cell::new(data.fov_degrees),
            near: Cell::new(data.near),
            far: Cell::new(data.far),
            clear_color: Cell::new(data.clear_color),
        }
    }

    pub fn to_data(&self) -> CameraData {
        CameraData {
            enabled: self.enabled.copied(),
            fov_degrees: self.fov_degrees.copied(),
            near: self.near.copied(),
            far: self.far.copied(),
            clear_color: self.clear_color.copied(),
        }
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.copied().to_radians(),
            aspect,
            self.near.copied(),
            self.far.copied(),
        )
    }
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for CameraComponent {
    const KIND: ComponentKind = ComponentKind::Camera;

    fn enabled(&self) -> &Cell<bool> {
        &self.enabled
    }

    fn enabled_mut(&mut self) -> &mut Cell<bool> {
        &mut self.enabled
    }

    fn copy_from(&mut self, other: &Self) {
        self.enabled.set(other.enabled.copied());
        self.fov_degrees.set(other.fov_degrees.copied());
        self.near.set(other.near.copied());
        self.far.set(other.far.copied());
        self.clear_color.set(other.clear_color.copied());
    }

    fn schema() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("enabled", FieldKind::Bool),
            FieldDescriptor::new("fov_degrees", FieldKind::Float),
            FieldDescriptor::new("near", FieldKind::Float),
            FieldDescriptor::new("far", FieldKind::Float),
            FieldDescriptor::new("clear_color", FieldKind::Color),
        ];
        FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_finite() {
        let camera = CameraComponent::new();
        let proj = camera.projection_matrix(16.0 / 9.0);
        assert!(proj.col(0).x.is_finite());
        assert!(proj.col(0).x > 0.0);
    }

    #[test]
    fn data_round_trip() {
        let mut camera = CameraComponent::new();
        camera.fov_degrees.set(90.0);
        let back = CameraComponent::from_data(&camera.to_data());
        assert_eq!(back.to_data(), camera.to_data());
    }
}
