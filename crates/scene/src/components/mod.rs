//! Concrete component types.

mod behavior;
mod camera;
mod light;
mod mesh;
mod transform;

pub use behavior::{OrbitComponent, RotateComponent};
pub use camera::CameraComponent;
pub use light::{LightComponent, LightKind};
pub use mesh::MeshComponent;
pub use transform::TransformComponent;
