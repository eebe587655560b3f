//! wgpu render backend for the scenery editor core.
//!
//! Mirrors scene state into GPU-resident resources: the registry caches
//! shared primitive/material descriptors with their GPU counterparts, the
//! renderer manager ties per-entity vertex/index buffers 1:1 to entity
//! lifetime, and the scene renderer reads current world matrices each frame.
//!
//! # Invariants
//! - The renderer never mutates scene state.
//! - A GPU buffer is owned by exactly one manager, which destroys it before
//!   dropping the CPU-side record, on every removal path.
//! - Registry GPU object count matches CPU descriptor count once the device
//!   is initialized.
//! - Geometry edits after `add_entity` are not picked up until the entity is
//!   removed and re-added.

pub mod manager;
pub mod registry;
pub mod renderer;
mod shaders;
pub mod vertex;

pub use manager::{EntityGeometry, RendererManager};
pub use registry::{GpuMaterial, GpuPrimitive, Material, Primitive, Registry};
pub use renderer::SceneRenderer;
pub use vertex::{interleave_mesh, MeshVertexData, Vertex};

#[cfg(test)]
pub(crate) mod test_support {
    /// Best-effort headless device. Tests that need real GPU objects skip
    /// when no adapter exists (CI containers, bare VMs).
    pub fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("scenery_test_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .ok()
    }
}
