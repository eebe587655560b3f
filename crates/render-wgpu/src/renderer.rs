use crate::manager::{EntityGeometry, RendererManager};
use crate::registry::Registry;
use crate::shaders;
use crate::vertex::Vertex;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use scenery_common::{Color, EntityId};
use scenery_scene::{Component, LightKind, Scene};
use tracing::debug;
use wgpu::util::DeviceExt;

const MAX_LIGHTS: usize = 4;
const MAX_MODELS: u64 = 1024;
/// Dynamic-offset stride for the per-model uniform (256-byte alignment).
const MODEL_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ModelUniform {
    model: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LightSlot {
    position: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LightsUniform {
    lights: [LightSlot; MAX_LIGHTS],
    count: [u32; 4],
}

/// Draws the mirrored entity set using the scene's current world matrices.
///
/// Bind group contract: camera = group 0 binding 0, per-model uniform
/// (dynamic offset) = group 0 binding 1, lights = group 1 binding 0,
/// material = group 2 binding 0.
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    lights_buffer: wgpu::Buffer,
    lights_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    default_material: crate::registry::GpuMaterial,
    depth_texture: wgpu::TextureView,
    background: Color,
    width: u32,
    height: u32,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_uniform"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("model_uniforms"),
            size: MAX_MODELS * MODEL_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lights_uniform"),
            size: std::mem::size_of::<LightsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ModelUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });
        let lights_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lights_bind_group_layout"),
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
        });
        let material_layout = Registry::material_bind_group_layout(device);

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &model_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniform>() as u64),
                    }),
                },
            ],
        });
        let lights_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lights_bind_group"),
            layout: &lights_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lights_buffer.as_entire_binding(),
            }],
        });

        let default_material = {
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("default_material_uniform"),
                contents: bytemuck::bytes_of(&crate::registry::MaterialUniform {
                    base_color: [1.0, 1.0, 1.0, 1.0],
                }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("default_material_bind_group"),
                layout: &material_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
            crate::registry::GpuMaterial {
                uniform_buffer,
                bind_group,
            }
        };

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &lights_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            pipeline,
            camera_buffer,
            model_buffer,
            frame_bind_group,
            lights_buffer,
            lights_bind_group,
            material_layout,
            default_material,
            depth_texture,
            background: Color::new(0.1, 0.1, 0.15, 1.0),
            width,
            height,
        }
    }

    /// Layout the registry's material bind groups must be built against.
    pub fn material_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    /// Render one frame into `view`, reading current world matrices, the
    /// first enabled Camera, and enabled Lights from the scene.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        manager: &RendererManager,
        registry: &Registry,
    ) {
        let aspect = self.width.max(1) as f32 / self.height.max(1) as f32;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_proj: self.view_projection(scene, aspect).to_cols_array_2d(),
            }),
        );
        queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::bytes_of(&Self::gather_lights(scene)),
        );

        // One model uniform per drawable, at 256-byte dynamic offsets.
        let drawables: Vec<(EntityId, Mat4)> = manager
            .iter()
            .filter_map(|(id, _)| {
                let Some(world) = scene.world_matrix(*id) else {
                    debug!(entity = %id, "mirrored entity missing from scene; skipped");
                    return None;
                };
                Some((*id, world))
            })
            .take(MAX_MODELS as usize)
            .collect();

        if !drawables.is_empty() {
            let mut model_bytes = vec![0u8; drawables.len() * MODEL_STRIDE as usize];
            for (i, (_, world)) in drawables.iter().enumerate() {
                let uniform = ModelUniform {
                    model: world.to_cols_array_2d(),
                };
                let offset = i * MODEL_STRIDE as usize;
                model_bytes[offset..offset + std::mem::size_of::<ModelUniform>()]
                    .copy_from_slice(bytemuck::bytes_of(&uniform));
            }
            queue.write_buffer(&self.model_buffer, 0, &model_bytes);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: self.background.r as f64,
                            g: self.background.g as f64,
                            b: self.background.b as f64,
                            a: self.background.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(1, &self.lights_bind_group, &[]);

            for (i, (id, _)) in drawables.iter().enumerate() {
                let offset = (i as u64 * MODEL_STRIDE) as u32;
                pass.set_bind_group(0, &self.frame_bind_group, &[offset]);

                let material_bind_group = scene
                    .get_entity(*id)
                    .and_then(|e| e.mesh())
                    .and_then(|m| m.material.get().as_deref())
                    .and_then(|material_id| registry.gpu_material(material_id))
                    .map_or(&self.default_material.bind_group, |m| &m.bind_group);
                pass.set_bind_group(2, material_bind_group, &[]);

                match manager.entry(*id) {
                    Some(EntityGeometry::Owned(buffers)) => {
                        pass.set_vertex_buffer(0, buffers.vertex_buffer().slice(..));
                        match buffers.index() {
                            Some((index_buffer, index_count)) => {
                                pass.set_index_buffer(
                                    index_buffer.slice(..),
                                    wgpu::IndexFormat::Uint32,
                                );
                                pass.draw_indexed(0..index_count, 0, 0..1);
                            }
                            None => pass.draw(0..buffers.vertex_count(), 0..1),
                        }
                    }
                    Some(EntityGeometry::Shared { primitive }) => {
                        let Some(gpu_primitive) = registry.gpu_primitive(primitive) else {
                            continue;
                        };
                        pass.set_vertex_buffer(0, gpu_primitive.vertex_buffer.slice(..));
                        match &gpu_primitive.index_buffer {
                            Some(index_buffer) => {
                                pass.set_index_buffer(
                                    index_buffer.slice(..),
                                    wgpu::IndexFormat::Uint32,
                                );
                                pass.draw_indexed(0..gpu_primitive.index_count, 0, 0..1);
                            }
                            None => pass.draw(0..gpu_primitive.vertex_count, 0..1),
                        }
                    }
                    None => {}
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// View-projection from the first enabled Camera component, or a default
    /// editor view when the scene has none.
    fn view_projection(&self, scene: &Scene, aspect: f32) -> Mat4 {
        for (_, entity) in scene.iter_entities() {
            if !entity.is_enabled {
                continue;
            }
            let Some(camera) = entity.camera() else {
                continue;
            };
            if !*camera.enabled().get() {
                continue;
            }
            let Some(transform) = entity.transform() else {
                continue;
            };
            return camera.projection_matrix(aspect) * transform.world_matrix().inverse();
        }

        let proj = Mat4::perspective_rh(60.0_f32.to_radians(), aspect, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::new(6.0, 6.0, 10.0), Vec3::ZERO, Vec3::Y);
        proj * view
    }

    fn gather_lights(scene: &Scene) -> LightsUniform {
        let mut uniform = LightsUniform {
            lights: [LightSlot {
                position: [0.0; 4],
                color: [0.0; 4],
            }; MAX_LIGHTS],
            count: [0; 4],
        };

        let mut slot = 0;
        for (_, entity) in scene.iter_entities() {
            if slot >= MAX_LIGHTS {
                break;
            }
            if !entity.is_enabled {
                continue;
            }
            let Some(light) = entity.light() else {
                continue;
            };
            if !*light.enabled().get() {
                continue;
            }
            let world = entity
                .transform()
                .map_or(Mat4::IDENTITY, |t| t.world_matrix());
            let color = light.color.copied();
            let intensity = light.intensity.copied();

            uniform.lights[slot] = match light.kind.copied() {
                LightKind::Directional => {
                    let direction = world.transform_vector3(Vec3::NEG_Z).normalize_or_zero();
                    LightSlot {
                        position: [direction.x, direction.y, direction.z, 0.0],
                        color: [
                            color[0] * intensity,
                            color[1] * intensity,
                            color[2] * intensity,
                            1.0,
                        ],
                    }
                }
                LightKind::Point => {
                    let position = world.transform_point3(Vec3::ZERO);
                    LightSlot {
                        position: [position.x, position.y, position.z, 1.0],
                        color: [
                            color[0] * intensity,
                            color[1] * intensity,
                            color[2] * intensity,
                            1.0,
                        ],
                    }
                }
            };
            slot += 1;
        }
        uniform.count[0] = slot as u32;
        uniform
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Material, Primitive};
    use crate::test_support::test_device;
    use scenery_scene::{LightComponent, MeshComponent};
    use std::sync::Arc;

    #[test]
    fn offscreen_frame_renders() {
        let Some((device, queue)) = test_device() else {
            return; // no adapter available in this environment
        };
        let device = Arc::new(device);

        let mut renderer = SceneRenderer::new(&device, wgpu::TextureFormat::Rgba8Unorm, 64, 64);
        renderer.set_background(Color::BLACK);

        let mut registry = Registry::new();
        registry.initialize(
            device.clone(),
            Registry::material_bind_group_layout(&device),
        );
        registry.add_primitive(Primitive::unit_cube());
        registry.add_material(Material::new("red", [1.0, 0.0, 0.0, 1.0]));

        let mut scene = Scene::new();
        let cube = scene.create_entity("cube");
        scene
            .get_entity_mut(cube)
            .unwrap()
            .add_component(MeshComponent::unit_cube());
        let light = scene.create_entity("sun");
        scene
            .get_entity_mut(light)
            .unwrap()
            .add_component(LightComponent::new());

        let mut manager = RendererManager::new(device.clone());
        assert!(manager.add_entity(scene.get_entity(cube).unwrap(), &registry));

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_target"),
            size: wgpu::Extent3d {
                width: 64,
                height: 64,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&Default::default());

        renderer.render(&device, &queue, &view, &scene, &manager, &registry);
        let _ = device.poll(wgpu::Maintain::Wait);
    }
}
