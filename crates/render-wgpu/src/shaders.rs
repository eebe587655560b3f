/// WGSL shader for mesh entities. Bind group contract:
/// camera = group 0 binding 0, model = group 0 binding 1,
/// lights = group 1 binding 0, material = group 2 binding 0.
pub const MESH_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct Model {
    model: mat4x4<f32>,
};

struct Light {
    // w == 0: directional (xyz is the direction the light travels),
    // w == 1: point (xyz is the world position).
    position: vec4<f32>,
    color: vec4<f32>,
};

struct Lights {
    lights: array<Light, 4>,
    count: vec4<u32>,
};

struct Material {
    base_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(0) @binding(1)
var<uniform> model: Model;

@group(1) @binding(0)
var<uniform> lights: Lights;

@group(2) @binding(0)
var<uniform> material: Material;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) world_position: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = model.model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model.model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = camera.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.world_position = world_pos.xyz;
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    var lighting = vec3<f32>(0.15, 0.15, 0.15);

    for (var i = 0u; i < lights.count.x; i = i + 1u) {
        let light = lights.lights[i];
        if (light.position.w == 0.0) {
            let dir = normalize(-light.position.xyz);
            lighting += light.color.rgb * max(dot(n, dir), 0.0);
        } else {
            let to_light = light.position.xyz - in.world_position;
            let dist_sq = max(dot(to_light, to_light), 0.0001);
            let dir = to_light * inverseSqrt(dist_sq);
            lighting += light.color.rgb * max(dot(n, dir), 0.0) / (1.0 + dist_sq);
        }
    }

    let base = material.base_color * in.color;
    return vec4<f32>(base.rgb * lighting, base.a);
}
"#;
