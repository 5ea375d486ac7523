/// WGSL shader for sphere meshes: flat color modulated by an optional
/// equirectangular texture. Shared by the filled and wireframe pipelines.
pub const MESH_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    // x = width px, y = height px, z = pixel ratio
    viewport: vec4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    color: vec4<f32>,
    // x = textured, y = point size scale, z = view height
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> object: Object;
@group(1) @binding(1) var color_texture: texture_2d<f32>;
@group(1) @binding(2) var color_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_mesh(vertex: VertexInput) -> VertexOutput {
    let world_pos = object.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world_pos;
    out.world_normal = normalize((object.model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_mesh(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(color_texture, color_sampler, in.uv);
    let base = select(vec3<f32>(1.0), texel.rgb, object.params.x > 0.5);
    return vec4<f32>(object.color.rgb * base, 1.0);
}

@fragment
fn fs_wire(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(0.35, 0.55, 1.0, 1.0);
}
"#;

/// WGSL shader for size-attenuated point sprites drawn as instanced quads.
pub const POINTS_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    viewport: vec4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> object: Object;

struct InstanceInput {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_points(@builtin(vertex_index) index: u32, instance: InstanceInput) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[index];
    var clip = camera.view_proj * object.model * vec4<f32>(instance.position, 1.0);

    // Size shrinks with distance and grows with the viewport height.
    let size_px = instance.size * object.params.y * object.params.z * camera.viewport.z
        / max(clip.w, 0.0001);
    let half_px = max(size_px, 1.0) * 0.5;
    clip = vec4<f32>(clip.xy + corner * half_px * 2.0 / camera.viewport.xy * clip.w, clip.zw);

    var out: VertexOutput;
    out.clip_position = clip;
    out.corner = corner;
    out.color = instance.color.rgb;
    return out;
}

@fragment
fn fs_points(in: VertexOutput) -> @location(0) vec4<f32> {
    let d = length(in.corner);
    if d > 1.0 {
        discard;
    }
    let falloff = 1.0 - smoothstep(0.3, 1.0, d);
    return vec4<f32>(in.color * falloff, falloff);
}
"#;
