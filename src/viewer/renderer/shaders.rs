//! Embedded WGSL for the forward, shadow and full-screen passes.
//!
//! The mesh and skybox modules each carry two fragment entry points:
//! the `_gbuf` variants render into the offscreen HDR + normals pair
//! and leave color linear, the plain variants write straight to the
//! viewport and apply exposure themselves.

pub const FORWARD_SHADER: &str = r#"
const PI: f32 = 3.141592653589793;

struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    position: vec3<f32>,
}

struct Light {
    direction: vec3<f32>,
    intensity: f32,
    color: vec3<f32>,
    env_intensity: f32,
    exposure: f32,
}

struct Model {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    base_color: vec4<f32>,
}

// params packs (depth_bias, normal_bias, soft, enabled).
struct Shadow {
    light_view_proj: mat4x4<f32>,
    params: vec4<f32>,
}

struct EnvParams {
    intensity: f32,
    rotation: f32,
    enabled: f32,
    _pad: f32,
}

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> light: Light;
@group(1) @binding(0) var<uniform> model: Model;
@group(2) @binding(0) var shadow_map: texture_depth_2d;
@group(2) @binding(1) var shadow_sampler: sampler_comparison;
@group(2) @binding(2) var<uniform> shadow: Shadow;
@group(3) @binding(0) var env_map: texture_2d<f32>;
@group(3) @binding(1) var env_sampler: sampler;
@group(3) @binding(2) var<uniform> env: EnvParams;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
}

@vertex
fn vs_mesh(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_pos = model.model * vec4<f32>(in.position, 1.0);
    out.clip_position = camera.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = (model.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    return out;
}

fn dir_to_equirect_uv(dir: vec3<f32>, rotation: f32) -> vec2<f32> {
    let d = normalize(dir);
    let phi = atan2(d.z, d.x) + rotation;
    let theta = acos(clamp(d.y, -1.0, 1.0));
    let u = (phi + PI) / (2.0 * PI);
    let v = theta / PI;
    return vec2<f32>(u, v);
}

// Shadow map visibility, 1.0 = fully lit.
fn sample_shadow(world_pos: vec3<f32>, normal: vec3<f32>) -> f32 {
    if shadow.params.w < 0.5 {
        return 1.0;
    }

    // Offset the receiver along its normal before projecting to
    // light space, then transform to [0, 1] texture coordinates.
    let receiver = world_pos + normal * shadow.params.y;
    let light_space = shadow.light_view_proj * vec4<f32>(receiver, 1.0);
    let proj_coords = light_space.xyz / light_space.w;
    let shadow_uv = proj_coords.xy * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5);

    if shadow_uv.x < 0.0 || shadow_uv.x > 1.0 || shadow_uv.y < 0.0 || shadow_uv.y > 1.0 {
        return 1.0;
    }
    if proj_coords.z < 0.0 || proj_coords.z > 1.0 {
        return 1.0;
    }

    let current_depth = proj_coords.z - shadow.params.x;

    // Hard shadows take a single tap.
    if shadow.params.z < 0.5 {
        return textureSampleCompareLevel(shadow_map, shadow_sampler, shadow_uv, current_depth);
    }

    // 3x3 PCF kernel
    let texel_size = 1.0 / f32(textureDimensions(shadow_map).x);
    var sum = 0.0;
    for (var y = -1; y <= 1; y = y + 1) {
        for (var x = -1; x <= 1; x = x + 1) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel_size;
            sum = sum + textureSampleCompareLevel(
                shadow_map,
                shadow_sampler,
                shadow_uv + offset,
                current_depth,
            );
        }
    }
    return sum / 9.0;
}

fn shade(world_pos: vec3<f32>, raw_normal: vec3<f32>) -> vec3<f32> {
    let n = normalize(raw_normal);
    let l = normalize(-light.direction);
    let v = normalize(camera.position - world_pos);
    let h = normalize(l + v);

    let ndotl = max(dot(n, l), 0.0);
    let spec = pow(max(dot(n, h), 0.0), 32.0) * 0.25;
    let visibility = sample_shadow(world_pos, n);
    let direct = light.color * light.intensity * (ndotl + spec * ndotl) * visibility;

    // Equirect lookup along the normal stands in for diffuse IBL.
    var ambient = vec3<f32>(0.025);
    if env.enabled > 0.5 {
        let env_uv = dir_to_equirect_uv(n, env.rotation);
        ambient = textureSample(env_map, env_sampler, env_uv).rgb * light.env_intensity;
    }

    return model.base_color.rgb * (direct + ambient);
}

@fragment
fn fs_mesh(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = shade(in.world_pos, in.world_normal);
    return vec4<f32>(color * light.exposure, model.base_color.a);
}

struct GbufOutput {
    @location(0) color: vec4<f32>,
    @location(1) normal: vec4<f32>,
}

@fragment
fn fs_mesh_gbuf(in: VertexOutput) -> GbufOutput {
    var out: GbufOutput;
    let color = shade(in.world_pos, in.world_normal);
    out.color = vec4<f32>(color, model.base_color.a);
    let view_normal = normalize((camera.view * vec4<f32>(normalize(in.world_normal), 0.0)).xyz);
    out.normal = vec4<f32>(view_normal * 0.5 + vec3<f32>(0.5), 1.0);
    return out;
}
"#;

pub const SKYBOX_SHADER: &str = r#"
// Skybox - inverted sphere with equirectangular HDR texture

const PI: f32 = 3.141592653589793;

struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    position: vec3<f32>,
}

struct Light {
    direction: vec3<f32>,
    intensity: f32,
    color: vec3<f32>,
    env_intensity: f32,
    exposure: f32,
}

struct EnvParams {
    intensity: f32,
    rotation: f32,
    enabled: f32,
    _pad: f32,
}

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> light: Light;
@group(1) @binding(0) var env_map: texture_2d<f32>;
@group(1) @binding(1) var env_sampler: sampler;
@group(1) @binding(2) var<uniform> env: EnvParams;

struct VertexInput {
    @location(0) position: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_dir: vec3<f32>,
}

@vertex
fn vs_skybox(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    // Center the sphere at the camera so the sky never parallaxes.
    let world_pos = in.position + camera.position;
    out.position = camera.view_proj * vec4<f32>(world_pos, 1.0);
    out.world_dir = in.position;
    return out;
}

fn dir_to_equirect_uv(dir: vec3<f32>, rotation: f32) -> vec2<f32> {
    let d = normalize(dir);
    let phi = atan2(d.z, d.x) + rotation;
    let theta = acos(clamp(d.y, -1.0, 1.0));
    let u = (phi + PI) / (2.0 * PI);
    let v = theta / PI;
    return vec2<f32>(u, v);
}

fn sky_color(world_dir: vec3<f32>) -> vec3<f32> {
    let dir = normalize(world_dir);
    let uv = dir_to_equirect_uv(dir, env.rotation);
    return textureSample(env_map, env_sampler, uv).rgb * env.intensity;
}

@fragment
fn fs_skybox(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(sky_color(in.world_dir) * light.exposure, 1.0);
}

struct GbufOutput {
    @location(0) color: vec4<f32>,
    @location(1) normal: vec4<f32>,
}

@fragment
fn fs_skybox_gbuf(in: VertexOutput) -> GbufOutput {
    var out: GbufOutput;
    out.color = vec4<f32>(sky_color(in.world_dir), 1.0);
    // Background pixels face the viewer; the occlusion pass masks
    // them out by depth anyway.
    out.normal = vec4<f32>(0.5, 0.5, 1.0, 0.0);
    return out;
}
"#;

pub const SHADOW_SHADER: &str = r#"
// Shadow depth pass - vertex shader only

struct Shadow {
    light_view_proj: mat4x4<f32>,
    params: vec4<f32>,
}

struct Model {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    base_color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> shadow: Shadow;
@group(1) @binding(0) var<uniform> model: Model;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_shadow(in: VertexInput) -> @builtin(position) vec4<f32> {
    let world_pos = model.model * vec4<f32>(in.position, 1.0);
    return shadow.light_view_proj * world_pos;
}
"#;

pub const AO_SHADER: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> VsOut {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0)
    );
    let pos = positions[index];
    var out: VsOut;
    out.pos = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>(pos.x * 0.5 + 0.5, 1.0 - (pos.y * 0.5 + 0.5));
    return out;
}

struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    position: vec3<f32>,
}

struct AoParams {
    strength: vec4<f32>,
}

@group(0) @binding(0) var normals_tex: texture_2d<f32>;
@group(0) @binding(1) var depth_tex: texture_depth_2d;
@group(0) @binding(2) var samp: sampler;
@group(0) @binding(3) var<uniform> params: AoParams;
@group(0) @binding(4) var<uniform> camera: Camera;

fn reconstruct_view_pos(uv: vec2<f32>, depth: f32) -> vec3<f32> {
    let ndc = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, depth, 1.0);
    let world = camera.inv_view_proj * ndc;
    let world_pos = world.xyz / world.w;
    let view_pos4 = camera.view * vec4<f32>(world_pos, 1.0);
    return view_pos4.xyz;
}

@fragment
fn fs_ao(in: VsOut) -> @location(0) vec4<f32> {
    let uv = in.uv;
    let n = textureSample(normals_tex, samp, uv).xyz * 2.0 - vec3<f32>(1.0);
    let depth = textureSample(depth_tex, samp, uv);
    let p = reconstruct_view_pos(uv, depth);

    // Four taps around the pixel in screen space; a neighbour much
    // closer to the camera counts as an occluder.
    let radius = 0.002 * clamp(abs(p.z), 0.5, 10.0);
    let offsets = array<vec2<f32>, 4>(
        vec2<f32>(radius, 0.0),
        vec2<f32>(-radius, 0.0),
        vec2<f32>(0.0, radius),
        vec2<f32>(0.0, -radius)
    );
    var occlusion = 0.0;
    for (var i: u32 = 0u; i < 4u; i = i + 1u) {
        let duv = offsets[i];
        let sample_depth = textureSample(depth_tex, samp, uv + duv);
        let sample_pos = reconstruct_view_pos(uv + duv, sample_depth);
        let delta = sample_pos.z - p.z;
        if delta < -0.02 {
            occlusion = occlusion + 0.25;
        }
    }

    // Background (far plane) keeps full visibility.
    if depth >= 0.999 {
        return vec4<f32>(1.0, 1.0, 1.0, 1.0);
    }

    // The normal damps occlusion on grazing surfaces.
    let ndotv = max(n.z, 0.0);
    let ao = 1.0 - occlusion * params.strength.x * (1.0 - ndotv);
    return vec4<f32>(ao, ao, ao, 1.0);
}
"#;

pub const AO_BLUR_SHADER: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> VsOut {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0)
    );
    let pos = positions[index];
    var out: VsOut;
    out.pos = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>(pos.x * 0.5 + 0.5, 1.0 - (pos.y * 0.5 + 0.5));
    return out;
}

@group(0) @binding(0) var occlusion_tex: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;

struct BlurParams {
    direction: vec2<f32>,
    _pad: vec2<f32>,
}
@group(0) @binding(2) var<uniform> blur: BlurParams;

@fragment
fn fs_blur(in: VsOut) -> @location(0) vec4<f32> {
    let uv = in.uv;
    let dims = vec2<f32>(textureDimensions(occlusion_tex));
    let texel = blur.direction / dims;

    let c0 = textureSample(occlusion_tex, samp, uv).r * 0.4;
    let c1 = textureSample(occlusion_tex, samp, uv + texel).r * 0.15;
    let c2 = textureSample(occlusion_tex, samp, uv - texel).r * 0.15;
    let c3 = textureSample(occlusion_tex, samp, uv + texel * 2.0).r * 0.15;
    let c4 = textureSample(occlusion_tex, samp, uv - texel * 2.0).r * 0.15;
    let blurred = c0 + c1 + c2 + c3 + c4;
    return vec4<f32>(blurred, blurred, blurred, 1.0);
}
"#;

pub const COMPOSITE_SHADER: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> VsOut {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0)
    );
    let pos = positions[index];
    var out: VsOut;
    out.pos = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>(pos.x * 0.5 + 0.5, 1.0 - (pos.y * 0.5 + 0.5));
    return out;
}

struct CompositeParams {
    exposure: f32,
    occlusion: f32,
    edge_smoothing: f32,
    supersample: f32,
}

@group(0) @binding(0) var color_tex: texture_2d<f32>;
@group(0) @binding(1) var ao_tex: texture_2d<f32>;
@group(0) @binding(2) var samp: sampler;
@group(0) @binding(3) var<uniform> params: CompositeParams;

// One texel when the source matches the target, a 2x2 box average
// when the source was rendered at twice the size.
fn fetch_color(uv: vec2<f32>) -> vec3<f32> {
    let texel = 1.0 / vec2<f32>(textureDimensions(color_tex));
    let c = textureSample(color_tex, samp, uv).rgb;
    let c1 = textureSample(color_tex, samp, uv + vec2<f32>(texel.x, 0.0)).rgb;
    let c2 = textureSample(color_tex, samp, uv + vec2<f32>(0.0, texel.y)).rgb;
    let c3 = textureSample(color_tex, samp, uv + texel).rgb;
    let box = (c + c1 + c2 + c3) * 0.25;
    return select(c, box, params.supersample > 1.5);
}

fn luma(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.299, 0.587, 0.114));
}

@fragment
fn fs_composite(in: VsOut) -> @location(0) vec4<f32> {
    let uv = in.uv;
    let texel = 1.0 / vec2<f32>(textureDimensions(color_tex));
    var color = fetch_color(uv);

    if params.edge_smoothing > 0.5 {
        // Luminance contrast against the cross neighbourhood; blend
        // high-contrast pixels toward the local average.
        let c_n = fetch_color(uv + vec2<f32>(0.0, -texel.y));
        let c_s = fetch_color(uv + vec2<f32>(0.0, texel.y));
        let c_w = fetch_color(uv + vec2<f32>(-texel.x, 0.0));
        let c_e = fetch_color(uv + vec2<f32>(texel.x, 0.0));
        let l_c = luma(color);
        let l_min = min(l_c, min(min(luma(c_n), luma(c_s)), min(luma(c_w), luma(c_e))));
        let l_max = max(l_c, max(max(luma(c_n), luma(c_s)), max(luma(c_w), luma(c_e))));
        let contrast = l_max - l_min;
        if contrast > max(0.0312, l_max * 0.125) {
            let average = (color + c_n + c_s + c_w + c_e) * 0.2;
            let blend = clamp(contrast / max(l_max, 1e-4), 0.0, 1.0);
            color = mix(color, average, blend * 0.75);
        }
    }

    let ao = textureSample(ao_tex, samp, uv).r;
    color = color * mix(1.0, ao, params.occlusion);
    return vec4<f32>(color * params.exposure, 1.0);
}
"#;
