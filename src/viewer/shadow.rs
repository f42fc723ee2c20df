//! Shadow map resources.
//!
//! The light matrix comes from [`crate::rig::LightingRig`]; this module
//! owns the depth target, the comparison sampler and the uniform the
//! forward pass samples shadows with.

use wgpu::util::DeviceExt;

use crate::rig::LightingRig;

/// Shadow map configuration
pub const SHADOW_MAP_SIZE: u32 = 2048;
pub const SHADOW_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Light-space uniform sampled by the forward pass.
///
/// `params` packs (depth_bias, normal_bias, soft, enabled).
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    pub light_view_proj: [[f32; 4]; 4],
    pub params: [f32; 4],
}

/// Shadow map resources
pub struct ShadowMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
    pub uniform_buffer: wgpu::Buffer,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, shadow_bind_group_layout: &wgpu::BindGroupLayout) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map_texture"),
            size: wgpu::Extent3d {
                width: SHADOW_MAP_SIZE,
                height: SHADOW_MAP_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Comparison sampler for shadow testing
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let uniform = uniform_for(&LightingRig::default(), true, true);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shadow_uniform_buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: shadow_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            texture,
            view,
            sampler,
            bind_group,
            uniform_buffer,
        }
    }

    /// Upload the light matrix and the pass flags.
    pub fn update_uniform(
        &self,
        queue: &wgpu::Queue,
        rig: &LightingRig,
        enabled: bool,
        soft: bool,
    ) {
        let uniform = uniform_for(rig, enabled, soft);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }
}

fn uniform_for(rig: &LightingRig, enabled: bool, soft: bool) -> ShadowUniform {
    ShadowUniform {
        light_view_proj: rig.light_view_proj().to_cols_array_2d(),
        params: [
            rig.shadow.depth_bias,
            rig.shadow.normal_bias,
            if soft { 1.0 } else { 0.0 },
            if enabled { 1.0 } else { 0.0 },
        ],
    }
}

/// Create bind group layout for shadow sampling (group 2 of the forward pass)
pub fn create_shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("shadow_bind_group_layout"),
        entries: &[
            // Shadow map texture (depth comparison)
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            // Comparison sampler
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
            // Light view-projection matrix + bias params
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_packs_rig_biases() {
        let rig = LightingRig::default();
        let uniform = uniform_for(&rig, true, false);
        assert_eq!(uniform.params[0], rig.shadow.depth_bias);
        assert_eq!(uniform.params[1], rig.shadow.normal_bias);
        assert_eq!(uniform.params[2], 0.0);
        assert_eq!(uniform.params[3], 1.0);
    }

    #[test]
    fn test_uniform_matrix_matches_rig() {
        let rig = LightingRig::default();
        let uniform = uniform_for(&rig, true, true);
        assert_eq!(uniform.light_view_proj, rig.light_view_proj().to_cols_array_2d());
    }

    #[test]
    fn test_uniform_size() {
        // mat4 + vec4 = 80 bytes, WGSL layout
        assert_eq!(std::mem::size_of::<ShadowUniform>(), 80);
    }
}
