//! GPU-side resources used by the renderer: render targets and the
//! uniform structs shared with the WGSL shaders.

use glam::{Mat4, Vec3};

/// Forward pass renders HDR; tone mapping happens at the final write.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// View-space-ish normals target feeding the occlusion pass.
pub const NORMALS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Single-channel occlusion.
pub const AO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug)]
pub struct DepthTexture {
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl DepthTexture {
    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            // Sampled by the occlusion pass.
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size: (width, height),
        }
    }
}

/// Offscreen forward targets: HDR color plus encoded normals.
#[derive(Debug)]
pub struct OffscreenTargets {
    #[allow(dead_code)]
    pub color: wgpu::Texture,
    #[allow(dead_code)]
    pub normals: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub normals_view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl OffscreenTargets {
    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let make = |label: &str, format: wgpu::TextureFormat| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let color = make("offscreen_color", HDR_FORMAT);
        let normals = make("offscreen_normals", NORMALS_FORMAT);
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let normals_view = normals.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            color,
            normals,
            color_view,
            normals_view,
            size: (width, height),
        }
    }
}

/// Occlusion target plus a ping texture for the separable blur.
#[derive(Debug)]
pub struct AoTargets {
    #[allow(dead_code)]
    pub occlusion: wgpu::Texture,
    #[allow(dead_code)]
    pub blur: wgpu::Texture,
    pub occlusion_view: wgpu::TextureView,
    pub blur_view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl AoTargets {
    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let make = |label: &str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: AO_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let occlusion = make("ao_occlusion");
        let blur = make("ao_blur_ping");
        let occlusion_view = occlusion.create_view(&wgpu::TextureViewDescriptor::default());
        let blur_view = blur.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            occlusion,
            blur,
            occlusion_view,
            blur_view,
            size: (width, height),
        }
    }
}

/// Camera uniform, group 0 binding 0 of the forward pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad: f32,
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, view: Mat4, position: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            position: position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Key light plus global lighting knobs, group 0 binding 1.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub env_intensity: f32,
    /// Applied only when the forward pass writes straight to the
    /// viewport; the composite applies it otherwise.
    pub exposure: f32,
    pub _pad: [f32; 3],
}

/// Per-mesh uniform, group 1.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
}

/// Occlusion pass tuning.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AoParams {
    pub strength: [f32; 4],
}

/// Direction of one separable blur step, in texels.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurParams {
    pub direction: [f32; 2],
    pub _pad: [f32; 2],
}

/// Final resolve parameters.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeParams {
    pub exposure: f32,
    /// 1.0 when the occlusion texture should multiply the color.
    pub occlusion: f32,
    /// 1.0 enables the luminance edge filter.
    pub edge_smoothing: f32,
    /// Source-to-target scale of the box resolve (1.0 or 2.0).
    pub supersample: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Struct sizes must match the WGSL uniform layouts exactly.

    #[test]
    fn test_camera_uniform_size() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 208);
    }

    #[test]
    fn test_light_uniform_size() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
    }

    #[test]
    fn test_model_uniform_size() {
        assert_eq!(std::mem::size_of::<ModelUniform>(), 144);
    }

    #[test]
    fn test_pass_param_sizes() {
        assert_eq!(std::mem::size_of::<AoParams>(), 16);
        assert_eq!(std::mem::size_of::<BlurParams>(), 16);
        assert_eq!(std::mem::size_of::<CompositeParams>(), 16);
    }

    #[test]
    fn test_camera_uniform_inverse() {
        let proj = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
        let u = CameraUniform::new(proj * view, view, Vec3::new(0.0, 2.0, 5.0));
        let vp = Mat4::from_cols_array_2d(&u.view_proj);
        let inv = Mat4::from_cols_array_2d(&u.inv_view_proj);
        let id = vp * inv;
        assert!((id.x_axis.x - 1.0).abs() < 1e-4);
        assert!(id.x_axis.y.abs() < 1e-4);
    }
}
