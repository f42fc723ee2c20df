//! HDR/EXR environment map loading and GPU resources.
//!
//! Decoding is CPU-only and runs on the worker thread; the resulting
//! [`EnvironmentImage`] is uploaded into an [`EnvironmentMap`] on the UI
//! thread where the wgpu device lives.

use std::path::Path;

use half::f16;
use wgpu::util::DeviceExt;

use crate::util::{Error, Result};

/// Decoded equirectangular image, RGBA half floats, row major.
pub struct EnvironmentImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f16>,
}

/// Decode an .hdr/.exr file into half-float RGBA.
pub fn decode(path: &Path) -> Result<EnvironmentImage> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("hdr") | Some("exr") => {}
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    }

    use image::{GenericImageView, ImageReader};

    let img = ImageReader::open(path)?.decode()?;
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba32f();

    // f16 so the texture stays in a filterable HDR format.
    let pixels: Vec<f16> = rgba.as_raw().iter().map(|&v| f16::from_f32(v)).collect();

    tracing::info!(width, height, "decoded environment map {}", path.display());

    Ok(EnvironmentImage {
        width,
        height,
        pixels,
    })
}

/// Environment uniform parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvUniform {
    /// Lighting contribution multiplier.
    pub intensity: f32,
    /// Yaw offset in radians.
    pub rotation: f32,
    /// 1.0 when a map is loaded, 0.0 for the black fallback.
    pub enabled: f32,
    pub _pad: f32,
}

impl Default for EnvUniform {
    fn default() -> Self {
        Self {
            intensity: crate::rig::ENVIRONMENT_INTENSITY,
            rotation: 0.0,
            enabled: 0.0,
            _pad: 0.0,
        }
    }
}

/// GPU-side environment map.
#[allow(dead_code)] // GPU resources held alive
pub struct EnvironmentMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
    pub uniform_buffer: wgpu::Buffer,
    pub intensity: f32,
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
}

impl EnvironmentMap {
    /// Rewrite the uniform after an intensity change.
    pub fn write_uniform(&self, queue: &wgpu::Queue) {
        let uniform = EnvUniform {
            intensity: self.intensity,
            rotation: 0.0,
            enabled: if self.enabled { 1.0 } else { 0.0 },
            _pad: 0.0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }
}

/// Create bind group layout for the environment map (group 3).
pub fn create_env_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("env_map_bind_group_layout"),
        entries: &[
            // Equirectangular texture
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            // Sampler
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            // Environment params (intensity, rotation, enabled)
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
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

/// Upload a decoded image as the active environment map.
pub fn upload_env_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    image: &EnvironmentImage,
    intensity: f32,
) -> EnvironmentMap {
    let bytes: &[u8] = bytemuck::cast_slice(&image.pixels);

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("hdr_env_texture"),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        bytes,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    // Longitude wraps, latitude clamps at the poles.
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("hdr_env_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let uniform = EnvUniform {
        intensity,
        rotation: 0.0,
        enabled: 1.0,
        _pad: 0.0,
    };
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("env_uniform_buffer"),
        contents: bytemuck::bytes_of(&uniform),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group = create_env_bind_group(device, layout, &view, &sampler, &uniform_buffer);

    EnvironmentMap {
        texture,
        view,
        sampler,
        bind_group,
        uniform_buffer,
        intensity,
        enabled: true,
        width: image.width,
        height: image.height,
    }
}

/// Black 1x1 fallback used before any map is loaded.
pub fn create_default_env(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> EnvironmentMap {
    let data: [f16; 4] = [f16::ZERO, f16::ZERO, f16::ZERO, f16::ONE];
    let bytes: &[u8] = bytemuck::cast_slice(&data);

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("default_env_texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        bytes,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("default_env_sampler"),
        ..Default::default()
    });

    let uniform = EnvUniform::default();
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("env_uniform_buffer"),
        contents: bytemuck::bytes_of(&uniform),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group = create_env_bind_group(device, layout, &view, &sampler, &uniform_buffer);

    EnvironmentMap {
        texture,
        view,
        sampler,
        bind_group,
        uniform_buffer,
        intensity: uniform.intensity,
        enabled: false,
        width: 1,
        height: 1,
    }
}

fn create_env_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    uniform_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("env_map_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform_buffer.as_entire_binding(),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(decode(&path), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_decode_missing_file() {
        assert!(matches!(
            decode(Path::new("/nonexistent/city.hdr")),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_decode_radiance_hdr() {
        // Minimal 1x1 Radiance HDR: header plus one flat RGBE pixel.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.hdr");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n");
        bytes.extend_from_slice(b"-Y 1 +X 1\n");
        // RGBE (128, 128, 128, 129) decodes to roughly (1, 1, 1).
        bytes.extend_from_slice(&[128, 128, 128, 129]);
        std::fs::write(&path, &bytes).unwrap();

        let image = decode(&path).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.pixels.len(), 4);
        let r = image.pixels[0].to_f32();
        assert!(r > 0.5 && r < 2.0, "r = {r}");
        assert_eq!(image.pixels[3], f16::ONE);
    }
}
