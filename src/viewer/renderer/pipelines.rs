//! Render pipelines, bind group layouts and the sky sphere mesh.

use super::resources::{CameraUniform, LightUniform, DEPTH_FORMAT, HDR_FORMAT, NORMALS_FORMAT};
use super::shaders::{FORWARD_SHADER, SHADOW_SHADER, SKYBOX_SHADER};
use crate::viewer::environment::create_env_bind_group_layout;
use crate::viewer::shadow::{create_shadow_bind_group_layout, SHADOW_DEPTH_FORMAT};

/// Mesh vertex format
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

/// Vertex for the sky sphere (position only)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyVertex {
    pub position: [f32; 3],
}

fn sky_vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SkyVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

/// Generate an inverted sphere mesh for the sky background.
pub fn generate_sky_sphere(radius: f32, segments: u32, rings: u32) -> (Vec<SkyVertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for seg in 0..=segments {
            let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
            let x = r * theta.cos();
            let z = r * theta.sin();
            vertices.push(SkyVertex {
                position: [x, y, z],
            });
        }
    }

    // Inverted winding, the camera sits inside the sphere.
    for ring in 0..rings {
        for seg in 0..segments {
            let curr = ring * (segments + 1) + seg;
            let next = curr + segments + 1;
            indices.push(curr);
            indices.push(curr + 1);
            indices.push(next);
            indices.push(next);
            indices.push(curr + 1);
            indices.push(next + 1);
        }
    }

    (vertices, indices)
}

/// Bind group layouts shared by the scene pipelines.
pub struct BindGroupLayouts {
    /// Group 0: camera + light uniforms
    pub camera_light: wgpu::BindGroupLayout,
    /// Group 1: per-mesh transform and color
    pub model: wgpu::BindGroupLayout,
    /// Group 2: shadow map, comparison sampler, light matrix
    pub shadow: wgpu::BindGroupLayout,
    /// Shadow pass: light matrix uniform only
    pub shadow_pass: wgpu::BindGroupLayout,
    /// Group 3: environment map
    pub environment: wgpu::BindGroupLayout,
}

pub fn create_bind_group_layouts(device: &wgpu::Device) -> BindGroupLayouts {
    let camera_uniform_size =
        std::num::NonZeroU64::new(std::mem::size_of::<CameraUniform>() as u64);
    let light_uniform_size = std::num::NonZeroU64::new(std::mem::size_of::<LightUniform>() as u64);

    let camera_light = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_light_layout"),
        entries: &[
            // Camera
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: camera_uniform_size,
                },
                count: None,
            },
            // Light
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: light_uniform_size,
                },
                count: None,
            },
        ],
    });

    // The fragment stage reads base_color from the model uniform.
    let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("model_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let shadow = create_shadow_bind_group_layout(device);

    let shadow_pass = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("shadow_pass_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let environment = create_env_bind_group_layout(device);

    BindGroupLayouts {
        camera_light,
        model,
        shadow,
        shadow_pass,
        environment,
    }
}

/// Scene pipelines. The `direct` variants render straight into the
/// viewport texture and tone-map in the fragment shader; the
/// `offscreen` variants feed the post-processing chain and write
/// linear HDR plus encoded normals.
pub struct Pipelines {
    pub mesh_direct: wgpu::RenderPipeline,
    pub mesh_offscreen: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub skybox_direct: wgpu::RenderPipeline,
    pub skybox_offscreen: wgpu::RenderPipeline,
}

pub fn create_pipelines(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    target_format: wgpu::TextureFormat,
) -> Pipelines {
    let forward_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("forward_shader"),
        source: wgpu::ShaderSource::Wgsl(FORWARD_SHADER.into()),
    });
    let skybox_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("skybox_shader"),
        source: wgpu::ShaderSource::Wgsl(SKYBOX_SHADER.into()),
    });
    let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shadow_depth_shader"),
        source: wgpu::ShaderSource::Wgsl(SHADOW_SHADER.into()),
    });

    let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mesh_pipeline_layout"),
        bind_group_layouts: &[
            &layouts.camera_light,
            &layouts.model,
            &layouts.shadow,
            &layouts.environment,
        ],
        push_constant_ranges: &[],
    });

    let direct_targets = [Some(wgpu::ColorTargetState {
        format: target_format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })];
    let offscreen_targets = [
        Some(wgpu::ColorTargetState {
            format: HDR_FORMAT,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        }),
        Some(wgpu::ColorTargetState {
            format: NORMALS_FORMAT,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        }),
    ];

    let mesh_pipeline = |label: &str,
                         entry: &str,
                         targets: &[Option<wgpu::ColorTargetState>]| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&mesh_layout),
            vertex: wgpu::VertexState {
                module: &forward_shader,
                entry_point: Some("vs_mesh"),
                compilation_options: Default::default(),
                buffers: &[vertex_buffer_layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &forward_shader,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                targets,
            }),
            multiview: None,
            cache: None,
        })
    };

    let mesh_direct = mesh_pipeline("mesh_direct_pipeline", "fs_mesh", &direct_targets);
    let mesh_offscreen =
        mesh_pipeline("mesh_offscreen_pipeline", "fs_mesh_gbuf", &offscreen_targets);

    let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shadow_pipeline_layout"),
        bind_group_layouts: &[&layouts.shadow_pass, &layouts.model],
        push_constant_ranges: &[],
    });

    let shadow = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shadow_pipeline"),
        layout: Some(&shadow_layout),
        vertex: wgpu::VertexState {
            module: &shadow_shader,
            entry_point: Some("vs_shadow"),
            compilation_options: Default::default(),
            buffers: &[vertex_buffer_layout()],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: SHADOW_DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                // Hardware bias on the caster keeps acne down even
                // before the receiver-side biases apply.
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: None,
        multiview: None,
        cache: None,
    });

    let skybox_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("skybox_pipeline_layout"),
        bind_group_layouts: &[&layouts.camera_light, &layouts.environment],
        push_constant_ranges: &[],
    });

    let skybox_pipeline = |label: &str,
                           entry: &str,
                           targets: &[Option<wgpu::ColorTargetState>]| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&skybox_layout),
            vertex: wgpu::VertexState {
                module: &skybox_shader,
                entry_point: Some("vs_skybox"),
                compilation_options: Default::default(),
                buffers: &[sky_vertex_buffer_layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // No culling, the camera is inside the sphere.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &skybox_shader,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                targets,
            }),
            multiview: None,
            cache: None,
        })
    };

    let skybox_direct = skybox_pipeline("skybox_direct_pipeline", "fs_skybox", &direct_targets);
    let skybox_offscreen = skybox_pipeline(
        "skybox_offscreen_pipeline",
        "fs_skybox_gbuf",
        &offscreen_targets,
    );

    Pipelines {
        mesh_direct,
        mesh_offscreen,
        shadow,
        skybox_direct,
        skybox_offscreen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::size_of::<SkyVertex>(), 12);
    }

    #[test]
    fn test_sky_sphere_counts() {
        let (vertices, indices) = generate_sky_sphere(100.0, 32, 16);
        assert_eq!(vertices.len(), 33 * 17);
        assert_eq!(indices.len(), (32 * 16 * 6) as usize);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn test_sky_sphere_on_radius() {
        let (vertices, _) = generate_sky_sphere(100.0, 8, 4);
        for v in &vertices {
            let d = (v.position[0] * v.position[0]
                + v.position[1] * v.position[1]
                + v.position[2] * v.position[2])
                .sqrt();
            assert!((d - 100.0).abs() < 1e-3);
        }
    }
}
