//! wgpu renderer: forward pass with shadow mapping and an optional
//! post-processing chain (ambient occlusion, edge smoothing,
//! supersampled resolve).

use glam::{Mat4, Vec3};
use std::sync::Arc;
use wgpu::util::DeviceExt;

mod passes;
mod pipelines;
mod postfx;
mod resources;
mod shaders;

use pipelines::{BindGroupLayouts, Pipelines, Vertex};
use postfx::PostFxPipelines;
use resources::{
    AoTargets, CameraUniform, DepthTexture, LightUniform, ModelUniform, OffscreenTargets,
};

use crate::rig::{self, LightingRig};
use crate::scene::SceneData;
use crate::viewer::environment::{self, EnvironmentImage, EnvironmentMap};
use crate::viewer::settings::RenderOptions;
use crate::viewer::shadow::ShadowMap;

/// Main renderer state
pub struct Renderer {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,

    pipelines: Pipelines,
    postfx: PostFxPipelines,
    layouts: BindGroupLayouts,

    // Sky sphere
    skybox_vertex_buffer: wgpu::Buffer,
    skybox_index_buffer: wgpu::Buffer,
    skybox_index_count: u32,

    // Shared uniforms
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    camera_light_bind_group: wgpu::BindGroup,

    // Render targets, sized lazily from the viewport
    depth_texture: Option<DepthTexture>,
    offscreen: Option<OffscreenTargets>,
    ao_targets: Option<AoTargets>,

    // Post-processing state, bind groups are rebuilt per pass
    ao_params_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,
    composite_params_buffer: wgpu::Buffer,
    ao_bind_group: Option<wgpu::BindGroup>,
    blur_h_bind_group: Option<wgpu::BindGroup>,
    blur_v_bind_group: Option<wgpu::BindGroup>,
    composite_bind_group: Option<wgpu::BindGroup>,

    // Shadow mapping
    shadow_map: ShadowMap,
    shadow_pass_bind_group: wgpu::BindGroup,

    lighting: LightingRig,
    env_map: EnvironmentMap,

    meshes: Vec<SceneMesh>,

    options: RenderOptions,
    exposure: f32,
    env_intensity: f32,
    pub skybox_visible: bool,
    pub background_color: [f32; 4],
    ssr_warned: bool,
}

/// GPU mesh data
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Scene mesh with transform and per-mesh uniform
pub struct SceneMesh {
    pub mesh: Mesh,
    pub model_bind_group: wgpu::BindGroup,
    pub model_buffer: wgpu::Buffer,
    pub transform: Mat4,
    pub name: String,
}

impl Renderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
    ) -> Self {
        let layouts = pipelines::create_bind_group_layouts(&device);
        let scene_pipelines = pipelines::create_pipelines(&device, &layouts, format);
        let postfx = postfx::create_postfx_pipelines(&device, format);

        let (sky_verts, sky_indices) = pipelines::generate_sky_sphere(100.0, 32, 16);
        let skybox_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_vertex_buffer"),
            contents: bytemuck::cast_slice(&sky_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let skybox_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_index_buffer"),
            contents: bytemuck::cast_slice(&sky_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let skybox_index_count = sky_indices.len() as u32;

        let camera_uniform =
            CameraUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, rig::CAMERA_START);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&camera_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let lighting = LightingRig::default();
        let exposure = rig::EXPOSURE;
        let env_intensity = rig::ENVIRONMENT_INTENSITY;
        let light_uniform = light_uniform_for(&lighting, env_intensity, exposure);
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light_buffer"),
            contents: bytemuck::bytes_of(&light_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_light_bind_group"),
            layout: &layouts.camera_light,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let shadow_map = ShadowMap::new(&device, &layouts.shadow);
        let shadow_pass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_pass_bind_group"),
            layout: &layouts.shadow_pass,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_map.uniform_buffer.as_entire_binding(),
            }],
        });

        let env_map = environment::create_default_env(&device, &queue, &layouts.environment);

        let ao_params = resources::AoParams {
            strength: [1.0, 0.0, 0.0, 0.0],
        };
        let ao_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ao_params_buffer"),
            contents: bytemuck::bytes_of(&ao_params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let blur_h = resources::BlurParams {
            direction: [1.0, 0.0],
            _pad: [0.0, 0.0],
        };
        let blur_h_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("blur_h_buffer"),
            contents: bytemuck::bytes_of(&blur_h),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let blur_v = resources::BlurParams {
            direction: [0.0, 1.0],
            _pad: [0.0, 0.0],
        };
        let blur_v_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("blur_v_buffer"),
            contents: bytemuck::bytes_of(&blur_v),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let composite_params = resources::CompositeParams {
            exposure,
            occlusion: 0.0,
            edge_smoothing: 0.0,
            supersample: 1.0,
        };
        let composite_params_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("composite_params_buffer"),
                contents: bytemuck::bytes_of(&composite_params),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let options = RenderOptions::default();
        let renderer = Self {
            device,
            queue,
            pipelines: scene_pipelines,
            postfx,
            layouts,
            skybox_vertex_buffer,
            skybox_index_buffer,
            skybox_index_count,
            camera_buffer,
            light_buffer,
            camera_light_bind_group,
            depth_texture: None,
            offscreen: None,
            ao_targets: None,
            ao_params_buffer,
            blur_h_buffer,
            blur_v_buffer,
            composite_params_buffer,
            ao_bind_group: None,
            blur_h_bind_group: None,
            blur_v_bind_group: None,
            composite_bind_group: None,
            shadow_map,
            shadow_pass_bind_group,
            lighting,
            env_map,
            meshes: Vec::new(),
            options,
            exposure,
            env_intensity,
            skybox_visible: true,
            background_color: [0.1, 0.1, 0.12, 1.0],
            ssr_warned: false,
        };
        renderer.shadow_map.update_uniform(
            &renderer.queue,
            &renderer.lighting,
            renderer.options.shadows,
            renderer.options.soft_shadows,
        );
        renderer
    }

    /// Upload the camera matrices for this frame.
    pub fn update_camera(&self, view_proj: Mat4, view: Mat4, position: Vec3) {
        let uniform = CameraUniform::new(view_proj, view, position);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Apply a new set of render options.
    pub fn set_options(&mut self, options: RenderOptions) {
        if options.screen_space_reflections && !self.ssr_warned {
            tracing::warn!("screen-space reflections are not implemented; option ignored");
            self.ssr_warned = true;
        }
        self.options = options;
        self.shadow_map.update_uniform(
            &self.queue,
            &self.lighting,
            options.shadows,
            options.soft_shadows,
        );
    }

    /// Replace the scene contents with freshly decoded mesh data.
    pub fn set_scene(&mut self, scene: &SceneData) {
        self.meshes.clear();

        // The model sits slightly off-center, matching the framing the
        // start camera was tuned for.
        let root = Mat4::from_translation(rig::MODEL_OFFSET);

        for mesh_data in &scene.meshes {
            let vertices: Vec<Vertex> = mesh_data
                .positions
                .iter()
                .zip(mesh_data.normals.iter())
                .map(|(position, normal)| Vertex {
                    position: *position,
                    normal: *normal,
                })
                .collect();
            if vertices.is_empty() || mesh_data.indices.is_empty() {
                continue;
            }

            let transform = root * mesh_data.transform;
            let normal_matrix = transform.inverse().transpose();
            let model_uniform = ModelUniform {
                model: transform.to_cols_array_2d(),
                normal_matrix: normal_matrix.to_cols_array_2d(),
                base_color: mesh_data.base_color,
            };
            let model_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("model_buffer"),
                    contents: bytemuck::bytes_of(&model_uniform),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let model_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("model_bind_group"),
                layout: &self.layouts.model,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: model_buffer.as_entire_binding(),
                }],
            });

            let vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_index_buffer"),
                    contents: bytemuck::cast_slice(&mesh_data.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

            self.meshes.push(SceneMesh {
                mesh: Mesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh_data.indices.len() as u32,
                },
                model_bind_group,
                model_buffer,
                transform,
                name: mesh_data.name.clone(),
            });
        }

        tracing::debug!(meshes = self.meshes.len(), "scene uploaded");
    }

    pub fn clear_scene(&mut self) {
        self.meshes.clear();
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Upload a decoded environment image.
    pub fn set_environment(&mut self, image: &EnvironmentImage) {
        self.env_map = environment::upload_env_map(
            &self.device,
            &self.queue,
            &self.layouts.environment,
            image,
            self.env_intensity,
        );
    }

    /// Drop the environment map, reverting to the flat ambient term.
    pub fn clear_environment(&mut self) {
        self.env_map =
            environment::create_default_env(&self.device, &self.queue, &self.layouts.environment);
    }

    pub fn has_environment(&self) -> bool {
        self.env_map.enabled
    }

    pub fn set_env_intensity(&mut self, intensity: f32) {
        self.env_intensity = intensity;
        self.env_map.intensity = intensity;
        self.env_map.write_uniform(&self.queue);
        self.write_light_uniform();
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
        self.write_light_uniform();
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    fn write_light_uniform(&self) {
        let uniform = light_uniform_for(&self.lighting, self.env_intensity, self.exposure);
        self.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Recreate render targets when the viewport size or the render
    /// scale changed.
    fn ensure_targets(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        let scale: u32 = if self.options.supersampling { 2 } else { 1 };
        let (rw, rh) = (width * scale, height * scale);

        let depth_stale = match &self.depth_texture {
            Some(depth) => depth.size != (rw, rh),
            None => true,
        };
        if depth_stale {
            self.depth_texture = Some(DepthTexture::create(&self.device, rw, rh));
        }

        if self.options.needs_offscreen() {
            let offscreen_stale = match &self.offscreen {
                Some(targets) => targets.size != (rw, rh),
                None => true,
            };
            if offscreen_stale {
                self.offscreen = Some(OffscreenTargets::create(&self.device, rw, rh));
                self.ao_targets = Some(AoTargets::create(&self.device, rw, rh));
            }
        } else {
            self.offscreen = None;
            self.ao_targets = None;
        }
    }

    /// Render one frame into `view`, which is `width` x `height`.
    pub fn render(&mut self, view: &wgpu::TextureView, width: u32, height: u32) {
        self.ensure_targets(width, height);
        if self.depth_texture.is_none() {
            return;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        if self.options.shadows && !self.meshes.is_empty() {
            self.render_shadow_pass(&mut encoder);
        }

        if self.options.needs_offscreen() {
            self.render_forward_offscreen(&mut encoder);
            if self.options.ambient_occlusion {
                self.render_ao_pass(&mut encoder);
                self.render_blur_passes(&mut encoder);
            }
            self.render_composite_pass(&mut encoder, view);
        } else {
            self.render_forward_direct(&mut encoder, view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn light_uniform_for(lighting: &LightingRig, env_intensity: f32, exposure: f32) -> LightUniform {
    LightUniform {
        direction: lighting.light.direction().to_array(),
        intensity: lighting.light.intensity,
        color: lighting.light.color.to_array(),
        env_intensity,
        exposure,
        _pad: [0.0; 3],
    }
}
