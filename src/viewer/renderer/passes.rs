//! Render pass encoders: shadow, forward, occlusion, blur, composite.

use super::resources::{AoParams, CompositeParams};
use super::Renderer;

impl Renderer {
    /// Depth-only pass from the light's point of view.
    pub(super) fn render_shadow_pass(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow_depth_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        shadow_pass.set_pipeline(&self.pipelines.shadow);
        shadow_pass.set_bind_group(0, &self.shadow_pass_bind_group, &[]);

        for mesh in &self.meshes {
            shadow_pass.set_bind_group(1, &mesh.model_bind_group, &[]);
            shadow_pass.set_vertex_buffer(0, mesh.mesh.vertex_buffer.slice(..));
            shadow_pass
                .set_index_buffer(mesh.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            shadow_pass.draw_indexed(0..mesh.mesh.index_count, 0, 0..1);
        }
    }

    /// Skybox and mesh draws shared by the direct and offscreen
    /// forward passes.
    fn encode_scene_draws(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        mesh_pipeline: &wgpu::RenderPipeline,
        skybox_pipeline: &wgpu::RenderPipeline,
    ) {
        if self.has_environment() && self.skybox_visible {
            pass.set_pipeline(skybox_pipeline);
            pass.set_bind_group(0, &self.camera_light_bind_group, &[]);
            pass.set_bind_group(1, &self.env_map.bind_group, &[]);
            pass.set_vertex_buffer(0, self.skybox_vertex_buffer.slice(..));
            pass.set_index_buffer(self.skybox_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.skybox_index_count, 0, 0..1);
        }

        pass.set_pipeline(mesh_pipeline);
        pass.set_bind_group(0, &self.camera_light_bind_group, &[]);
        pass.set_bind_group(2, &self.shadow_map.bind_group, &[]);
        pass.set_bind_group(3, &self.env_map.bind_group, &[]);

        for mesh in &self.meshes {
            pass.set_bind_group(1, &mesh.model_bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.mesh.index_count, 0, 0..1);
        }
    }

    fn clear_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.background_color[0] as f64,
            g: self.background_color[1] as f64,
            b: self.background_color[2] as f64,
            a: self.background_color[3] as f64,
        }
    }

    /// Forward pass straight into the viewport texture.
    pub(super) fn render_forward_direct(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        let depth_view = match &self.depth_texture {
            Some(depth) => &depth.view,
            None => return,
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("forward_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.encode_scene_draws(
            &mut render_pass,
            &self.pipelines.mesh_direct,
            &self.pipelines.skybox_direct,
        );
    }

    /// Forward pass into the HDR + normals pair feeding the
    /// post-processing chain.
    pub(super) fn render_forward_offscreen(&self, encoder: &mut wgpu::CommandEncoder) {
        let offscreen = match &self.offscreen {
            Some(targets) => targets,
            None => return,
        };
        let depth_view = match &self.depth_texture {
            Some(depth) => &depth.view,
            None => return,
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("forward_offscreen_pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: &offscreen.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: &offscreen.normals_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.encode_scene_draws(
            &mut render_pass,
            &self.pipelines.mesh_offscreen,
            &self.pipelines.skybox_offscreen,
        );
    }

    /// Screen-space occlusion from the depth and normals targets.
    pub(super) fn render_ao_pass(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let offscreen = match &self.offscreen {
            Some(targets) => targets,
            None => return,
        };
        let ao_targets = match &self.ao_targets {
            Some(targets) => targets,
            None => return,
        };
        let depth_view = match &self.depth_texture {
            Some(depth) => &depth.view,
            None => return,
        };

        let ao_params = AoParams {
            strength: [1.0, 0.0, 0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.ao_params_buffer, 0, bytemuck::bytes_of(&ao_params));
        self.ao_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ao_bind_group"),
            layout: &self.postfx.ao_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&offscreen.normals_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.postfx.ao_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.ao_params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: self.camera_buffer.as_entire_binding(),
                },
            ],
        }));

        let mut ao_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ao_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &ao_targets.occlusion_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(ao_bind_group) = &self.ao_bind_group {
            ao_pass.set_pipeline(&self.postfx.ao_pipeline);
            ao_pass.set_bind_group(0, ao_bind_group, &[]);
            ao_pass.draw(0..3, 0..1);
        }
    }

    /// Separable blur over the occlusion target, horizontal into the
    /// ping texture and vertical back again.
    pub(super) fn render_blur_passes(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let ao_targets = match &self.ao_targets {
            Some(targets) => targets,
            None => return,
        };

        self.blur_h_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_h_bind_group"),
            layout: &self.postfx.blur_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&ao_targets.occlusion_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.postfx.linear_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.blur_h_buffer.as_entire_binding(),
                },
            ],
        }));
        self.blur_v_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_v_bind_group"),
            layout: &self.postfx.blur_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&ao_targets.blur_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.postfx.linear_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.blur_v_buffer.as_entire_binding(),
                },
            ],
        }));

        {
            let mut blur_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ao_blur_h_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &ao_targets.blur_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(bind_group) = &self.blur_h_bind_group {
                blur_pass.set_pipeline(&self.postfx.blur_pipeline);
                blur_pass.set_bind_group(0, bind_group, &[]);
                blur_pass.draw(0..3, 0..1);
            }
        }

        {
            let mut blur_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ao_blur_v_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &ao_targets.occlusion_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(bind_group) = &self.blur_v_bind_group {
                blur_pass.set_pipeline(&self.postfx.blur_pipeline);
                blur_pass.set_bind_group(0, bind_group, &[]);
                blur_pass.draw(0..3, 0..1);
            }
        }
    }

    /// Resolve the offscreen HDR color into the viewport texture,
    /// applying occlusion, edge smoothing and exposure.
    pub(super) fn render_composite_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        let offscreen = match &self.offscreen {
            Some(targets) => targets,
            None => return,
        };
        let ao_targets = match &self.ao_targets {
            Some(targets) => targets,
            None => return,
        };

        let params = CompositeParams {
            exposure: self.exposure,
            occlusion: if self.options.ambient_occlusion {
                1.0
            } else {
                0.0
            },
            edge_smoothing: if self.options.antialiasing { 1.0 } else { 0.0 },
            supersample: if self.options.supersampling { 2.0 } else { 1.0 },
        };
        self.queue.write_buffer(
            &self.composite_params_buffer,
            0,
            bytemuck::bytes_of(&params),
        );

        self.composite_bind_group =
            Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("composite_bind_group"),
                layout: &self.postfx.composite_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&offscreen.color_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&ao_targets.occlusion_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.postfx.linear_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: self.composite_params_buffer.as_entire_binding(),
                    },
                ],
            }));

        let mut composite_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("composite_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(composite_bind_group) = &self.composite_bind_group {
            composite_pass.set_pipeline(&self.postfx.composite_pipeline);
            composite_pass.set_bind_group(0, composite_bind_group, &[]);
            composite_pass.draw(0..3, 0..1);
        }
    }
}
