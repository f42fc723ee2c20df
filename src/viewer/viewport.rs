//! Interactive 3D viewport widget.
//!
//! Owns the orbit camera and the idle-orbit controller, turns egui
//! pointer events into camera motion, and blits the wgpu render into
//! the egui frame through a registered native texture.

use std::sync::Arc;

use egui::{Response, Sense, Ui, Vec2};

use crate::orbit::{IdleOrbit, OrbitConfig, PointerButton};

use super::camera::OrbitCamera;
use super::renderer::Renderer;

/// Upper bound on one frame step, seconds. Window drags and suspends
/// otherwise deliver a single huge dt straight into the idle timer.
const MAX_FRAME_DT: f32 = 0.25;

/// Scroll and right-drag travel to dolly units.
const ZOOM_SENSITIVITY: f32 = 0.1;

/// Offscreen target the renderer draws into, registered with egui so
/// the painter can sample it like any other texture.
struct RenderTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// The viewport: camera rig, idle controller, renderer, blit target.
pub struct Viewport {
    pub camera: OrbitCamera,
    idle: IdleOrbit,
    idle_enabled: bool,
    pub renderer: Option<Renderer>,
    texture_id: Option<egui::TextureId>,
    render_texture: Option<RenderTexture>,
    last_size: Vec2,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            camera: OrbitCamera::default(),
            idle: IdleOrbit::default(),
            idle_enabled: true,
            renderer: None,
            texture_id: None,
            render_texture: None,
            last_size: Vec2::ZERO,
        }
    }

    /// Create the renderer once a wgpu device is available.
    pub fn init_renderer(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) {
        if self.renderer.is_none() {
            self.renderer = Some(Renderer::new(
                Arc::new(device.clone()),
                Arc::new(queue.clone()),
                format,
            ));
        }
    }

    pub fn idle(&self) -> &IdleOrbit {
        &self.idle
    }

    pub fn idle_enabled(&self) -> bool {
        self.idle_enabled
    }

    /// Toggle the idle auto-orbit. Turning it off hands the camera back
    /// to the user immediately: fresh controller, wide bounds, no spin.
    pub fn set_idle_enabled(&mut self, enabled: bool) {
        if self.idle_enabled == enabled {
            return;
        }
        self.idle_enabled = enabled;
        if !enabled {
            self.idle = IdleOrbit::new(*self.idle.config());
            self.idle.apply_to(&mut self.camera);
        }
    }

    /// Swap the idle tuning. Restarts the controller so a half-converged
    /// spin never carries over into the new smoothing mode.
    pub fn set_idle_config(&mut self, config: OrbitConfig) {
        self.idle = IdleOrbit::new(config);
        self.idle.apply_to(&mut self.camera);
    }

    /// Put the camera back at the stock start framing.
    pub fn reset_view(&mut self) {
        self.camera = OrbitCamera::default();
        self.idle = IdleOrbit::new(*self.idle.config());
        self.idle.apply_to(&mut self.camera);
    }

    /// Draw the viewport and advance one frame: input, idle controller,
    /// camera tick, render, blit.
    pub fn show(
        &mut self,
        ui: &mut Ui,
        wgpu_render_state: Option<&egui_wgpu::RenderState>,
    ) -> Response {
        let _span = tracing::info_span!("viewport_show").entered();

        let available = ui.available_size();
        let size = available.max(Vec2::splat(64.0));
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        self.handle_input(ui, &response);

        let dt = ui.input(|i| i.stable_dt).clamp(0.0, MAX_FRAME_DT);
        if self.idle_enabled {
            self.idle.advance(dt, &mut self.camera);
        }
        self.camera.update(dt);

        self.last_size = size;

        if let Some(render_state) = wgpu_render_state {
            if self.renderer.is_some() {
                let width = (size.x.round() as u32).max(1);
                let height = (size.y.round() as u32).max(1);
                self.ensure_render_texture(render_state, width, height);

                let aspect = size.x / size.y.max(1.0);
                if let (Some(renderer), Some(rt)) = (&mut self.renderer, &self.render_texture) {
                    renderer.update_camera(
                        self.camera.view_proj_matrix(aspect),
                        self.camera.view_matrix(),
                        self.camera.position(),
                    );
                    renderer.render(&rt.view, rt.size.0, rt.size.1);
                }

                if let Some(texture_id) = self.texture_id {
                    ui.painter().image(
                        texture_id,
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
                return response;
            }
        }

        // No device yet; paint a flat placeholder instead of stale junk.
        ui.painter()
            .rect_filled(rect, 0.0, egui::Color32::from_rgb(30, 30, 35));
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Initializing renderer...",
            egui::FontId::default(),
            egui::Color32::GRAY,
        );

        response
    }

    /// Route pointer events: primary drag orbits and gates the idle
    /// timer, secondary drag and the wheel dolly. Panning stays off so
    /// the model never leaves the turntable pivot.
    fn handle_input(&mut self, ui: &Ui, response: &Response) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.idle.pointer_down(PointerButton::Primary);
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            // A held but motionless button must not rewind the idle
            // timer; only actual movement counts.
            if delta != Vec2::ZERO {
                self.camera.orbit(delta.x, delta.y);
                self.idle.pointer_move();
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.idle.pointer_up(PointerButton::Primary);
        }

        if response.dragged_by(egui::PointerButton::Secondary) {
            let delta = response.drag_delta();
            if delta.y != 0.0 {
                self.camera.zoom(delta.y * ZOOM_SENSITIVITY);
            }
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                self.camera.zoom(scroll * ZOOM_SENSITIVITY);
            }
        }
    }

    /// Recreate the blit target when the viewport size changes.
    fn ensure_render_texture(
        &mut self,
        render_state: &egui_wgpu::RenderState,
        width: u32,
        height: u32,
    ) {
        let stale = match &self.render_texture {
            Some(rt) => rt.size != (width, height),
            None => true,
        };
        if !stale {
            return;
        }

        let device = &render_state.device;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Render Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: render_state.target_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let texture_id =
            render_state
                .renderer
                .write()
                .register_native_texture(device, &view, wgpu::FilterMode::Linear);

        // Register the replacement before freeing the old id; egui may
        // still sample the old texture this frame.
        if let Some(old_id) = self.texture_id.replace(texture_id) {
            render_state.renderer.write().free_texture(&old_id);
        }

        self.render_texture = Some(RenderTexture {
            texture,
            view,
            size: (width, height),
        });
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}
