//! Main application state and UI.

use std::path::PathBuf;

use egui::{CentralPanel, RichText, SidePanel, TopBottomPanel};
use glam::Vec3;
use log::info;

use crate::orbit::{OrbitConfig, OrbitPhase};

use super::settings::Settings;
use super::viewport::Viewport;
use super::worker::{WorkerHandle, WorkerResult};

/// Assets probed at startup when neither the command line nor the
/// previous session names a file.
const DEFAULT_MODEL: &str = "assets/pump/Pump_02.gltf";
const DEFAULT_ENVIRONMENT: &str = "assets/hdri/city.hdr";

fn existing_path(p: &str) -> Option<PathBuf> {
    let path = PathBuf::from(p);
    path.exists().then_some(path)
}

/// Main viewer application.
pub struct ViewerApp {
    viewport: Viewport,
    settings: Settings,

    // File state
    current_model: Option<PathBuf>,
    pending_model: Option<PathBuf>,
    pending_environment: Option<PathBuf>,

    // Scene info
    mesh_count: usize,
    vertex_count: usize,
    triangle_count: usize,
    scene_bounds: Option<(Vec3, Vec3)>,

    // UI state
    status_message: String,
    is_fullscreen: bool,
    fps_smoothed: f32,

    // Async loading
    worker: WorkerHandle,
    _trace_guard: Option<tracing_chrome::FlushGuard>,
}

impl ViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        initial_file: Option<PathBuf>,
        trace_guard: Option<tracing_chrome::FlushGuard>,
    ) -> Self {
        let settings = Settings::load();

        // Use the last model if no initial file was provided, then the
        // bundled default when it is present on disk
        let pending_model = initial_file
            .or_else(|| settings.last_model.clone())
            .or_else(|| existing_path(DEFAULT_MODEL));
        let pending_environment = settings
            .last_environment
            .clone()
            .or_else(|| existing_path(DEFAULT_ENVIRONMENT));

        let mut viewport = Viewport::new();
        viewport
            .camera
            .set_angles(settings.camera_yaw, settings.camera_pitch);
        viewport.camera.set_distance(settings.camera_distance);
        if settings.classic_smoothing {
            viewport.set_idle_config(OrbitConfig::classic());
        }
        viewport.set_idle_enabled(settings.idle_orbit);

        Self {
            viewport,
            settings,
            current_model: None,
            pending_model,
            pending_environment,
            mesh_count: 0,
            vertex_count: 0,
            triangle_count: 0,
            scene_bounds: None,
            status_message: "Ready".into(),
            is_fullscreen: false,
            fps_smoothed: 60.0,
            worker: WorkerHandle::spawn(),
            _trace_guard: trace_guard,
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        // Collect recent files up front to avoid borrow issues
        let recent: Vec<PathBuf> = self.settings.recent_files().into_iter().cloned().collect();

        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Model...").clicked() {
                    self.open_model_dialog();
                    ui.close();
                }
                if ui.button("Open Environment...").clicked() {
                    self.open_environment_dialog();
                    ui.close();
                }

                // Recent files submenu
                if !recent.is_empty() {
                    ui.menu_button("Recent", |ui| {
                        for path in &recent {
                            let name = path
                                .file_name()
                                .map(|n| n.to_string_lossy().to_string())
                                .unwrap_or_else(|| path.display().to_string());
                            if ui.button(&name).clicked() {
                                self.pending_model = Some(path.clone());
                                ui.close();
                            }
                        }
                        ui.separator();
                        if ui.button("Clear Recent").clicked() {
                            self.settings.recent_files.clear();
                            self.settings.save();
                            ui.close();
                        }
                    });
                }

                ui.separator();
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                if ui
                    .checkbox(&mut self.settings.show_side_panel, "Side Panel")
                    .changed()
                {
                    self.settings.save();
                }
                if let Some(renderer) = &mut self.viewport.renderer {
                    if ui
                        .checkbox(&mut self.settings.skybox_visible, "Show Skybox")
                        .changed()
                    {
                        renderer.skybox_visible = self.settings.skybox_visible;
                        self.settings.save();
                    }
                }
                ui.separator();
                if ui.button("Reset Camera").clicked() {
                    self.viewport.reset_view();
                    ui.close();
                }
                if ui.button("Toggle Fullscreen").clicked() {
                    self.is_fullscreen = !self.is_fullscreen;
                    ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.is_fullscreen));
                    ui.close();
                }
            });

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    self.status_message = format!(
                        "turntable v{} ({})",
                        env!("CARGO_PKG_VERSION"),
                        env!("TURNTABLE_BUILD_DATE"),
                    );
                    ui.close();
                }
            });
        });
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Scene");
        ui.separator();

        if let Some(path) = &self.current_model {
            ui.label(format!(
                "File: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            ));
        } else {
            ui.label("No model loaded");
        }

        ui.separator();

        ui.label(RichText::new("Statistics").strong());
        ui.label(format!("Meshes: {}", self.mesh_count));
        ui.label(format!("Vertices: {}", self.vertex_count));
        ui.label(format!("Triangles: {}", self.triangle_count));
        if let Some((min, max)) = &self.scene_bounds {
            let size = *max - *min;
            ui.label(format!(
                "Size: {:.2} x {:.2} x {:.2}",
                size.x, size.y, size.z
            ));
        }

        ui.separator();

        ui.label(RichText::new("Camera").strong());
        let pos = self.viewport.camera.position();
        ui.label(format!(
            "Position: ({:.2}, {:.2}, {:.2})",
            pos.x, pos.y, pos.z
        ));
        ui.label(format!("Distance: {:.2}", self.viewport.camera.distance()));
        let phase = match self.viewport.idle().phase() {
            OrbitPhase::Manual => "manual",
            OrbitPhase::Idling => "idling",
        };
        ui.label(format!("Orbit: {}", phase));

        ui.separator();

        ui.label(RichText::new("Turntable").strong());
        if ui
            .checkbox(&mut self.settings.idle_orbit, "Idle Orbit")
            .changed()
        {
            self.viewport.set_idle_enabled(self.settings.idle_orbit);
            self.settings.save();
        }
        if ui
            .checkbox(&mut self.settings.classic_smoothing, "Classic Smoothing")
            .on_hover_text("Per-frame convergence factor; speeds up with refresh rate")
            .changed()
        {
            let config = if self.settings.classic_smoothing {
                OrbitConfig::classic()
            } else {
                OrbitConfig::default()
            };
            self.viewport.set_idle_config(config);
            self.settings.save();
        }

        ui.separator();

        ui.label(RichText::new("Display").strong());
        if let Some(renderer) = &mut self.viewport.renderer {
            let mut changed = false;

            changed |= ui
                .checkbox(&mut self.settings.render.shadows, "Shadows")
                .changed();
            changed |= ui
                .add_enabled(
                    self.settings.render.shadows,
                    egui::Checkbox::new(&mut self.settings.render.soft_shadows, "Soft Shadows"),
                )
                .changed();
            changed |= ui
                .checkbox(
                    &mut self.settings.render.ambient_occlusion,
                    "Ambient Occlusion",
                )
                .changed();
            changed |= ui
                .checkbox(&mut self.settings.render.antialiasing, "Antialiasing")
                .changed();
            changed |= ui
                .checkbox(&mut self.settings.render.supersampling, "Supersampling")
                .changed();
            changed |= ui
                .checkbox(
                    &mut self.settings.render.screen_space_reflections,
                    "Reflections",
                )
                .on_hover_text("Not implemented yet")
                .changed();

            if changed {
                renderer.set_options(self.settings.render);
                self.settings.save();
            }

            ui.horizontal(|ui| {
                ui.label("Exposure:");
                if ui
                    .add(egui::Slider::new(&mut self.settings.exposure, 0.1..=2.0).step_by(0.01))
                    .changed()
                {
                    renderer.set_exposure(self.settings.exposure);
                    self.settings.save();
                }
            });
        }

        // Environment section (outside renderer borrow)
        ui.separator();
        ui.label(RichText::new("Environment").strong());

        let has_env = self
            .viewport
            .renderer
            .as_ref()
            .map(|r| r.has_environment())
            .unwrap_or(false);

        if has_env {
            ui.horizontal(|ui| {
                ui.label("Intensity:");
                if ui
                    .add(
                        egui::Slider::new(&mut self.settings.environment_intensity, 0.0..=2.0)
                            .step_by(0.01),
                    )
                    .changed()
                {
                    if let Some(renderer) = &mut self.viewport.renderer {
                        renderer.set_env_intensity(self.settings.environment_intensity);
                    }
                    self.settings.save();
                }
            });
        }

        if ui.button("Load HDR/EXR...").clicked() {
            self.open_environment_dialog();
        }

        if has_env && ui.button("Clear Environment").clicked() {
            if let Some(renderer) = &mut self.viewport.renderer {
                renderer.clear_environment();
            }
            self.settings.last_environment = None;
            self.settings.save();
        }

        ui.separator();

        if ui.button("Clear Scene").clicked() {
            self.clear_scene();
        }
    }

    fn status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status_message);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let dt = ui.ctx().input(|i| i.stable_dt).max(1e-6);
                // Exponential average keeps the readout legible
                self.fps_smoothed = self.fps_smoothed * 0.95 + (1.0 / dt) * 0.05;
                ui.label(format!("FPS: {:.0}", self.fps_smoothed));
            });
        });
    }

    fn open_model_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("glTF", &["gltf", "glb"])
            .pick_file()
        {
            self.pending_model = Some(path);
        }
    }

    fn open_environment_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("HDR/EXR", &["hdr", "exr"])
            .pick_file()
        {
            self.pending_environment = Some(path);
        }
    }

    fn load_model(&mut self, path: PathBuf) {
        self.status_message = format!("Loading: {}", path.display());
        self.worker.request_model(path);
    }

    fn load_environment(&mut self, path: PathBuf) {
        self.status_message = format!("Loading environment: {}", path.display());
        self.worker.request_environment(path);
    }

    fn clear_scene(&mut self) {
        if let Some(renderer) = &mut self.viewport.renderer {
            renderer.clear_scene();
        }
        self.mesh_count = 0;
        self.vertex_count = 0;
        self.triangle_count = 0;
        self.scene_bounds = None;
        self.current_model = None;
        self.status_message = "Scene cleared".into();
    }

    /// Process any ready results from the worker (non-blocking).
    fn process_worker_results(&mut self) {
        let _span = tracing::info_span!("process_worker_results").entered();
        while let Some(result) = self.worker.try_recv() {
            match result {
                WorkerResult::ModelReady { path, scene } => {
                    let Some(renderer) = &mut self.viewport.renderer else {
                        continue;
                    };
                    renderer.set_scene(&scene);
                    info!(
                        "loaded {}: {} meshes, {} vertices",
                        path.display(),
                        scene.meshes.len(),
                        scene.vertex_count()
                    );

                    self.mesh_count = scene.meshes.len();
                    self.vertex_count = scene.vertex_count();
                    self.triangle_count = scene.triangle_count();
                    self.scene_bounds = scene.bounds();
                    self.current_model = Some(path.clone());

                    self.settings.last_model = Some(path.clone());
                    self.settings.add_recent(path);
                    self.settings.save();

                    self.status_message = format!(
                        "Loaded: {} meshes, {} vertices, {} triangles",
                        self.mesh_count, self.vertex_count, self.triangle_count
                    );
                }
                WorkerResult::EnvironmentReady { path, image } => {
                    let Some(renderer) = &mut self.viewport.renderer else {
                        continue;
                    };
                    renderer.set_environment(&image);
                    renderer.set_env_intensity(self.settings.environment_intensity);
                    info!("environment set: {}", path.display());

                    self.settings.last_environment = Some(path.clone());
                    self.settings.save();

                    self.status_message = format!(
                        "Environment: {}",
                        path.file_name().unwrap_or_default().to_string_lossy()
                    );
                }
                WorkerResult::LoadFailed { path, error } => {
                    // The worker already logged the error; just surface it
                    self.status_message = format!(
                        "Failed to load {}: {}",
                        path.file_name().unwrap_or_default().to_string_lossy(),
                        error
                    );
                }
            }
        }
    }

    /// Find the next or previous file with the given extensions in the
    /// same directory. `direction`: -1 for previous, +1 for next.
    fn find_sibling_file(current: &PathBuf, direction: i32, extensions: &[&str]) -> Option<PathBuf> {
        let dir = current.parent()?;

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .ok()?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| {
                        let ext_str = ext.to_string_lossy().to_lowercase();
                        extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext_str))
                    })
                    .unwrap_or(false)
            })
            .collect();

        files.sort();
        if files.is_empty() {
            return None;
        }

        let current_idx = files.iter().position(|p| p == current)?;
        let new_idx = if direction > 0 {
            (current_idx + 1) % files.len()
        } else if current_idx == 0 {
            files.len() - 1
        } else {
            current_idx - 1
        };

        if new_idx == current_idx {
            return None;
        }
        Some(files[new_idx].clone())
    }

    /// Navigate to the next or previous model in the directory.
    fn navigate_sibling_model(&mut self, direction: i32) {
        if let Some(current) = &self.current_model {
            if let Some(path) = Self::find_sibling_file(current, direction, &["gltf", "glb"]) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                self.status_message = format!("Opening: {}", name);
                self.pending_model = Some(path);
            } else {
                self.status_message = "No other glTF files in directory".into();
            }
        }
    }

    /// Navigate to the next or previous environment in the directory.
    fn navigate_sibling_environment(&mut self, direction: i32) {
        if let Some(current) = &self.settings.last_environment {
            if let Some(path) = Self::find_sibling_file(current, direction, &["hdr", "exr"]) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                self.status_message = format!("Loading environment: {}", name);
                self.pending_environment = Some(path);
            } else {
                self.status_message = "No other HDR/EXR files in directory".into();
            }
        } else {
            self.status_message = "No environment loaded".into();
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Escape exits fullscreen first, then closes the app
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if self.is_fullscreen {
                self.is_fullscreen = false;
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }

        // Z = toggle fullscreen
        if ctx.input(|i| i.key_pressed(egui::Key::Z)) {
            self.is_fullscreen = !self.is_fullscreen;
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.is_fullscreen));
        }

        // PageUp/PageDown cycle models; with Ctrl, environments
        if ctx.input(|i| i.key_pressed(egui::Key::PageUp)) {
            if ctx.input(|i| i.modifiers.ctrl) {
                self.navigate_sibling_environment(-1);
            } else {
                self.navigate_sibling_model(-1);
            }
        }
        if ctx.input(|i| i.key_pressed(egui::Key::PageDown)) {
            if ctx.input(|i| i.modifiers.ctrl) {
                self.navigate_sibling_environment(1);
            } else {
                self.navigate_sibling_model(1);
            }
        }

        // H = home camera
        if ctx.input(|i| i.key_pressed(egui::Key::H)) {
            self.viewport.reset_view();
            self.status_message = "Camera reset".into();
        }
    }
}

impl eframe::App for ViewerApp {
    fn on_exit(&mut self) {
        self.worker.stop();

        // Save camera state
        self.settings.camera_distance = self.viewport.camera.distance();
        let (yaw, pitch) = self.viewport.camera.angles();
        self.settings.camera_yaw = yaw;
        self.settings.camera_pitch = pitch;
        self.settings.save();
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let _span = tracing::info_span!("viewer_update").entered();

        self.process_worker_results();
        self.handle_keys(ctx);

        // Initialize renderer once a device is available
        if self.viewport.renderer.is_none() {
            if let Some(render_state) = frame.wgpu_render_state() {
                self.viewport.init_renderer(
                    &render_state.device,
                    &render_state.queue,
                    render_state.target_format,
                );
                if let Some(renderer) = &mut self.viewport.renderer {
                    renderer.set_options(self.settings.render);
                    renderer.set_exposure(self.settings.exposure);
                    renderer.set_env_intensity(self.settings.environment_intensity);
                    renderer.skybox_visible = self.settings.skybox_visible;
                }
                // Ensure the settings file exists
                self.settings.save();
            }
        }

        // Dispatch pending loads once the renderer exists
        if self.viewport.renderer.is_some() {
            if let Some(path) = self.pending_model.take() {
                self.load_model(path);
            }
            if let Some(path) = self.pending_environment.take() {
                if path.exists() {
                    self.load_environment(path);
                }
            }
        }

        TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        if self.settings.show_side_panel {
            let response = SidePanel::right("side_panel")
                .default_width(self.settings.side_panel_width)
                .min_width(150.0)
                .max_width(400.0)
                .resizable(true)
                .show(ctx, |ui| {
                    self.side_panel(ui);
                });
            // Save panel width on resize
            if response.response.rect.width() != self.settings.side_panel_width {
                self.settings.side_panel_width = response.response.rect.width();
                self.settings.save();
            }
        }

        CentralPanel::default().show(ctx, |ui| {
            let render_state = frame.wgpu_render_state();
            self.viewport.show(ui, render_state);
        });

        // Track window size and position for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().inner_rect {
                self.settings.window_width = rect.width();
                self.settings.window_height = rect.height();
            }
            if let Some(pos) = i.viewport().outer_rect {
                self.settings.window_x = Some(pos.min.x);
                self.settings.window_y = Some(pos.min.y);
            }
        });

        // The idle timer and auto-rotation must advance without input,
        // so keep frames coming while the idle orbit is on
        if self.settings.idle_orbit {
            ctx.request_repaint();
        }
    }
}
