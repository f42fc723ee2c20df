//! Persistent application settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::rig;

/// Feature flags selecting which render passes run each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Shadow pass on/off.
    pub shadows: bool,
    /// 3x3 PCF filtering instead of a single shadow tap.
    pub soft_shadows: bool,
    /// Screen-space ambient occlusion plus blur.
    pub ambient_occlusion: bool,
    /// Edge smoothing in the composite resolve.
    pub antialiasing: bool,
    /// Render the forward pass at 2x and box-resolve down.
    pub supersampling: bool,
    /// Accepted and persisted, but the pass is not wired up.
    pub screen_space_reflections: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            shadows: true,
            soft_shadows: true,
            ambient_occlusion: true,
            antialiasing: true,
            supersampling: false,
            screen_space_reflections: false,
        }
    }
}

impl RenderOptions {
    /// True when any post pass runs and the forward pass must therefore
    /// render into an offscreen target instead of the viewport.
    pub fn needs_offscreen(&self) -> bool {
        self.ambient_occlusion || self.antialiasing || self.supersampling
    }
}

/// Application settings that persist between sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Pass chain
    pub render: RenderOptions,

    // Window
    pub window_width: f32,
    pub window_height: f32,
    pub window_x: Option<f32>,
    pub window_y: Option<f32>,

    // Camera
    pub camera_distance: f32,
    pub camera_yaw: f32,
    pub camera_pitch: f32,

    // Idle orbit
    pub idle_orbit: bool,
    /// Use the refresh-rate dependent legacy smoothing.
    pub classic_smoothing: bool,

    // Last opened assets
    pub last_model: Option<PathBuf>,
    pub last_environment: Option<PathBuf>,

    // Recent models (most recent first, max 10)
    pub recent_files: Vec<PathBuf>,

    // Environment & output
    pub environment_intensity: f32,
    pub exposure: f32,
    pub skybox_visible: bool,

    // Window-level MSAA (requires restart)
    pub antialiasing: u8,

    // UI layout
    pub side_panel_width: f32,
    pub show_side_panel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            window_width: 1280.0,
            window_height: 720.0,
            window_x: None,
            window_y: None,
            camera_distance: rig::MAX_DISTANCE,
            camera_yaw: -45.0,
            camera_pitch: -19.5,
            idle_orbit: true,
            classic_smoothing: false,
            last_model: None,
            last_environment: None,
            recent_files: Vec::new(),
            environment_intensity: rig::ENVIRONMENT_INTENSITY,
            exposure: rig::EXPOSURE,
            skybox_visible: true,
            antialiasing: 1,
            side_panel_width: 220.0,
            show_side_panel: true,
        }
    }
}

const MAX_RECENT_FILES: usize = 10;

impl Settings {
    /// Get settings file path
    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("turntable");
            std::fs::create_dir_all(&p).ok();
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the config directory
    pub fn load() -> Self {
        let mut settings = Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default();

        // MSAA sample counts the surface actually supports
        if !matches!(settings.antialiasing, 1 | 2 | 4 | 8) {
            settings.antialiasing = 1;
        }

        settings
    }

    /// Save settings to the config directory (best effort)
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            self.save_to(&path);
        }
    }

    fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn save_to(&self, path: &Path) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(path, json);
        }
    }

    /// Add file to recent files list (moves to top if already present)
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path.clone());
        self.recent_files.truncate(MAX_RECENT_FILES);
        self.last_model = Some(path);
    }

    /// Get recent files (filters out non-existent)
    pub fn recent_files(&self) -> Vec<&PathBuf> {
        self.recent_files.iter().filter(|p| p.exists()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.render.supersampling = true;
        settings.render.ambient_occlusion = false;
        settings.camera_yaw = 123.0;
        settings.add_recent(PathBuf::from("/tmp/a.gltf"));
        settings.save_to(&path);

        let loaded = Settings::load_from(&path);
        assert!(loaded.render.supersampling);
        assert!(!loaded.render.ambient_occlusion);
        assert_eq!(loaded.camera_yaw, 123.0);
        assert_eq!(loaded.last_model, Some(PathBuf::from("/tmp/a.gltf")));
    }

    #[test]
    fn test_missing_file_defaults() {
        let loaded = Settings::load_from(Path::new("/nonexistent/settings.json"));
        assert_eq!(loaded.exposure, crate::rig::EXPOSURE);
        assert!(loaded.render.shadows);
    }

    #[test]
    fn test_corrupt_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"{not json").unwrap();
        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.environment_intensity, crate::rig::ENVIRONMENT_INTENSITY);
    }

    #[test]
    fn test_recent_files_dedup_and_cap() {
        let mut settings = Settings::default();
        for i in 0..12 {
            settings.add_recent(PathBuf::from(format!("/tmp/m{i}.gltf")));
        }
        settings.add_recent(PathBuf::from("/tmp/m5.gltf"));
        assert_eq!(settings.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(settings.recent_files[0], PathBuf::from("/tmp/m5.gltf"));
        assert_eq!(
            settings
                .recent_files
                .iter()
                .filter(|p| **p == PathBuf::from("/tmp/m5.gltf"))
                .count(),
            1
        );
    }

    #[test]
    fn test_offscreen_needed() {
        let mut render = RenderOptions::default();
        assert!(render.needs_offscreen());
        render.ambient_occlusion = false;
        render.antialiasing = false;
        render.supersampling = false;
        assert!(!render.needs_offscreen());
    }
}
