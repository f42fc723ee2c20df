//! # Turntable
//!
//! Desktop glTF scene viewer with HDR environment lighting and an idle
//! turntable orbit: leave the camera alone for a couple of seconds and it
//! eases into a slow automatic rotation around the subject; grab it and
//! control is yours again instantly.
//!
//! ## Modules
//!
//! - [`orbit`] - Idle auto-orbit state machine driving the camera
//! - [`rig`] - Lighting rig and scene placement description
//! - [`scene`] - glTF import into flattened mesh data
//! - [`util`] - Error handling
//! - `viewer` - egui/wgpu viewer application (feature `viewer`)
//!
//! ## Example
//!
//! ```ignore
//! use turntable::orbit::{IdleOrbit, OrbitConfig};
//!
//! let mut orbit = IdleOrbit::new(OrbitConfig::default());
//! orbit.advance(frame_dt, &mut camera);
//! ```

pub mod orbit;
pub mod rig;
pub mod scene;
pub mod util;

// 3D Viewer (optional, enabled with "viewer" feature)
#[cfg(feature = "viewer")]
pub mod viewer;

// Re-export commonly used types
pub use orbit::{IdleOrbit, OrbitConfig, OrbitControls, OrbitPhase, OrbitState};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::orbit::{
        IdleOrbit, OrbitConfig, OrbitControls, OrbitPhase, OrbitState, PointerButton, Smoothing,
    };
    pub use crate::rig::{DirectionalLight, LightingRig, ShadowFrustum};
    pub use crate::scene::{load_gltf, MeshData, SceneData};
    pub use crate::util::{Error, Result};
}
