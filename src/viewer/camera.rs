//! Camera controls using dolly

use dolly::prelude::*;
use glam::{Mat4, Vec3};

use crate::orbit::{OrbitControls, WIDE_POLAR};
use crate::rig::{
    CAMERA_FAR, CAMERA_FOV_DEG, CAMERA_NEAR, CAMERA_START, MAX_DISTANCE, MIN_DISTANCE,
};

const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

pub fn wgpu_projection(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    // wgpu uses 0..1 depth; no Y flip needed for NDC orientation.
    OPENGL_TO_WGPU_MATRIX * Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Degrees of yaw per second for one unit of auto-rotate speed: a full
/// turn per minute.
const AUTO_ORBIT_DEG_PER_SEC: f32 = 360.0 / 60.0;

/// Orbit camera rig for the 3D viewport.
///
/// Pitch is dolly's convention (negative looks down from above); the
/// polar angle handed to the orbit controller measures from the vertical
/// axis, so `polar = 90 deg + pitch`.
pub struct OrbitCamera {
    rig: CameraRig,
    /// Vertical FOV in degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    auto_rotate: bool,
    auto_rotate_speed: f32,
    min_polar: f32,
    max_polar: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, yaw: f32, pitch: f32, distance: f32) -> Self {
        let rig = CameraRig::builder()
            .with(YawPitch::new().yaw_degrees(yaw).pitch_degrees(pitch))
            .with(Smooth::new_rotation(0.0))
            .with(Arm::new(mint::Vector3 {
                x: 0.0,
                y: 0.0,
                z: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            }))
            .with(Smooth::new_position(0.0))
            .with(
                LookAt::new(mint::Point3 {
                    x: target.x,
                    y: target.y,
                    z: target.z,
                })
                .tracking_smoothness(0.0),
            )
            .build();

        Self {
            rig,
            fov: CAMERA_FOV_DEG,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            auto_rotate: false,
            auto_rotate_speed: 0.0,
            min_polar: -WIDE_POLAR,
            max_polar: WIDE_POLAR,
        }
    }

    /// Camera at the stock start position, distance pulled onto the
    /// allowed orbit shell.
    pub fn from_start(target: Vec3) -> Self {
        let offset = CAMERA_START - target;
        let distance = offset.length();
        let yaw = offset.x.atan2(offset.z).to_degrees();
        let pitch = -(offset.y / distance.max(1e-6)).asin().to_degrees();
        Self::new(target, yaw, pitch, distance)
    }

    /// Orbit around target (drag)
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let sensitivity = 0.5;
        self.rig.driver_mut::<YawPitch>().rotate_yaw_pitch(
            -delta_x * sensitivity,
            -delta_y * sensitivity,
        );
    }

    /// Dolly in/out (scroll); distance stays on the orbit shell
    pub fn zoom(&mut self, delta: f32) {
        let arm = self.rig.driver_mut::<Arm>();
        let current = arm.offset.z;
        let sensitivity = 0.002 * current.max(1.0);
        let factor = 1.0 - delta * sensitivity;
        arm.offset.z = (current * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Get current distance from target
    pub fn distance(&self) -> f32 {
        self.rig.driver::<Arm>().offset.z
    }

    /// Set distance from target
    pub fn set_distance(&mut self, dist: f32) {
        self.rig.driver_mut::<Arm>().offset.z = dist.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Get yaw and pitch angles in degrees (from final transform)
    pub fn angles(&self) -> (f32, f32) {
        let rot = self.rig.final_transform.rotation;
        let q = glam::Quat::from_xyzw(rot.v.x, rot.v.y, rot.v.z, rot.s);
        let (yaw, pitch, _) = q.to_euler(glam::EulerRot::YXZ);
        (yaw.to_degrees(), pitch.to_degrees())
    }

    /// Set yaw and pitch angles in degrees
    pub fn set_angles(&mut self, yaw: f32, pitch: f32) {
        let yp = self.rig.driver_mut::<YawPitch>();
        yp.set_rotation_quat(mint::Quaternion::from(glam::Quat::from_euler(
            glam::EulerRot::YXZ,
            yaw.to_radians(),
            pitch.to_radians(),
            0.0,
        )));
    }

    /// Update camera (call each frame). Applies the auto-rotation and the
    /// polar clamp before ticking the rig.
    pub fn update(&mut self, dt: f32) {
        if self.auto_rotate {
            let yaw_delta = AUTO_ORBIT_DEG_PER_SEC * self.auto_rotate_speed * dt;
            self.rig
                .driver_mut::<YawPitch>()
                .rotate_yaw_pitch(yaw_delta, 0.0);
        }

        if self.min_polar <= self.max_polar {
            let yp = self.rig.driver_mut::<YawPitch>();
            let polar = (90.0 + yp.pitch_degrees).to_radians();
            let clamped = polar.clamp(self.min_polar, self.max_polar);
            if (clamped - polar).abs() > f32::EPSILON {
                yp.pitch_degrees = clamped.to_degrees() - 90.0;
            }
        }

        self.rig.update(dt);
    }

    /// Get camera position
    pub fn position(&self) -> Vec3 {
        let p = self.rig.final_transform.position;
        Vec3::new(p.x, p.y, p.z)
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        let t = &self.rig.final_transform;
        let pos = Vec3::new(t.position.x, t.position.y, t.position.z);
        let fwd: Vec3 = t.forward();
        let up: Vec3 = t.up();
        Mat4::look_at_rh(pos, pos + fwd, up)
    }

    /// Get projection matrix
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        wgpu_projection(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_proj_matrix(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_start(Vec3::ZERO)
    }
}

impl OrbitControls for OrbitCamera {
    fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    fn set_auto_rotate_speed(&mut self, speed: f32) {
        self.auto_rotate_speed = speed;
    }

    fn set_polar_bounds(&mut self, min: f32, max: f32) {
        self.min_polar = min;
        self.max_polar = max;
    }

    fn polar_angle(&self) -> f32 {
        (90.0 + self.rig.driver::<YawPitch>().pitch_degrees).to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_framing() {
        let cam = OrbitCamera::default();
        // Stock start sits north-west of the subject, above the horizon,
        // pulled onto the orbit shell.
        assert!((cam.distance() - MAX_DISTANCE).abs() < 1e-4);
        let polar = cam.polar_angle();
        assert!((polar.to_degrees() - 70.5).abs() < 0.2);
    }

    #[test]
    fn test_polar_angle_mapping() {
        let mut cam = OrbitCamera::new(Vec3::ZERO, 0.0, -20.0, 9.0);
        cam.update(0.0);
        assert!((cam.polar_angle().to_degrees() - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_pinned_bounds_clamp_pitch() {
        let mut cam = OrbitCamera::new(Vec3::ZERO, 0.0, -50.0, 9.0);
        let pinned = 70.0_f32.to_radians();
        cam.set_polar_bounds(pinned, pinned);
        cam.update(1.0 / 60.0);
        assert!((cam.polar_angle() - pinned).abs() < 1e-4);
    }

    #[test]
    fn test_auto_rotate_advances_yaw() {
        let mut cam = OrbitCamera::new(Vec3::ZERO, 0.0, -20.0, 9.0);
        cam.update(0.0);
        let before = cam.position();
        cam.set_auto_rotate(true);
        cam.set_auto_rotate_speed(-3.0);
        cam.update(1.0);
        let after = cam.position();
        // -18 degrees of yaw in one second moves the camera sideways.
        assert!((before - after).length() > 1.0);
        assert!((before.length() - after.length()).abs() < 1e-3);
    }

    #[test]
    fn test_distance_stays_on_shell() {
        let mut cam = OrbitCamera::new(Vec3::ZERO, 0.0, -20.0, 9.0);
        cam.zoom(10_000.0);
        assert!(cam.distance() >= MIN_DISTANCE - 1e-5);
        cam.zoom(-10_000.0);
        assert!(cam.distance() <= MAX_DISTANCE + 1e-5);
    }
}
