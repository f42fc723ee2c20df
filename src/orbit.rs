//! Idle auto-orbit camera control.
//!
//! After a stretch of time with no manual input the camera drifts into a
//! slow turntable rotation: rotation speed eases toward a target rate and
//! the pitch eases toward an ideal framing angle. Any manual drag hands
//! control straight back to the user. [`IdleOrbit`] owns all of that
//! state; the host feeds it pointer events and per-frame time deltas and
//! mirrors the result into its camera through [`OrbitControls`].

use std::f32::consts::PI;

/// Seconds without manual input before auto-rotation engages.
pub const IDLE_WAIT: f32 = 2.0;

/// Auto-rotation rate once fully converged, in turns per minute.
/// Negative spins clockwise when seen from above.
pub const IDLE_TARGET_SPEED: f32 = -3.0;

/// Convergence band around the target speed. Inside it the speed snaps
/// exactly to the target so repeated updates cannot oscillate.
pub const SPEED_EPSILON: f32 = 0.01;

/// Per-step interpolation factor of the classic smoothing mode.
pub const CLASSIC_FACTOR: f32 = 0.01;

/// Pitch the idle orbit settles toward: 20 degrees above the horizon,
/// measured as a polar angle from the vertical axis.
pub const IDEAL_POLAR: f32 = (90.0 - 20.0) * PI / 180.0;

/// Manual-mode polar limit: half a circle plus a 10 degree bias on each
/// end, wide enough to never constrain a hand-driven camera.
pub const WIDE_POLAR: f32 = PI + 10.0 * PI / 180.0;

/// Pointer buttons as delivered by the host input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button on a mouse; the only one that starts a manual drag.
    Primary,
    Secondary,
    Auxiliary,
}

/// Interpolation mode for idle convergence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// Fixed fraction of the remaining distance per `advance` call,
    /// regardless of elapsed time. Convergence speed then depends on the
    /// caller's refresh rate; kept for exact legacy behavior.
    PerFrame { factor: f32 },
    /// Frame-rate independent decay: `rate` is the fraction of the
    /// remaining distance that survives one full second, applied as
    /// `rate^dt` per step.
    TimeNormalized { rate: f32 },
}

impl Smoothing {
    /// Fraction of the remaining distance covered by one step of `dt` seconds.
    pub fn step(&self, dt: f32) -> f32 {
        match *self {
            Smoothing::PerFrame { factor } => factor,
            Smoothing::TimeNormalized { rate } => 1.0 - rate.powf(dt),
        }
    }
}

/// Tuning for the idle orbit. Defaults reproduce the stock viewer feel:
/// two seconds to engage, minus three turns per minute, settle at 70
/// degrees polar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConfig {
    /// Seconds of inactivity before auto-rotation engages.
    pub wait_threshold: f32,
    /// Rotation rate the idle orbit converges to, turns per minute.
    pub target_speed: f32,
    /// Snap band for speed convergence.
    pub epsilon: f32,
    /// Polar angle (radians) the idle orbit frames toward.
    pub ideal_polar: f32,
    /// Manual-mode polar bounds (min, max) in radians.
    pub wide_polar: (f32, f32),
    /// Convergence interpolation mode.
    pub smoothing: Smoothing,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            wait_threshold: IDLE_WAIT,
            target_speed: IDLE_TARGET_SPEED,
            epsilon: SPEED_EPSILON,
            ideal_polar: IDEAL_POLAR,
            wide_polar: (-WIDE_POLAR, WIDE_POLAR),
            // Equals the classic factor at a 60 Hz baseline: one 1/60 s
            // step removes exactly 1% of the remaining distance.
            smoothing: Smoothing::TimeNormalized {
                rate: (1.0 - CLASSIC_FACTOR).powi(60),
            },
        }
    }
}

impl OrbitConfig {
    /// Original tuning with the refresh-rate dependent per-frame factor.
    pub fn classic() -> Self {
        Self {
            smoothing: Smoothing::PerFrame {
                factor: CLASSIC_FACTOR,
            },
            ..Self::default()
        }
    }
}

/// Control phase, stored explicitly so transitions stay auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrbitPhase {
    /// User owns the camera; the idle timer is counting up.
    #[default]
    Manual,
    /// Auto-rotation is active and converging.
    Idling,
}

/// Mutable orbit-control state, owned by [`IdleOrbit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Seconds since the last manual movement input.
    pub idle_timer: f32,
    /// Whether auto-rotation is applied to the camera this frame.
    pub auto_rotate_enabled: bool,
    /// Current auto-rotation rate, turns per minute.
    pub auto_rotate_speed: f32,
    /// Camera pitch limits (min, max), radians. Wide while manual, pinned
    /// to a single converging value while idling.
    pub polar_bounds: (f32, f32),
    /// True while the primary pointer button is held down.
    pub manual_active: bool,
    /// Current control phase.
    pub phase: OrbitPhase,
}

/// Camera-control surface the orbit controller writes into each frame.
///
/// Implemented by the viewer camera; test code substitutes a recording
/// stub.
pub trait OrbitControls {
    fn set_auto_rotate(&mut self, enabled: bool);
    fn set_auto_rotate_speed(&mut self, speed: f32);
    fn set_polar_bounds(&mut self, min: f32, max: f32);
    /// Current camera pitch from the vertical axis, radians.
    fn polar_angle(&self) -> f32;
}

/// The idle auto-orbit state machine.
///
/// `Manual -> Idling` when the idle timer crosses the wait threshold;
/// `-> Manual` the instant a pointer moves while the primary button is
/// held. There is no terminal phase; the controller re-evaluates every
/// frame for the life of the session.
#[derive(Debug, Clone)]
pub struct IdleOrbit {
    config: OrbitConfig,
    state: OrbitState,
}

impl Default for IdleOrbit {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

impl IdleOrbit {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            config,
            state: OrbitState {
                idle_timer: 0.0,
                auto_rotate_enabled: false,
                auto_rotate_speed: 0.0,
                polar_bounds: config.wide_polar,
                manual_active: false,
                phase: OrbitPhase::Manual,
            },
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    pub fn phase(&self) -> OrbitPhase {
        self.state.phase
    }

    /// Primary-button press arms manual control. Other buttons (pan and
    /// dolly drags) do not gate the idle timer.
    pub fn pointer_down(&mut self, button: PointerButton) {
        if button == PointerButton::Primary {
            self.state.manual_active = true;
        }
    }

    /// Pointer movement while the primary button is held: hand control
    /// back to the user and rewind the idle machinery to its resting
    /// state. Movement without the button held is ignored.
    pub fn pointer_move(&mut self) {
        if !self.state.manual_active {
            return;
        }
        if self.state.phase == OrbitPhase::Idling {
            tracing::debug!("manual input resumed, idle orbit off");
        }
        self.state.idle_timer = 0.0;
        self.state.auto_rotate_enabled = false;
        self.state.auto_rotate_speed = 0.0;
        self.state.polar_bounds = self.config.wide_polar;
        self.state.phase = OrbitPhase::Manual;
    }

    /// Any button release ends the manual drag.
    pub fn pointer_up(&mut self, _button: PointerButton) {
        self.state.manual_active = false;
    }

    /// Advance the controller by `dt` seconds and mirror the resulting
    /// state into `controls`. Called exactly once per frame, before the
    /// camera tick and the render.
    ///
    /// `dt` is assumed non-negative; the frame driver clamps it.
    pub fn advance<C: OrbitControls>(&mut self, dt: f32, controls: &mut C) {
        self.state.idle_timer += dt;

        if self.state.idle_timer > self.config.wait_threshold {
            let step = self.config.smoothing.step(dt);
            self.state.auto_rotate_enabled = true;

            if (self.state.auto_rotate_speed - self.config.target_speed).abs()
                > self.config.epsilon
            {
                self.state.auto_rotate_speed +=
                    (self.config.target_speed - self.state.auto_rotate_speed) * step;
            } else {
                // Snap kills residual drift so converged frames are
                // idempotent.
                self.state.auto_rotate_speed = self.config.target_speed;
            }

            // Pin both bounds to the current pitch, eased toward the ideal
            // framing. The camera clamps into the pinned bounds, so the
            // pitch follows the same exponential path. Unlike the speed
            // there is no snap branch here.
            let current = controls.polar_angle();
            let pinned = current + (self.config.ideal_polar - current) * step;
            self.state.polar_bounds = (pinned, pinned);

            if self.state.phase != OrbitPhase::Idling {
                tracing::debug!(
                    idle_timer = self.state.idle_timer,
                    "idle orbit engaged"
                );
                self.state.phase = OrbitPhase::Idling;
            }
        } else {
            self.state.auto_rotate_enabled = false;
            self.state.polar_bounds = self.config.wide_polar;
            self.state.phase = OrbitPhase::Manual;
        }

        self.apply_to(controls);
    }

    /// Write the current state into the camera-control collaborator.
    pub fn apply_to<C: OrbitControls>(&self, controls: &mut C) {
        controls.set_auto_rotate(self.state.auto_rotate_enabled);
        controls.set_auto_rotate_speed(self.state.auto_rotate_speed);
        let (min, max) = self.state.polar_bounds;
        controls.set_polar_bounds(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Recording stub for the camera-control seam.
    struct StubControls {
        auto_rotate: bool,
        speed: f32,
        min_polar: f32,
        max_polar: f32,
        polar: f32,
    }

    impl StubControls {
        fn at_polar(polar: f32) -> Self {
            Self {
                auto_rotate: false,
                speed: 0.0,
                min_polar: -WIDE_POLAR,
                max_polar: WIDE_POLAR,
                polar,
            }
        }
    }

    impl OrbitControls for StubControls {
        fn set_auto_rotate(&mut self, enabled: bool) {
            self.auto_rotate = enabled;
        }
        fn set_auto_rotate_speed(&mut self, speed: f32) {
            self.speed = speed;
        }
        fn set_polar_bounds(&mut self, min: f32, max: f32) {
            self.min_polar = min;
            self.max_polar = max;
            // Mimic the real camera: pitch clamps into the bounds.
            self.polar = self.polar.clamp(min, max);
        }
        fn polar_angle(&self) -> f32 {
            self.polar
        }
    }

    #[test]
    fn test_starts_manual() {
        let orbit = IdleOrbit::default();
        assert_eq!(orbit.phase(), OrbitPhase::Manual);
        assert!(!orbit.state().auto_rotate_enabled);
        assert_eq!(orbit.state().auto_rotate_speed, 0.0);
        assert_eq!(orbit.state().polar_bounds, (-WIDE_POLAR, WIDE_POLAR));
    }

    #[test]
    fn test_below_threshold_stays_manual() {
        let mut orbit = IdleOrbit::new(OrbitConfig::classic());
        let mut cam = StubControls::at_polar(1.0);
        orbit.advance(1.9, &mut cam);
        assert_eq!(orbit.phase(), OrbitPhase::Manual);
        assert!(!cam.auto_rotate);
        assert_eq!(cam.min_polar, -WIDE_POLAR);
        assert_eq!(cam.max_polar, WIDE_POLAR);
    }

    #[test]
    fn test_threshold_crossing_engages() {
        let mut orbit = IdleOrbit::new(OrbitConfig::classic());
        let mut cam = StubControls::at_polar(1.0);
        orbit.advance(2.1, &mut cam);
        assert_eq!(orbit.phase(), OrbitPhase::Idling);
        assert!(cam.auto_rotate);
        assert!(cam.speed < 0.0);
    }

    #[test]
    fn test_bounds_pinned_while_idling() {
        let mut orbit = IdleOrbit::new(OrbitConfig::classic());
        let mut cam = StubControls::at_polar(1.5);
        orbit.advance(3.0, &mut cam);
        let (min, max) = orbit.state().polar_bounds;
        assert_eq!(min, max);
        // One 1% step from 1.5 toward the ideal framing.
        let expected = 1.5 + (IDEAL_POLAR - 1.5) * CLASSIC_FACTOR;
        assert!((min - expected).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_has_no_snap() {
        // Park the pitch within epsilon of the ideal: it must keep easing
        // rather than landing exactly, unlike the speed.
        let start = IDEAL_POLAR + 0.005;
        let mut orbit = IdleOrbit::new(OrbitConfig::classic());
        let mut cam = StubControls::at_polar(start);
        orbit.advance(2.5, &mut cam);
        let (pinned, _) = orbit.state().polar_bounds;
        assert!(pinned != IDEAL_POLAR);
        assert!(pinned < start);
    }

    #[test]
    fn test_secondary_button_does_not_arm() {
        let mut orbit = IdleOrbit::default();
        orbit.pointer_down(PointerButton::Secondary);
        assert!(!orbit.state().manual_active);
        orbit.pointer_move();
        assert_eq!(orbit.state().idle_timer, 0.0);
    }

    #[test]
    fn test_timenormalized_matches_classic_at_baseline() {
        let rate = (1.0_f32 - CLASSIC_FACTOR).powi(60);
        let step = Smoothing::TimeNormalized { rate }.step(1.0 / 60.0);
        assert!((step - CLASSIC_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn test_timenormalized_step_compounds() {
        let smoothing = Smoothing::TimeNormalized { rate: 0.5 };
        // Two half-second steps leave the same remainder as one full
        // second: (1-s)^2 == rate.
        let s = smoothing.step(0.5);
        let remainder = (1.0 - s) * (1.0 - s);
        assert!((remainder - 0.5).abs() < 1e-6);
    }
}
