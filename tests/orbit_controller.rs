//! Integration tests for the idle auto-orbit controller.
//!
//! Drives [`IdleOrbit`] through whole sessions of pointer events and
//! frame ticks against a recording camera stub, the same seam the viewer
//! camera implements.

use turntable::orbit::{
    IdleOrbit, OrbitConfig, OrbitControls, OrbitPhase, PointerButton, Smoothing, IDEAL_POLAR,
    IDLE_TARGET_SPEED, WIDE_POLAR,
};

/// Camera stand-in. Clamps its pitch into the bounds it is handed, like
/// the real orbit camera does.
struct Rig {
    auto_rotate: bool,
    speed: f32,
    bounds: (f32, f32),
    polar: f32,
}

impl Rig {
    fn at_polar(polar: f32) -> Self {
        Self {
            auto_rotate: false,
            speed: 0.0,
            bounds: (-WIDE_POLAR, WIDE_POLAR),
            polar,
        }
    }
}

impl OrbitControls for Rig {
    fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }
    fn set_auto_rotate_speed(&mut self, speed: f32) {
        self.speed = speed;
    }
    fn set_polar_bounds(&mut self, min: f32, max: f32) {
        self.bounds = (min, max);
        self.polar = self.polar.clamp(min, max);
    }
    fn polar_angle(&self) -> f32 {
        self.polar
    }
}

#[test]
fn test_threshold_latches_until_input() {
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.3);

    // Four half-second frames put the timer exactly at the threshold,
    // which does not engage: the comparison is strict.
    for _ in 0..4 {
        orbit.advance(0.5, &mut rig);
        assert_eq!(orbit.phase(), OrbitPhase::Manual);
        assert!(!rig.auto_rotate);
    }
    assert_eq!(orbit.state().idle_timer, 2.0);

    // One more frame crosses it, and without input it never disengages.
    for frame in 0..100 {
        orbit.advance(0.5, &mut rig);
        assert_eq!(orbit.phase(), OrbitPhase::Idling, "frame {}", frame);
        assert!(rig.auto_rotate, "frame {}", frame);
    }
}

#[test]
fn test_two_frames_to_engage() {
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.3);

    orbit.advance(1.0, &mut rig);
    assert!(!orbit.state().auto_rotate_enabled);

    orbit.advance(1.5, &mut rig);
    let state = orbit.state();
    assert_eq!(state.idle_timer, 2.5);
    assert!(state.auto_rotate_enabled);
    // First idle frame: one 1% step from rest toward the target rate.
    assert!((state.auto_rotate_speed - (-0.03)).abs() < 1e-6);
    assert_eq!(rig.speed, state.auto_rotate_speed);
}

#[test]
fn test_speed_converges_then_snaps_exact() {
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.3);

    orbit.advance(2.1, &mut rig);
    for _ in 0..700 {
        orbit.advance(0.1, &mut rig);
    }

    // Inside the epsilon band the speed snaps to the target, bit exact.
    assert_eq!(orbit.state().auto_rotate_speed, IDLE_TARGET_SPEED);

    // Converged frames are idempotent: more time changes nothing.
    orbit.advance(0.1, &mut rig);
    assert_eq!(orbit.state().auto_rotate_speed, IDLE_TARGET_SPEED);
    assert_eq!(rig.speed, IDLE_TARGET_SPEED);
}

#[test]
fn test_pitch_keeps_easing_after_speed_snaps() {
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.5);

    orbit.advance(2.1, &mut rig);
    for _ in 0..700 {
        orbit.advance(0.1, &mut rig);
    }
    assert_eq!(orbit.state().auto_rotate_speed, IDLE_TARGET_SPEED);

    // The pinned pitch has no snap branch: it still moves every frame.
    let (before, _) = orbit.state().polar_bounds;
    orbit.advance(0.1, &mut rig);
    let (after, _) = orbit.state().polar_bounds;
    assert!(after != before);
    assert!((after - IDEAL_POLAR).abs() < (before - IDEAL_POLAR).abs());
}

#[test]
fn test_drag_resets_from_any_phase() {
    // While still counting up.
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.3);
    orbit.advance(1.5, &mut rig);
    orbit.pointer_down(PointerButton::Primary);
    orbit.pointer_move();
    assert_eq!(orbit.state().idle_timer, 0.0);
    assert_eq!(orbit.phase(), OrbitPhase::Manual);

    // While idling, mid-convergence.
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.3);
    orbit.advance(3.0, &mut rig);
    for _ in 0..50 {
        orbit.advance(0.1, &mut rig);
    }
    assert_eq!(orbit.phase(), OrbitPhase::Idling);

    orbit.pointer_down(PointerButton::Primary);
    orbit.pointer_move();
    let state = orbit.state();
    assert!(state.manual_active);
    assert_eq!(state.idle_timer, 0.0);
    assert!(!state.auto_rotate_enabled);
    assert_eq!(state.auto_rotate_speed, 0.0);
    assert_eq!(state.polar_bounds, (-WIDE_POLAR, WIDE_POLAR));
    assert_eq!(state.phase, OrbitPhase::Manual);

    // The next frame mirrors the reset into the camera.
    orbit.advance(1.0 / 60.0, &mut rig);
    assert!(!rig.auto_rotate);
    assert_eq!(rig.speed, 0.0);
    assert_eq!(rig.bounds, (-WIDE_POLAR, WIDE_POLAR));
}

#[test]
fn test_click_without_move_keeps_timer() {
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.3);
    orbit.advance(1.0, &mut rig);

    // Press and release without movement, then a stray hover move.
    orbit.pointer_down(PointerButton::Primary);
    orbit.pointer_up(PointerButton::Primary);
    orbit.pointer_move();

    // The hover move lands after the release, so nothing resets.
    assert_eq!(orbit.state().idle_timer, 1.0);
    orbit.advance(1.5, &mut rig);
    assert_eq!(orbit.phase(), OrbitPhase::Idling);
}

#[test]
fn test_secondary_drag_never_resets() {
    let mut orbit = IdleOrbit::new(OrbitConfig::classic());
    let mut rig = Rig::at_polar(1.3);
    orbit.advance(3.0, &mut rig);
    assert_eq!(orbit.phase(), OrbitPhase::Idling);

    // Pan drags use the secondary button and do not gate the idle orbit.
    orbit.pointer_down(PointerButton::Secondary);
    orbit.pointer_move();
    assert_eq!(orbit.phase(), OrbitPhase::Idling);
    assert!(orbit.state().idle_timer > 0.0);
}

#[test]
fn test_time_normalized_subdivision_invariance() {
    // Same wall-clock time, different frame counts, same convergence.
    let mut orbit_a = IdleOrbit::default();
    let mut orbit_b = IdleOrbit::default();
    let mut rig_a = Rig::at_polar(1.2);
    let mut rig_b = Rig::at_polar(1.2);

    orbit_a.advance(3.0, &mut rig_a);
    orbit_b.advance(3.0, &mut rig_b);

    orbit_a.advance(0.6, &mut rig_a);
    for _ in 0..6 {
        orbit_b.advance(0.1, &mut rig_b);
    }

    let a = orbit_a.state();
    let b = orbit_b.state();
    assert!((a.auto_rotate_speed - b.auto_rotate_speed).abs() < 1e-3);
    assert!((a.polar_bounds.0 - b.polar_bounds.0).abs() < 1e-3);
}

#[test]
fn test_default_smoothing_matches_classic_at_sixty_hz() {
    // At a 60 Hz frame cadence the time-normalized default reproduces
    // the per-frame legacy behavior.
    let mut modern = IdleOrbit::default();
    let mut classic = IdleOrbit::new(OrbitConfig::classic());
    let mut rig_m = Rig::at_polar(1.2);
    let mut rig_c = Rig::at_polar(1.2);

    assert!(matches!(
        modern.config().smoothing,
        Smoothing::TimeNormalized { .. }
    ));
    assert!(matches!(
        classic.config().smoothing,
        Smoothing::PerFrame { .. }
    ));

    let dt = 1.0 / 60.0;
    for _ in 0..300 {
        modern.advance(dt, &mut rig_m);
        classic.advance(dt, &mut rig_c);
    }

    assert!(modern.state().auto_rotate_enabled);
    assert!(classic.state().auto_rotate_enabled);
    assert!(
        (modern.state().auto_rotate_speed - classic.state().auto_rotate_speed).abs() < 1e-3,
        "speeds diverged: {} vs {}",
        modern.state().auto_rotate_speed,
        classic.state().auto_rotate_speed
    );
    assert!((rig_m.polar - rig_c.polar).abs() < 1e-3);
}
