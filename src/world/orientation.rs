//! Panel orientation from its two user-facing angles.

use glam::{Quat, Vec3};

pub const TILT_MIN_DEGREES: f32 = -90.0;
pub const TILT_MAX_DEGREES: f32 = 90.0;
pub const FULL_TURN_DEGREES: f32 = 360.0;

/// Panel-local axis the tilt rotates about (the panel's width direction).
pub const LATERAL_AXIS: Vec3 = Vec3::X;
pub const WORLD_UP: Vec3 = Vec3::Y;

/// World orientation of a panel with the given tilt and azimuth.
///
/// Tilt is applied first about the panel's own lateral axis, then azimuth
/// about the world vertical axis: `R(up, azimuth) * R(lateral, tilt)`. The
/// azimuth therefore swings the already-tilted panel around, and the tilt
/// direction stays tied to the panel's facing.
pub fn orient(tilt_degrees: f32, azimuth_degrees: f32) -> Quat {
    let azimuth = Quat::from_axis_angle(WORLD_UP, azimuth_degrees.to_radians());
    let tilt = Quat::from_axis_angle(LATERAL_AXIS, tilt_degrees.to_radians());
    azimuth * tilt
}

/// Wraps an azimuth into `[0, 360)`.
pub fn wrap_azimuth(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(FULL_TURN_DEGREES);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if wrapped >= FULL_TURN_DEGREES {
        0.0
    } else {
        wrapped
    }
}

pub fn clamp_tilt(degrees: f32) -> f32 {
    degrees.clamp(TILT_MIN_DEGREES, TILT_MAX_DEGREES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-5;

    fn same_rotation(a: Quat, b: Quat) -> bool {
        // q and -q encode the same rotation.
        a.abs_diff_eq(b, EPS) || a.abs_diff_eq(-b, EPS)
    }

    #[test]
    fn zero_angles_are_identity() {
        assert!(same_rotation(orient(0.0, 0.0), Quat::IDENTITY));
    }

    #[test]
    fn tilt_raises_the_panel_normal_toward_its_depth_axis() {
        let normal = orient(30.0, 0.0) * Vec3::Y;
        let expected = Vec3::new(0.0, 30f32.to_radians().cos(), 30f32.to_radians().sin());
        assert!(normal.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn azimuth_is_applied_outside_tilt() {
        let composed = orient(45.0, 90.0);
        let outside = Quat::from_rotation_y(90f32.to_radians())
            * Quat::from_rotation_x(45f32.to_radians());
        let inside = Quat::from_rotation_x(45f32.to_radians())
            * Quat::from_rotation_y(90f32.to_radians());

        assert!(same_rotation(composed, outside));
        assert!(!same_rotation(composed, inside));
    }

    #[test]
    fn wrap_azimuth_handles_edges() {
        assert_eq!(wrap_azimuth(0.0), 0.0);
        assert_eq!(wrap_azimuth(360.0), 0.0);
        assert_eq!(wrap_azimuth(450.0), 90.0);
        assert_eq!(wrap_azimuth(-90.0), 270.0);
        assert_eq!(wrap_azimuth(-1e-9), 0.0);
    }

    #[test]
    fn clamp_tilt_limits_range() {
        assert_eq!(clamp_tilt(120.0), 90.0);
        assert_eq!(clamp_tilt(-120.0), -90.0);
        assert_eq!(clamp_tilt(12.5), 12.5);
    }

    proptest! {
        #[test]
        fn orient_is_deterministic(tilt in -90.0f32..=90.0, azimuth in 0.0f32..360.0) {
            prop_assert_eq!(orient(tilt, azimuth), orient(tilt, azimuth));
        }

        #[test]
        fn pure_tilt_is_a_lateral_rotation(tilt in -90.0f32..=90.0) {
            let expected = Quat::from_axis_angle(LATERAL_AXIS, tilt.to_radians());
            prop_assert!(same_rotation(orient(tilt, 0.0), expected));
        }

        #[test]
        fn pure_azimuth_is_a_vertical_rotation(azimuth in 0.0f32..360.0) {
            let expected = Quat::from_axis_angle(WORLD_UP, azimuth.to_radians());
            prop_assert!(same_rotation(orient(0.0, azimuth), expected));
        }

        #[test]
        fn lateral_axis_ignores_tilt(tilt in -90.0f32..=90.0, azimuth in 0.0f32..360.0) {
            let lateral = orient(tilt, azimuth) * LATERAL_AXIS;
            let expected = Quat::from_axis_angle(WORLD_UP, azimuth.to_radians()) * LATERAL_AXIS;
            prop_assert!(lateral.abs_diff_eq(expected, 1e-4));
        }

        #[test]
        fn wrapped_azimuth_stays_in_range(degrees in -10_000.0f32..10_000.0) {
            let wrapped = wrap_azimuth(degrees);
            prop_assert!((0.0..FULL_TURN_DEGREES).contains(&wrapped));
        }
    }
}
