use crate::config::LightingConfig;
use crate::scene::{Handle, NodeKind, NodeTransform, SceneGraph, SceneNode};
use glam::Vec3;

pub const SUN_AZIMUTH_RANGE: (f32, f32) = (0.0, 360.0);
pub const SUN_ALTITUDE_RANGE: (f32, f32) = (0.0, 90.0);

/// Position of a light on a sphere of radius `distance` (Y up).
///
/// Azimuth is measured from +Z toward +X, altitude from the horizon.
pub fn sun_position(azimuth_degrees: f32, altitude_degrees: f32, distance: f32) -> Vec3 {
    let azimuth = azimuth_degrees.to_radians();
    let altitude = altitude_degrees.to_radians();
    Vec3::new(
        distance * altitude.cos() * azimuth.sin(),
        distance * altitude.sin(),
        distance * altitude.cos() * azimuth.cos(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunAngles {
    pub azimuth_degrees: f32,
    pub altitude_degrees: f32,
}

/// Ambient fill plus a directional sun aimed at the origin.
pub struct LightRig {
    ambient: Option<Handle>,
    sun: Option<Handle>,
    angles: SunAngles,
    distance: f32,
}

impl LightRig {
    pub fn new(scene: &mut SceneGraph, config: &LightingConfig) -> Self {
        let ambient = scene.add(SceneNode {
            label: "AmbientLight".to_string(),
            transform: NodeTransform::default(),
            kind: NodeKind::AmbientLight {
                color: 0xffffff,
                intensity: config.ambient_intensity,
            },
        });
        let sun = scene.add(SceneNode {
            label: "SunLight".to_string(),
            transform: NodeTransform::from_translation(Vec3::new(0.0, config.distance, 0.0)),
            kind: NodeKind::DirectionalLight {
                color: 0xffffff,
                intensity: config.sun_intensity,
                target: Vec3::ZERO,
            },
        });

        let mut rig = Self {
            ambient: Some(ambient),
            sun: Some(sun),
            angles: SunAngles {
                azimuth_degrees: config.initial_azimuth_degrees,
                altitude_degrees: config.initial_altitude_degrees,
            },
            distance: config.distance,
        };
        rig.set_sun_angles(
            scene,
            config.initial_azimuth_degrees,
            config.initial_altitude_degrees,
        );
        log::debug!("[lights] ambient + sun initialized");
        rig
    }

    /// Recomputes the sun position from scratch. Angles are clamped to the
    /// ranges exposed on the control surface.
    pub fn set_sun_angles(&mut self, scene: &mut SceneGraph, azimuth_degrees: f32, altitude_degrees: f32) {
        if !azimuth_degrees.is_finite() || !altitude_degrees.is_finite() {
            log::warn!("[lights] ignoring non-finite sun angles");
            return;
        }
        self.angles = SunAngles {
            azimuth_degrees: azimuth_degrees.clamp(SUN_AZIMUTH_RANGE.0, SUN_AZIMUTH_RANGE.1),
            altitude_degrees: altitude_degrees.clamp(SUN_ALTITUDE_RANGE.0, SUN_ALTITUDE_RANGE.1),
        };

        let Some(sun) = self.sun else {
            return;
        };
        let position = self.sun_position();
        if let Some(node) = scene.get_mut(sun) {
            node.transform.translation = position;
        } else {
            log::debug!("[lights] sun node already released");
        }
    }

    pub fn sun_angles(&self) -> SunAngles {
        self.angles
    }

    pub fn sun_position(&self) -> Vec3 {
        sun_position(
            self.angles.azimuth_degrees,
            self.angles.altitude_degrees,
            self.distance,
        )
    }

    pub fn sun_handle(&self) -> Option<Handle> {
        self.sun
    }

    pub fn is_disposed(&self) -> bool {
        self.ambient.is_none() && self.sun.is_none()
    }

    pub fn dispose(&mut self, scene: &mut SceneGraph) {
        for handle in [self.ambient.take(), self.sun.take()].into_iter().flatten() {
            if scene.remove(handle).is_err() {
                log::debug!("[lights] light {handle:?} was already released");
            }
        }
    }
}
