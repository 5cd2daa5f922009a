//! Ray intersection against scene nodes.

use super::{Geometry, Handle, NodeTransform, SceneGraph};
use glam::Vec3;

const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    fn into_local(self, transform: &NodeTransform) -> Ray {
        let inverse = transform.rotation.inverse();
        Ray {
            origin: inverse * (self.origin - transform.translation),
            direction: inverse * self.direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub handle: Handle,
    /// Ray parameter of the entry point, in world units.
    pub distance: f32,
    pub point: Vec3,
}

/// Answers "what does this ray strike" for a set of candidate handles.
///
/// Implementations return hits sorted by ascending distance and silently
/// skip candidates that are no longer live.
pub trait PickingBackend {
    fn intersect(&self, scene: &SceneGraph, ray: &Ray, candidates: &[Handle]) -> Vec<Hit>;
}

/// Analytic picker for the primitive shapes the editor creates.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeometricPicker;

impl PickingBackend for GeometricPicker {
    fn intersect(&self, scene: &SceneGraph, ray: &Ray, candidates: &[Handle]) -> Vec<Hit> {
        let mut hits: Vec<Hit> = candidates
            .iter()
            .filter_map(|&handle| {
                let node = scene.get(handle)?;
                let geometry = node.geometry()?;
                let local = ray.into_local(&node.transform);
                let distance = match *geometry {
                    Geometry::Cuboid { size, offset } => {
                        let half = size * 0.5;
                        ray_cuboid(local.origin, local.direction, offset - half, offset + half)
                    }
                    Geometry::Plane { size } => {
                        ray_plane(local.origin, local.direction, size.x * 0.5, size.y * 0.5)
                    }
                }?;
                Some(Hit {
                    handle,
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Slab test. Returns the entry distance, or the exit distance when the
/// origin is inside the box.
fn ray_cuboid(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        None
    } else if t_near >= 0.0 {
        Some(t_near)
    } else {
        Some(t_far)
    }
}

fn ray_plane(origin: Vec3, direction: Vec3, half_width: f32, half_depth: f32) -> Option<f32> {
    if direction.y.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = -origin.y / direction.y;
    if t < 0.0 {
        return None;
    }
    let point = origin + direction * t;
    (point.x.abs() <= half_width && point.z.abs() <= half_depth).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, SceneNode};
    use glam::{Quat, Vec2};

    fn unit_box(scene: &mut SceneGraph, at: Vec3) -> Handle {
        scene.add(
            SceneNode::mesh(
                "box",
                Geometry::Cuboid {
                    size: Vec3::ONE,
                    offset: Vec3::ZERO,
                },
                Material::flat(0),
            )
            .with_transform(NodeTransform::from_translation(at)),
        )
    }

    fn ground(scene: &mut SceneGraph, size: f32) -> Handle {
        scene.add(SceneNode::mesh(
            "ground",
            Geometry::Plane {
                size: Vec2::splat(size),
            },
            Material::flat(0),
        ))
    }

    #[test]
    fn downward_ray_hits_plane_at_expected_point() {
        let mut scene = SceneGraph::new();
        let plane = ground(&mut scene, 10.0);
        let ray = Ray::new(Vec3::new(1.0, 5.0, 2.0), Vec3::NEG_Y);

        let hits = GeometricPicker.intersect(&scene, &ray, &[plane]);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 5.0).abs() < 1e-5);
        assert!(hits[0].point.abs_diff_eq(Vec3::new(1.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn plane_misses_outside_its_extent() {
        let mut scene = SceneGraph::new();
        let plane = ground(&mut scene, 10.0);
        let ray = Ray::new(Vec3::new(6.0, 5.0, 0.0), Vec3::NEG_Y);

        assert!(GeometricPicker.intersect(&scene, &ray, &[plane]).is_empty());
    }

    #[test]
    fn hits_are_sorted_by_distance() {
        let mut scene = SceneGraph::new();
        let far = unit_box(&mut scene, Vec3::new(0.0, 0.0, -10.0));
        let near = unit_box(&mut scene, Vec3::new(0.0, 0.0, -3.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let hits = GeometricPicker.intersect(&scene, &ray, &[far, near]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].handle, near);
        assert_eq!(hits[1].handle, far);
        assert!((hits[0].distance - 2.5).abs() < 1e-5);
    }

    #[test]
    fn rotated_cuboid_is_intersected_in_local_space() {
        let mut scene = SceneGraph::new();
        let handle = scene.add(
            SceneNode::mesh(
                "slab",
                Geometry::Cuboid {
                    size: Vec3::new(4.0, 0.1, 0.2),
                    offset: Vec3::ZERO,
                },
                Material::flat(0),
            )
            .with_transform(NodeTransform {
                translation: Vec3::ZERO,
                rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            }),
        );

        // The long side now runs along Z, so a ray down at z = 1.5 hits.
        let along_z = Ray::new(Vec3::new(0.0, 5.0, 1.5), Vec3::NEG_Y);
        assert_eq!(GeometricPicker.intersect(&scene, &along_z, &[handle]).len(), 1);

        let along_x = Ray::new(Vec3::new(1.5, 5.0, 0.0), Vec3::NEG_Y);
        assert!(GeometricPicker.intersect(&scene, &along_x, &[handle]).is_empty());
    }

    #[test]
    fn stale_and_non_mesh_candidates_are_skipped() {
        let mut scene = SceneGraph::new();
        let live = unit_box(&mut scene, Vec3::new(0.0, 0.0, -5.0));
        let stale = unit_box(&mut scene, Vec3::new(0.0, 0.0, -2.0));
        scene.remove(stale).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let hits = GeometricPicker.intersect(&scene, &ray, &[stale, live]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].handle, live);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let mut scene = SceneGraph::new();
        let handle = unit_box(&mut scene, Vec3::new(0.0, 0.0, -5.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        assert!(GeometricPicker.intersect(&scene, &ray, &[handle]).is_empty());
    }
}
