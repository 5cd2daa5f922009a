use super::SurfaceRect;
use crate::config::CameraConfig;
use crate::scene::pick::Ray;
use glam::{Mat4, Vec2, Vec3};

/// Right-handed perspective camera looking at a fixed target, Y up.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    fov_y_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            position: config.position,
            target: config.target,
            fov_y_degrees: config.fov_y_degrees,
            aspect: 1.0,
            near: config.near,
            far: config.far,
        };
        camera.set_aspect(aspect);
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Updates the projection for a new surface shape. Degenerate ratios
    /// (zero-sized or non-finite surfaces) are ignored.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Ray from the eye through a point in normalized device coordinates
    /// (x right, y up, both in [-1, 1]).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far_point = inverse.project_point3(ndc.extend(1.0));
        Ray::new(self.position, far_point - self.position)
    }

    /// Projects a world point to client coordinates inside `bounds`.
    /// Returns `None` for points behind the camera.
    pub fn world_to_surface(&self, point: Vec3, bounds: SurfaceRect) -> Option<Vec2> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            bounds.left + (ndc.x + 1.0) * 0.5 * bounds.width,
            bounds.top + (1.0 - ndc.y) * 0.5 * bounds.height,
        ))
    }
}
