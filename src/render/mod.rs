mod camera;
#[cfg(feature = "render-wgpu")]
pub mod window;

pub use camera::Camera;

use crate::config::CameraConfig;
use crate::scene::{NodeKind, SceneGraph};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Null,
    Wgpu,
}

/// Displayed rectangle of the render surface in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_usable(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    pub frame_index: u64,
    pub delta_seconds: f32,
    pub elapsed_seconds: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSubmission {
    pub frame_index: u64,
    pub draw_count: usize,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer expected frame {expected} but backend produced {got}")]
    FrameOutOfOrder { expected: u64, got: u64 },
    #[error("render surface is unusable ({width} x {height})")]
    UnusableSurface { width: f32, height: f32 },
    #[error("renderer has been disposed")]
    Disposed,
    #[error("render backend failure: {0}")]
    Backend(String),
}

impl RenderError {
    /// Whether the render surface can no longer produce frames. Other
    /// errors cost one frame and the next redraw tries again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::Disposed | RenderError::Backend(_))
    }
}

pub type RenderResult<T> = Result<T, RenderError>;

pub trait RenderBackend: Send {
    fn label(&self) -> &'static str;

    fn initialize(&mut self, _bounds: SurfaceRect) -> RenderResult<()> {
        Ok(())
    }

    fn render_frame(
        &mut self,
        inputs: &FrameInputs,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> RenderResult<FrameSubmission>;

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn dispose(&mut self) {}
}

pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    frame_index: u64,
    elapsed_seconds: f32,
    disposed: bool,
}

impl Renderer {
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            backend,
            frame_index: 0,
            elapsed_seconds: 0.0,
            disposed: false,
        }
    }

    pub fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &Camera,
        delta_seconds: f32,
    ) -> RenderResult<FrameSubmission> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        let next_index = self.frame_index + 1;
        let elapsed = self.elapsed_seconds + delta_seconds;
        let inputs = FrameInputs {
            frame_index: next_index,
            delta_seconds,
            elapsed_seconds: elapsed,
        };

        let submission = self.backend.render_frame(&inputs, scene, camera)?;
        if submission.frame_index != next_index {
            return Err(RenderError::FrameOutOfOrder {
                expected: next_index,
                got: submission.frame_index,
            });
        }

        self.frame_index = next_index;
        self.elapsed_seconds = elapsed;
        Ok(submission)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.disposed {
            self.backend.resize(width, height);
        }
    }

    /// Releases the backend. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.backend.dispose();
        self.disposed = true;
        log::info!(
            "[render] {} disposed after {} frame(s)",
            self.backend.label(),
            self.frame_index
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }
}

/// Headless backend: walks the scene and reports how many meshes it would
/// have drawn.
#[derive(Debug, Default)]
pub struct NullRenderBackend;

impl RenderBackend for NullRenderBackend {
    fn label(&self) -> &'static str {
        "Null Render Backend"
    }

    fn render_frame(
        &mut self,
        inputs: &FrameInputs,
        scene: &SceneGraph,
        _camera: &Camera,
    ) -> RenderResult<FrameSubmission> {
        let draw_count = scene
            .iter()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Mesh { .. }))
            .count();
        log::trace!(
            "[render] frame {} (dt {:.3} s) - {} mesh(es)",
            inputs.frame_index,
            inputs.delta_seconds,
            draw_count
        );

        Ok(FrameSubmission {
            frame_index: inputs.frame_index,
            draw_count,
        })
    }
}

/// The drawable surface: renderer, camera and the displayed rectangle.
pub struct RenderSurface {
    renderer: Renderer,
    camera: Camera,
    bounds: SurfaceRect,
}

impl RenderSurface {
    /// Binds a backend to a displayed rectangle. Fails without touching the
    /// backend when the rectangle cannot be drawn into.
    pub fn attach(
        camera: &CameraConfig,
        mut backend: Box<dyn RenderBackend>,
        bounds: SurfaceRect,
    ) -> RenderResult<Self> {
        if !bounds.is_usable() {
            return Err(RenderError::UnusableSurface {
                width: bounds.width,
                height: bounds.height,
            });
        }
        backend.initialize(bounds)?;
        log::info!(
            "[render] attached {} ({} x {})",
            backend.label(),
            bounds.width,
            bounds.height
        );

        Ok(Self {
            renderer: Renderer::new(backend),
            camera: Camera::new(camera, bounds.aspect()),
            bounds,
        })
    }

    pub fn render(&mut self, scene: &SceneGraph, delta_seconds: f32) -> RenderResult<FrameSubmission> {
        self.renderer.render(scene, &self.camera, delta_seconds)
    }

    /// Applies a new displayed size. Degenerate sizes are ignored.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let bounds = SurfaceRect::new(self.bounds.left, self.bounds.top, width, height);
        if !bounds.is_usable() {
            log::debug!("[render] ignoring resize to {width} x {height}");
            return false;
        }
        self.bounds = bounds;
        self.camera.set_aspect(bounds.aspect());
        self.renderer.resize(width as u32, height as u32);
        true
    }

    pub fn dispose(&mut self) {
        self.renderer.dispose();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn bounds(&self) -> SurfaceRect {
        self.bounds
    }
}
