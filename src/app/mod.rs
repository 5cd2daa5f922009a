use crate::assets::AssetLoader;
use crate::config::{ConfigError, EditorConfig};
use crate::editor::{
    ControlEdit, ControlSurface, ControlTargets, PanelStore, PickOutcome, PickScene,
    PickingController, PointerEvent,
};
use crate::render::{FrameSubmission, RenderBackend, RenderError, RenderSurface, SurfaceRect};
use crate::scene::SceneGraph;
use crate::scene::pick::{GeometricPicker, PickingBackend};
use crate::world::{Ground, LightRig};
use std::time::Instant;
use thiserror::Error;

const TARGET_FRAME_TIME: f32 = 1.0 / 60.0;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no render surface was provided")]
    SurfaceMissing,
    #[error("editor has already been destroyed")]
    Destroyed,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EditorError {
    /// Whether a running session has to stop. Recoverable frame errors
    /// only cost the frame they happened in.
    pub fn is_fatal(&self) -> bool {
        match self {
            EditorError::Render(err) => err.is_fatal(),
            EditorError::SurfaceMissing | EditorError::Destroyed | EditorError::Config(_) => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub total_time: f32,
    pub average_frame_time: f32,
    pub last_draw_count: usize,
}

/// Teardown stages, in the order [`EditorApp::destroy`] runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    StopRedraw,
    DetachInput,
    DisposeControls,
    DisposePanels,
    DisposeEnvironment,
    ReleaseSurface,
}

/// Owns every editor component. Input callbacks (`pointer_down`,
/// `apply_control`, `resize`, `pump_asset_events`) mutate the model; `tick`
/// only renders it.
pub struct EditorApp {
    config: EditorConfig,
    picker: Box<dyn PickingBackend>,
    scene: SceneGraph,
    store: PanelStore,
    picking: PickingController,
    surface: Option<RenderSurface>,
    lights: Option<LightRig>,
    ground: Option<Ground>,
    controls: Option<ControlSurface>,
    loader: Option<Box<dyn AssetLoader>>,
    redraw_active: bool,
    input_attached: bool,
    destroyed: bool,
    stats: FrameStats,
    teardown_log: Vec<TeardownStep>,
}

impl EditorApp {
    pub fn new(config: EditorConfig) -> Self {
        let store = PanelStore::new(config.panel.clone());
        Self {
            config,
            picker: Box::new(GeometricPicker),
            scene: SceneGraph::new(),
            store,
            picking: PickingController::new(),
            surface: None,
            lights: None,
            ground: None,
            controls: None,
            loader: None,
            redraw_active: false,
            input_attached: false,
            destroyed: false,
            stats: FrameStats::default(),
            teardown_log: Vec::new(),
        }
    }

    pub fn with_picking_backend(mut self, picker: Box<dyn PickingBackend>) -> Self {
        self.picker = picker;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    /// Brings the editor up on `backend`. Everything is validated before
    /// anything is constructed, so a failure leaves the editor inert.
    pub fn init(
        &mut self,
        backend: Option<Box<dyn RenderBackend>>,
        bounds: SurfaceRect,
        mut loader: Box<dyn AssetLoader>,
    ) -> Result<(), EditorError> {
        if self.destroyed {
            return Err(EditorError::Destroyed);
        }
        if self.is_initialized() {
            return Ok(());
        }

        if let Err(err) = self.config.validate() {
            log::error!("[app] refusing to start: {err}");
            return Err(err.into());
        }
        let Some(backend) = backend else {
            log::error!("[app] render surface missing; initialization aborted");
            return Err(EditorError::SurfaceMissing);
        };
        let surface = match RenderSurface::attach(&self.config.camera, backend, bounds) {
            Ok(surface) => surface,
            Err(err) => {
                log::error!("[app] render surface unusable: {err}");
                return Err(err.into());
            }
        };

        let lights = LightRig::new(&mut self.scene, &self.config.lighting);
        let ground = Ground::new(&mut self.scene, &self.config.ground, loader.as_mut());
        let controls = ControlSurface::attach(&mut self.store, &lights, &self.picking);

        self.surface = Some(surface);
        self.lights = Some(lights);
        self.ground = Some(ground);
        self.controls = Some(controls);
        log::info!("[app] editor initialized (assets via {})", loader.label());
        self.loader = Some(loader);
        self.input_attached = true;
        self.redraw_active = true;
        Ok(())
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> PickOutcome {
        if !self.input_attached {
            return PickOutcome::Ignored;
        }
        let Some(surface) = self.surface.as_ref() else {
            return PickOutcome::Ignored;
        };
        let pick = PickScene {
            camera: surface.camera(),
            bounds: surface.bounds(),
            ground: self.ground.as_ref().and_then(Ground::handle),
            backend: self.picker.as_ref(),
        };
        let outcome = self
            .picking
            .pointer_down(&event, &pick, &mut self.store, &mut self.scene);
        log::debug!("[app] pointer down -> {outcome:?}");
        self.sync_controls();
        outcome
    }

    pub fn apply_control(&mut self, edit: ControlEdit) -> bool {
        if !self.input_attached {
            return false;
        }
        let (Some(controls), Some(lights)) = (self.controls.as_mut(), self.lights.as_mut()) else {
            return false;
        };
        controls.apply(
            edit,
            ControlTargets {
                store: &mut self.store,
                scene: &mut self.scene,
                lights,
                picking: &mut self.picking,
            },
        )
    }

    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if !self.input_attached {
            return false;
        }
        self.surface
            .as_mut()
            .is_some_and(|surface| surface.resize(width, height))
    }

    /// Applies finished asset loads. Returns how many were applied; the rest
    /// belonged to released owners and were dropped.
    pub fn pump_asset_events(&mut self) -> usize {
        let Some(loader) = self.loader.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        for event in loader.poll_completed() {
            let accepted = match self.ground.as_mut() {
                Some(ground) => ground.apply_texture(&mut self.scene, event),
                None => false,
            };
            if accepted {
                applied += 1;
            }
        }
        applied
    }

    /// One redraw step. Renders the current model and never mutates it.
    pub fn tick(&mut self, delta_seconds: f32) -> Result<Option<FrameSubmission>, EditorError> {
        if !self.redraw_active {
            return Ok(None);
        }
        let Some(surface) = self.surface.as_mut() else {
            return Ok(None);
        };
        let submission = surface.render(&self.scene, delta_seconds)?;

        let stats = &mut self.stats;
        stats.frames += 1;
        stats.total_time += delta_seconds;
        stats.average_frame_time = stats.total_time / stats.frames as f32;
        stats.last_draw_count = submission.draw_count;
        Ok(Some(submission))
    }

    /// Drives `frames` redraw ticks with wall-clock deltas.
    pub fn run_frames(&mut self, frames: u32) -> Result<FrameStats, EditorError> {
        let mut last_frame = Instant::now();
        for _ in 0..frames {
            let now = Instant::now();
            let raw_delta = now.duration_since(last_frame).as_secs_f32();
            let delta_seconds = if raw_delta == 0.0 {
                TARGET_FRAME_TIME
            } else {
                raw_delta
            };
            last_frame = now;

            if self.tick(delta_seconds)?.is_none() {
                break;
            }
        }
        log::debug!(
            "[app] {} frame(s), avg {:.4}s",
            self.stats.frames,
            self.stats.average_frame_time
        );
        Ok(self.stats)
    }

    /// Tears the editor down in a fixed order. Safe to call repeatedly and
    /// on an editor that never finished initializing.
    pub fn destroy(&mut self) {
        if self.redraw_active {
            self.redraw_active = false;
            self.record(TeardownStep::StopRedraw);
        }
        if self.input_attached {
            self.input_attached = false;
            self.record(TeardownStep::DetachInput);
        }
        if let Some(mut controls) = self.controls.take() {
            controls.detach(&mut self.store);
            self.record(TeardownStep::DisposeControls);
        }
        if !self.store.is_empty() || self.store.selected_id().is_some() {
            self.store.dispose(&mut self.scene);
            self.record(TeardownStep::DisposePanels);
        }
        let lights_live = self.lights.as_ref().is_some_and(|lights| !lights.is_disposed());
        let ground_live = self.ground.as_ref().is_some_and(|ground| ground.handle().is_some());
        if lights_live || ground_live {
            if let Some(lights) = self.lights.as_mut() {
                lights.dispose(&mut self.scene);
            }
            if let Some(ground) = self.ground.as_mut() {
                ground.dispose(&mut self.scene);
            }
            if let Some(loader) = self.loader.as_mut() {
                loader.shutdown();
            }
            self.record(TeardownStep::DisposeEnvironment);
        }
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
            self.record(TeardownStep::ReleaseSurface);
        }

        if !self.destroyed {
            let leftover = self.scene.clear();
            if leftover > 0 {
                log::warn!("[app] {leftover} scene node(s) outlived teardown");
            }
            self.destroyed = true;
            log::info!("[app] editor destroyed");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn redraw_active(&self) -> bool {
        self.redraw_active
    }

    pub fn input_attached(&self) -> bool {
        self.input_attached
    }

    pub fn teardown_log(&self) -> &[TeardownStep] {
        &self.teardown_log
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn store(&self) -> &PanelStore {
        &self.store
    }

    pub fn picking(&self) -> &PickingController {
        &self.picking
    }

    pub fn controls(&self) -> Option<&ControlSurface> {
        self.controls.as_ref()
    }

    pub fn lights(&self) -> Option<&LightRig> {
        self.lights.as_ref()
    }

    pub fn ground(&self) -> Option<&Ground> {
        self.ground.as_ref()
    }

    pub fn surface(&self) -> Option<&RenderSurface> {
        self.surface.as_ref()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    fn sync_controls(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.sync(&mut self.store, &self.picking);
        }
    }

    fn record(&mut self, step: TeardownStep) {
        log::debug!("[app] teardown: {step:?}");
        self.teardown_log.push(step);
    }
}

impl Drop for EditorApp {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::DeferredAssetLoader;
    use crate::config::GroundConfig;
    use crate::render::NullRenderBackend;

    fn untextured() -> EditorConfig {
        EditorConfig {
            ground: GroundConfig {
                texture_path: None,
                ..GroundConfig::default()
            },
            ..EditorConfig::default()
        }
    }

    fn started() -> EditorApp {
        let mut app = EditorApp::new(untextured());
        app.init(
            Some(Box::new(NullRenderBackend::default())),
            SurfaceRect::from_size(800.0, 600.0),
            Box::new(DeferredAssetLoader::new()),
        )
        .expect("editor starts");
        app
    }

    #[test]
    fn init_is_idempotent() {
        let mut app = started();
        let nodes = app.scene().len();

        app.init(
            Some(Box::new(NullRenderBackend::default())),
            SurfaceRect::from_size(800.0, 600.0),
            Box::new(DeferredAssetLoader::new()),
        )
        .expect("second init is a no-op");

        assert_eq!(app.scene().len(), nodes);
        assert_eq!(app.store().subscriber_count(), 1);
    }

    #[test]
    fn invalid_config_leaves_editor_inert() {
        let mut config = untextured();
        config.camera.near = 0.0;
        let mut app = EditorApp::new(config);

        let err = app
            .init(
                Some(Box::new(NullRenderBackend::default())),
                SurfaceRect::from_size(800.0, 600.0),
                Box::new(DeferredAssetLoader::new()),
            )
            .expect_err("invalid config");
        assert!(matches!(err, EditorError::Config(_)));
        assert!(!app.is_initialized());
        assert!(app.scene().is_empty());
    }

    #[test]
    fn tick_renders_without_mutating() {
        let mut app = started();
        let before = app.scene().len();

        let submission = app.tick(0.016).unwrap().expect("redraw active");
        assert_eq!(submission.frame_index, 1);
        // Ground plane only; lights are not meshes.
        assert_eq!(submission.draw_count, 1);
        assert_eq!(app.scene().len(), before);
    }

    #[test]
    fn run_frames_accumulates_stats() {
        let mut app = started();
        let stats = app.run_frames(3).unwrap();

        assert_eq!(stats.frames, 3);
        assert!(stats.total_time > 0.0);
        assert!((stats.average_frame_time - stats.total_time / 3.0).abs() < 1e-6);
    }

    #[test]
    fn only_lost_surfaces_stop_a_session() {
        let skipped = EditorError::from(RenderError::FrameOutOfOrder { expected: 3, got: 2 });
        assert!(!skipped.is_fatal());
        assert!(EditorError::from(RenderError::Backend("out of memory".to_string())).is_fatal());
        assert!(EditorError::Destroyed.is_fatal());
    }

    #[test]
    fn destroyed_editor_cannot_restart() {
        let mut app = started();
        app.destroy();

        let err = app
            .init(
                Some(Box::new(NullRenderBackend::default())),
                SurfaceRect::from_size(800.0, 600.0),
                Box::new(DeferredAssetLoader::new()),
            )
            .expect_err("destroyed editor stays down");
        assert!(matches!(err, EditorError::Destroyed));
        assert_eq!(app.tick(0.016).unwrap(), None);
    }
}
