pub mod app;
pub mod assets;
pub mod config;
pub mod editor;
pub mod render;
pub mod scene;
pub mod world;

pub use app::{EditorApp, EditorError};
pub use config::EditorConfig;

use assets::ThreadedAssetLoader;
use editor::{ControlEdit, PointerEvent};
use render::{NullRenderBackend, SurfaceRect};

const HEADLESS_FRAMES: u32 = 3;

/// Runs a scripted headless session: places one panel at the center of the
/// view, turns it toward the sun, renders a few frames and tears down.
pub fn run(config: EditorConfig) -> Result<(), EditorError> {
    let bounds = SurfaceRect::from_size(config.surface.width as f32, config.surface.height as f32);
    let mut app = EditorApp::new(config);
    app.init(
        Some(Box::new(NullRenderBackend::default())),
        bounds,
        Box::new(ThreadedAssetLoader::new()),
    )?;

    app.apply_control(ControlEdit::PlacementMode(true));
    let outcome = app.pointer_down(PointerEvent::on_surface(bounds.width * 0.5, bounds.height * 0.5));
    log::info!("[app] center click -> {outcome:?}");

    let sun_azimuth = app
        .lights()
        .map(|lights| lights.sun_angles().azimuth_degrees)
        .unwrap_or_default();
    app.apply_control(ControlEdit::PanelTilt(30.0));
    app.apply_control(ControlEdit::PanelAzimuth(sun_azimuth));

    let stats = app.run_frames(HEADLESS_FRAMES)?;
    app.pump_asset_events();
    log::info!(
        "[app] {} panel(s), {} frame(s) drawing {} mesh(es)",
        app.store().len(),
        stats.frames,
        stats.last_draw_count
    );

    app.destroy();
    Ok(())
}
