use solar_layout::EditorConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("[app] {err}");
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::default(),
    };

    match launch(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("[app] {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "render-wgpu")]
fn launch(config: EditorConfig) -> Result<(), solar_layout::EditorError> {
    use solar_layout::assets::ThreadedAssetLoader;
    use solar_layout::render::BackendKind;

    match config.surface.backend {
        BackendKind::Wgpu => solar_layout::render::window::run_desktop(
            config,
            Box::new(ThreadedAssetLoader::new()),
        ),
        BackendKind::Null => solar_layout::run(config),
    }
}

#[cfg(not(feature = "render-wgpu"))]
fn launch(config: EditorConfig) -> Result<(), solar_layout::EditorError> {
    if config.surface.backend != solar_layout::render::BackendKind::Null {
        log::warn!("[app] built without the render-wgpu feature; running headless");
    }
    solar_layout::run(config)
}
