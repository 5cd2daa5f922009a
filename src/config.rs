use crate::render::BackendKind;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub width: f32,
    pub thickness: f32,
    pub depth: f32,
    pub color: u32,
    pub selected_emissive: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            thickness: 0.05,
            depth: 1.7,
            color: 0x202040,
            selected_emissive: 0x0033ff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub size: f32,
    pub color: u32,
    pub fallback_color: u32,
    pub texture_path: Option<PathBuf>,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 50.0,
            color: 0x80a080,
            fallback_color: 0xaaaaaa,
            texture_path: Some(PathBuf::from("assets/satellite-imagery-example.png")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(10.0, 15.0, 25.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Radius of the sphere the sun travels on. Large enough that its rays
    /// are effectively parallel across the ground.
    pub distance: f32,
    pub ambient_intensity: f32,
    pub sun_intensity: f32,
    pub initial_azimuth_degrees: f32,
    pub initial_altitude_degrees: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            distance: 100.0,
            ambient_intensity: 1.0,
            sun_intensity: 1.0,
            initial_azimuth_degrees: 180.0,
            initial_altitude_degrees: 45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub backend: BackendKind,
    pub enable_vsync: bool,
    pub clear_color: u32,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            backend: if cfg!(feature = "render-wgpu") {
                BackendKind::Wgpu
            } else {
                BackendKind::Null
            },
            enable_vsync: true,
            clear_color: 0xabcdef,
            title: "Solar Layout".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Top-level editor configuration. Every section falls back to its defaults
/// when omitted from the JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub panel: PanelConfig,
    pub ground: GroundConfig,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub surface: SurfaceConfig,
}

impl EditorConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&source)?;
        log::info!("[app] loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let panel = &self.panel;
        if !(panel.width > 0.0 && panel.thickness > 0.0 && panel.depth > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "panel dimensions must be positive (got {} x {} x {})",
                panel.width, panel.thickness, panel.depth
            )));
        }

        if !(self.ground.size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ground size must be positive (got {})",
                self.ground.size
            )));
        }

        let camera = &self.camera;
        if !(camera.fov_y_degrees > 0.0 && camera.fov_y_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera fov must lie in (0, 180) degrees (got {})",
                camera.fov_y_degrees
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far (got {} / {})",
                camera.near, camera.far
            )));
        }
        if camera.position == camera.target {
            return Err(ConfigError::Invalid(
                "camera position and target must differ".to_string(),
            ));
        }

        if !(self.lighting.distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "light distance must be positive (got {})",
                self.lighting.distance
            )));
        }

        Ok(())
    }
}
