pub mod ground;
pub mod lighting;
pub mod orientation;

pub use ground::{Ground, GroundTexture};
pub use lighting::{LightRig, SunAngles, sun_position};
pub use orientation::{clamp_tilt, orient, wrap_azimuth};
