pub mod color;
pub mod config;
pub mod constants;
pub mod types;

pub use color::hsl_to_rgb;
pub use config::{ControlError, ControlField, ParticleControls};
pub use constants::*;
pub use types::*;
