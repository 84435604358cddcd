pub mod centers;
pub mod smoothing;
pub mod spawn;
pub mod system;

pub use system::ParticleSystem;
