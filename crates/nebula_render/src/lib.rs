pub mod camera;
pub mod particles;
pub mod plugin;
pub mod shape;
pub mod ui;

pub use plugin::NebulaRenderPlugin;
