pub mod clock;
pub mod director;
pub mod pipeline;
pub mod surface;

pub use director::SimulationDirector;
pub use pipeline::SimulationPlugin;
pub use surface::{PendingSurface, Surface};
