// Simulation constants. Distances are in screen pixels; one step is one
// rendered frame, so velocities are pixels per frame.

/// Exponential smoothing factor applied per frame to offsets and anchors
pub const SMOOTHING_FALLOFF: f32 = 0.05;

/// A particle closer than this to its target center is respawned
pub const REACH_DISTANCE: f32 = 5.0;

/// Radius of the initial spawn sphere for the first surface
pub const SPAWN_RADIUS_BASE: f32 = 400.0;

/// Extra spawn sphere radius per surface index
pub const SPAWN_RADIUS_PER_SURFACE: f32 = 100.0;

/// Extra respawn radius per surface index (added to `resetRadius`)
pub const RESET_RADIUS_PER_SURFACE: f32 = 50.0;

/// Hue step between consecutive surfaces (hue is in turns, 0..1)
pub const HUE_PER_SURFACE: f32 = 0.1;

/// Phase skew between the attractor fields of consecutive surfaces
pub const CENTER_SKEW_PER_SURFACE: f32 = 0.5;

/// Converts an inward position vector into a per-frame velocity
pub const INWARD_VELOCITY_SCALE: f32 = 0.005;

/// Random speed factor range for spawned particles: `MIN + uniform * SPAN`
pub const SPEED_FACTOR_MIN: f32 = 0.5;
pub const SPEED_FACTOR_SPAN: f32 = 2.0;

/// Cosmetic rotation rates (radians per second of session time)
pub const ROTATION_RATE_X: f32 = 0.1;
pub const ROTATION_RATE_Y: f32 = 0.05;

/// Broadcast channel keys
pub const CONTROLS_KEY: &str = "particleControls";
pub const REBUILD_KEY: &str = "rebuildParticles";
pub const PANEL_COLLAPSED_KEY: &str = "controlPanelCollapsed";
