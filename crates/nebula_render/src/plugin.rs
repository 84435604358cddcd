use bevy::prelude::*;
use nebula_sim::Surface;
use nebula_sim::pipeline::simulation_tick;

use super::camera;
use super::particles;
use super::shape;
use super::ui;

/// Draws this window's slice of the shared field and hosts the controls
pub struct NebulaRenderPlugin;

impl Plugin for NebulaRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ui::HudThrottle>()
            .init_resource::<ui::PanelCursor>()
            .init_resource::<particles::VisualGeneration>()
            .add_systems(Startup, (camera::spawn_camera, ui::spawn_control_panel))
            .add_systems(PreUpdate, shape::join_session_when_placed)
            .add_systems(
                Update,
                (
                    shape::capture_window_shape.before(simulation_tick),
                    ui::control_input_system.before(simulation_tick),
                    (
                        particles::sync_particle_visuals,
                        particles::update_particle_visuals,
                    )
                        .chain()
                        .after(simulation_tick),
                    ui::update_control_panel.after(simulation_tick),
                )
                    .run_if(resource_exists::<Surface>),
            );
    }
}
