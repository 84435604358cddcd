use bevy::app::AppExit;
use bevy::prelude::*;

use super::clock;
use super::surface::Surface;

/// Bevy plugin driving the shared field once per frame
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Nothing runs until the window has joined the session
        app.add_systems(Update, simulation_tick.run_if(resource_exists::<Surface>))
            .add_systems(Last, leave_session_on_exit.run_if(resource_exists::<Surface>));
    }
}

/// Main simulation tick: registry, broadcasts, then particles
pub fn simulation_tick(mut surface: ResMut<Surface>) {
    surface.update(clock::session_time());
}

/// Drop our registry record as soon as the app is asked to quit
fn leave_session_on_exit(mut exits: EventReader<AppExit>, mut surface: ResMut<Surface>) {
    if exits.read().next().is_some() {
        surface.close();
    }
}
