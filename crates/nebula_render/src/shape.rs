use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowPosition};
use nebula_core::Rect;
use nebula_sim::{PendingSurface, Surface};

/// Join the session once the primary window exists with a real size, so the
/// first registered shape is the window's own.
pub fn join_session_when_placed(world: &mut World) {
    if !world.contains_resource::<PendingSurface>() {
        return;
    }
    let mut windows = world.query_filtered::<&Window, With<PrimaryWindow>>();
    let Ok(window) = windows.get_single(world) else {
        return;
    };
    let rect = window_rect(window);
    if rect.w <= 0.0 || rect.h <= 0.0 {
        return;
    }

    let Some(pending) = world.remove_resource::<PendingSurface>() else {
        return;
    };
    match pending.start(rect) {
        Ok(surface) => world.insert_resource(surface),
        Err(e) => {
            error!("Failed to join session: {e}");
            world.send_event(AppExit::error());
        }
    }
}

/// Report the primary window's screen rectangle to the registry whenever
/// the window moves or resizes.
///
/// Positions arrive in physical pixels; the registry works in logical ones.
pub fn capture_window_shape(
    windows: Query<&Window, (With<PrimaryWindow>, Changed<Window>)>,
    mut last: Local<Option<Rect>>,
    mut surface: ResMut<Surface>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let rect = window_rect(window);
    if *last == Some(rect) {
        return;
    }
    *last = Some(rect);
    surface.set_shape(rect);
}

/// Logical-pixel rectangle of `window`. An unplaced window sits at the origin.
pub fn window_rect(window: &Window) -> Rect {
    let scale = window.resolution.scale_factor();
    let position = match window.position {
        WindowPosition::At(p) => p.as_vec2() / scale,
        _ => Vec2::ZERO,
    };
    Rect::new(position.x, position.y, window.width(), window.height())
}
