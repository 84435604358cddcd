use bevy::prelude::*;

/// Marker for the screen-space camera
#[derive(Component)]
pub struct FieldCamera;

/// Orthographic camera pinned to the window's top-left corner. The default
/// 3d projection scales one world unit to one logical pixel. Screen y grows downwards, world y upwards.
pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        IsDefaultUiCamera,
        Projection::from(OrthographicProjection {
            viewport_origin: Vec2::new(0.0, 1.0),
            near: -10_000.0,
            far: 10_000.0,
            ..OrthographicProjection::default_3d()
        }),
        Transform::from_xyz(0.0, 0.0, 0.0),
        FieldCamera,
    ));

    info!("Field camera spawned");
}

/// Map a screen-space point (y down) to world space (y up)
pub fn screen_to_world(screen: Vec2) -> Vec3 {
    Vec3::new(screen.x, -screen.y, 0.0)
}
