use bevy::color::Alpha;
use bevy::prelude::*;
use nebula_core::RenderHints;
use nebula_sim::Surface;

use super::camera::screen_to_world;

/// Root entity of one particle system. Children are its particles.
#[derive(Component)]
pub struct SystemVisual {
    pub index: usize,
    pub material: Handle<StandardMaterial>,
    pub hints: RenderHints,
}

/// Marker for particle point entities in the render world
#[derive(Component)]
pub struct ParticlePoint {
    pub system: usize,
    pub index: usize,
}

/// Director generation the current visuals were built from
#[derive(Resource, Default)]
pub struct VisualGeneration(pub Option<u32>);

/// Throw away every visual and respawn from the director whenever it has
/// rebuilt its systems.
pub fn sync_particle_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut built: ResMut<VisualGeneration>,
    surface: Res<Surface>,
    existing: Query<Entity, With<SystemVisual>>,
) {
    let director = surface.director();
    if built.0 == Some(director.generation()) {
        return;
    }

    // Unit-diameter low-poly sphere, scaled to the point size
    let mesh = match Sphere::new(0.5).mesh().ico(0) {
        Ok(mesh) => meshes.add(mesh),
        Err(e) => {
            error!("Failed to build particle mesh: {e}");
            return;
        }
    };
    built.0 = Some(director.generation());

    for entity in existing.iter() {
        commands.entity(entity).despawn_recursive();
    }

    let mut spawned = 0;

    for (system_idx, system) in director.systems().iter().enumerate() {
        let hints = system.hints();
        let material = materials.add(point_material(system.color(), hints.opacity));

        commands
            .spawn((
                Transform::default(),
                Visibility::default(),
                SystemVisual {
                    index: system_idx,
                    material: material.clone(),
                    hints,
                },
            ))
            .with_children(|parent| {
                for (index, vertex) in system.draw_buffer().iter().enumerate() {
                    parent.spawn((
                        Mesh3d(mesh.clone()),
                        MeshMaterial3d(material.clone()),
                        Transform::from_translation(Vec3::from_array(vertex.position))
                            .with_scale(Vec3::splat(hints.size)),
                        ParticlePoint {
                            system: system_idx,
                            index,
                        },
                    ));
                }
            });
        spawned += system.len();
    }

    info!(
        "Spawned {} particle visuals for {} systems",
        spawned,
        director.systems().len()
    );
}

/// Place each system at its window's anchor shifted by the world offset and
/// copy particle positions, size and opacity from the simulation.
pub fn update_particle_visuals(
    surface: Res<Surface>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut systems_q: Query<(&mut Transform, &mut SystemVisual), Without<ParticlePoint>>,
    mut points_q: Query<(&mut Transform, &ParticlePoint), Without<SystemVisual>>,
) {
    let director = surface.director();
    let systems = director.systems();
    let offset = director.offset();

    for (mut transform, mut visual) in systems_q.iter_mut() {
        let Some(system) = systems.get(visual.index) else {
            continue;
        };
        transform.translation = screen_to_world(system.anchor + offset);
        transform.rotation =
            Quat::from_euler(EulerRot::XYZ, system.rotation.x, system.rotation.y, 0.0);

        let hints = system.hints();
        if hints != visual.hints {
            if let Some(material) = materials.get_mut(&visual.material) {
                material.base_color.set_alpha(hints.opacity);
            }
            visual.hints = hints;
        }
    }

    let buffers: Vec<_> = systems.iter().map(|s| (s.draw_buffer(), s.hints())).collect();
    for (mut transform, point) in points_q.iter_mut() {
        let Some((buffer, hints)) = buffers.get(point.system) else {
            continue;
        };
        let Some(vertex) = buffer.get(point.index) else {
            continue;
        };
        transform.translation = Vec3::from_array(vertex.position);
        transform.scale = Vec3::splat(hints.size);
    }
}

/// Additive unlit material, one per system
fn point_material(color: [f32; 3], opacity: f32) -> StandardMaterial {
    let base = Color::srgba(color[0], color[1], color[2], opacity);
    StandardMaterial {
        base_color: base,
        unlit: true,
        alpha_mode: AlphaMode::Add,
        ..default()
    }
}
