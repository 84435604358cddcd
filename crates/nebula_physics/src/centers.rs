use nebula_core::{CenterPoint, ParticleControls, CENTER_SKEW_PER_SURFACE};
use std::f64::consts::TAU;

/// Compute the moving attractors of one surface at `time` (session seconds).
///
/// Pure: identical inputs always give identical output, so surfaces that never
/// exchange attractor positions still agree on them.
pub fn generate(time: f64, surface_index: usize, controls: &ParticleControls) -> Vec<CenterPoint> {
    let n = controls.center_points as usize;
    let speed = controls.center_speed as f64;
    let radius = controls.center_radius as f64;
    let skew = surface_index as f64 * CENTER_SKEW_PER_SURFACE as f64;

    (0..n)
        .map(|i| {
            let phase = (i as f64 / n as f64) * TAU;
            let x = (time * speed + phase + skew).cos() * radius;
            let y = (time * speed * 0.7 + phase + skew).sin() * radius * 0.6;
            let z = (time * speed * 0.3 + phase + skew).sin() * radius * 0.4;
            CenterPoint::new(x as f32, y as f32, z as f32)
        })
        .collect()
}
