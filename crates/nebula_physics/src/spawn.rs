use glam::Vec3;
use nebula_core::{INWARD_VELOCITY_SCALE, SPEED_FACTOR_MIN, SPEED_FACTOR_SPAN};
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Random point inside a sphere: radius uniform in `[0, max_radius)`,
/// azimuth uniform in `[0, 2π)`, polar angle uniform in `[0, π)`.
pub fn sample_in_sphere(max_radius: f32, rng: &mut impl Rng) -> Vec3 {
    let radius = rng.gen_range(0.0..1.0f32) * max_radius;
    sample_on_sphere(radius, rng)
}

/// Random point on the surface of a sphere of `radius`, using the same angle
/// sampling as [`sample_in_sphere`].
pub fn sample_on_sphere(radius: f32, rng: &mut impl Rng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi = rng.gen_range(0.0..PI);

    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}

/// Velocity pointing from `position` back toward the origin, scaled by a
/// random per-particle speed factor and the global speed.
pub fn inward_velocity(position: Vec3, speed: f32, rng: &mut impl Rng) -> Vec3 {
    let factor = (SPEED_FACTOR_MIN + rng.gen_range(0.0..1.0f32) * SPEED_FACTOR_SPAN) * speed;
    -position * factor * INWARD_VELOCITY_SCALE
}

/// Uniform center index in `[0, center_points)`
pub fn random_center(center_points: u32, rng: &mut impl Rng) -> usize {
    rng.gen_range(0..center_points.max(1)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_on_sphere_has_exact_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let p = sample_on_sphere(250.0, &mut rng);
            assert!((p.length() - 250.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_in_sphere_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for _ in 0..1000 {
            assert!(sample_in_sphere(400.0, &mut rng).length() <= 400.0 + 1e-2);
        }
    }

    #[test]
    fn test_velocity_points_inward() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let pos = Vec3::new(100.0, -50.0, 20.0);
        let v = inward_velocity(pos, 1.0, &mut rng);
        assert!(v.dot(pos) < 0.0);
        let mag = v.length() / pos.length();
        assert!(mag >= SPEED_FACTOR_MIN * INWARD_VELOCITY_SCALE - 1e-6);
        assert!(mag <= (SPEED_FACTOR_MIN + SPEED_FACTOR_SPAN) * INWARD_VELOCITY_SCALE + 1e-6);
    }

    #[test]
    fn test_random_center_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        for _ in 0..500 {
            assert!(random_center(3, &mut rng) < 3);
            assert_eq!(random_center(0, &mut rng), 0);
        }
    }
}
