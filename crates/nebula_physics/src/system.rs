use glam::Vec2;
use nebula_core::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use super::spawn;

/// The particle field of one surface.
///
/// Its length is fixed at creation; a different `count` only takes effect on
/// the next rebuild.
pub struct ParticleSystem {
    /// Surface this system was built for
    window_id: Uuid,
    /// Registry position at rebuild time (drives colour, sphere size, skew)
    surface_index: usize,
    /// Smoothed screen-space position of the system
    pub anchor: Vec2,
    /// Cosmetic rotation (x, y) in radians
    pub rotation: Vec2,
    particles: Vec<Particle>,
    color: [f32; 3],
    hints: RenderHints,
    rng: ChaCha8Rng,
}

impl ParticleSystem {
    /// Spawn `controls.count` particles inside a sphere around the origin,
    /// each heading inward toward a random attractor.
    pub fn create(
        surface_index: usize,
        window: &WindowRecord,
        seed: u64,
        controls: &ParticleControls,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let hue = surface_index as f32 * HUE_PER_SURFACE;
        let sphere = SPAWN_RADIUS_BASE + surface_index as f32 * SPAWN_RADIUS_PER_SURFACE;

        let particles = (0..controls.count)
            .map(|_| {
                let position = spawn::sample_in_sphere(sphere, &mut rng);
                let target_center = spawn::random_center(controls.center_points, &mut rng);
                let velocity = spawn::inward_velocity(position, controls.speed, &mut rng);
                Particle {
                    position,
                    velocity,
                    target_center,
                    color_hue: hue,
                }
            })
            .collect();

        log::debug!(
            "Created particle system {} for window {} ({} particles)",
            surface_index,
            window.id,
            controls.count
        );

        Self {
            window_id: window.id,
            surface_index,
            anchor: window.rect.center(),
            rotation: Vec2::ZERO,
            particles,
            color: hsl_to_rgb(hue, 1.0, 0.5),
            hints: RenderHints {
                size: controls.size,
                opacity: controls.opacity,
            },
            rng,
        }
    }

    /// Advance every particle by one frame toward its attractor.
    ///
    /// A particle that comes within [`REACH_DISTANCE`] of its target is
    /// respawned on the reset sphere with a fresh target and velocity.
    pub fn step(&mut self, controls: &ParticleControls, centers: &[CenterPoint]) {
        let reset_radius =
            controls.reset_radius + self.surface_index as f32 * RESET_RADIUS_PER_SURFACE;
        let Self { particles, rng, .. } = self;

        for p in particles.iter_mut() {
            p.position += p.velocity * controls.speed;

            if centers.is_empty() {
                continue;
            }

            // centerPoints may have shrunk since this particle was assigned
            p.target_center %= centers.len();
            let to_target = centers[p.target_center] - p.position;

            if to_target.length() > REACH_DISTANCE {
                p.velocity += to_target * controls.attraction;
            } else {
                p.position = spawn::sample_on_sphere(reset_radius, rng);
                p.target_center = spawn::random_center(controls.center_points, rng);
                p.velocity = spawn::inward_velocity(p.position, controls.speed, rng);
            }
        }
    }

    /// Pick up new size/opacity without touching particle state
    pub fn refresh_render_hints(&mut self, controls: &ParticleControls) {
        self.hints = RenderHints {
            size: controls.size,
            opacity: controls.opacity,
        };
    }

    /// Vertex buffer for the renderer (positions are local to the system)
    pub fn draw_buffer(&self) -> Vec<DrawVertex> {
        let [r, g, b] = self.color;
        self.particles
            .iter()
            .map(|p| DrawVertex {
                position: p.position.to_array(),
                color: [r, g, b, self.hints.opacity],
            })
            .collect()
    }

    /// Release the particle buffers. The system is consumed.
    pub fn dispose(mut self) {
        log::debug!(
            "Disposing particle system {} ({} particles)",
            self.surface_index,
            self.particles.len()
        );
        self.particles.clear();
        self.particles.shrink_to_fit();
    }

    pub fn window_id(&self) -> Uuid {
        self.window_id
    }

    pub fn surface_index(&self) -> usize {
        self.surface_index
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn hints(&self) -> RenderHints {
        self.hints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centers;
    use glam::Vec3;
    use proptest::prelude::*;

    fn window(index: usize) -> WindowRecord {
        WindowRecord {
            id: Uuid::new_v4(),
            rect: Rect::new(index as f32 * 400.0, 0.0, 400.0, 300.0),
            index,
        }
    }

    fn small_controls() -> ParticleControls {
        ParticleControls {
            count: 500,
            ..ParticleControls::default()
        }
    }

    #[test]
    fn test_create_layout() {
        let controls = small_controls();
        let win = window(2);
        let system = ParticleSystem::create(2, &win, 1, &controls);

        assert_eq!(system.len(), 500);
        assert_eq!(system.window_id(), win.id);
        assert_eq!(system.anchor, Vec2::new(1000.0, 150.0));

        let sphere = SPAWN_RADIUS_BASE + 2.0 * SPAWN_RADIUS_PER_SURFACE;
        for p in system.particles() {
            assert!(p.position.length() <= sphere + 1e-2);
            assert!(p.target_center < controls.center_points as usize);
            assert!((p.color_hue - 0.2).abs() < 1e-6);
            // Inward
            assert!(p.velocity.dot(p.position) <= 0.0);
        }
    }

    #[test]
    fn test_same_seed_same_particles() {
        let controls = small_controls();
        let win = window(0);
        let a = ParticleSystem::create(0, &win, 42, &controls);
        let b = ParticleSystem::create(0, &win, 42, &controls);
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_reset_when_target_reached() {
        let controls = small_controls();
        let mut system = ParticleSystem::create(1, &window(1), 3, &controls);
        let target = Vec3::new(10.0, 20.0, 30.0);
        let centers = vec![target; controls.center_points as usize];

        // Park the first particle on its target with no velocity
        system.particles[0].position = target;
        system.particles[0].velocity = Vec3::ZERO;
        system.step(&controls, &centers);

        let p = system.particles()[0];
        let expected = controls.reset_radius + RESET_RADIUS_PER_SURFACE;
        assert!((p.position.length() - expected).abs() < 1e-2);
        assert!(p.target_center < controls.center_points as usize);
        assert!(p.velocity.dot(p.position) <= 0.0);
    }

    #[test]
    fn test_attraction_pulls_toward_target() {
        let controls = small_controls();
        let mut system = ParticleSystem::create(0, &window(0), 4, &controls);
        let centers = vec![Vec3::ZERO; controls.center_points as usize];

        system.particles[0].position = Vec3::new(100.0, 0.0, 0.0);
        system.particles[0].velocity = Vec3::ZERO;
        system.step(&controls, &centers);

        let v = system.particles()[0].velocity;
        assert!((v.x + 100.0 * controls.attraction).abs() < 1e-5);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn test_live_shrink_wraps_targets() {
        let controls = small_controls();
        let mut system = ParticleSystem::create(0, &window(0), 5, &controls);
        assert!(system.particles().iter().any(|p| p.target_center >= 1));

        let shrunk = ParticleControls {
            center_points: 1,
            ..controls
        };
        for frame in 0..120 {
            let centers = centers::generate(frame as f64 / 60.0, 0, &shrunk);
            system.step(&shrunk, &centers);
            assert!(system.particles().iter().all(|p| p.target_center == 0));
        }
    }

    #[test]
    fn test_field_stays_bounded() {
        let controls = ParticleControls {
            count: 500,
            ..ParticleControls::default()
        };
        let mut system = ParticleSystem::create(0, &window(0), 6, &controls);
        let bound = 2.5 * (controls.center_radius + controls.reset_radius);

        let mut farthest = 0.0f32;
        for frame in 0..20_000 {
            let centers = centers::generate(frame as f64 / 60.0, 0, &controls);
            system.step(&controls, &centers);
            for p in system.particles() {
                assert!(p.position.is_finite(), "frame {frame}");
                farthest = farthest.max(p.position.length());
            }
        }
        assert!(farthest < bound, "farthest {farthest} >= {bound}");
    }

    #[test]
    fn test_empty_centers_only_integrate() {
        let controls = small_controls();
        let mut system = ParticleSystem::create(0, &window(0), 7, &controls);
        let before: Vec<Particle> = system.particles().to_vec();
        system.step(&controls, &[]);
        for (a, b) in before.iter().zip(system.particles()) {
            assert_eq!(b.position, a.position + a.velocity * controls.speed);
            assert_eq!(b.velocity, a.velocity);
        }
    }

    #[test]
    fn test_refresh_hints_keeps_particles() {
        let controls = small_controls();
        let mut system = ParticleSystem::create(0, &window(0), 8, &controls);
        let before: Vec<Particle> = system.particles().to_vec();
        let edited = ParticleControls {
            size: 7.5,
            opacity: 0.3,
            ..controls
        };
        system.refresh_render_hints(&edited);

        assert_eq!(system.hints(), RenderHints { size: 7.5, opacity: 0.3 });
        assert_eq!(system.particles(), &before[..]);
        let buffer = system.draw_buffer();
        assert_eq!(buffer.len(), 500);
        assert!(buffer.iter().all(|v| v.color[3] == 0.3));
    }

    proptest! {
        #[test]
        fn prop_targets_always_index_current_centers(
            seed in any::<u64>(),
            initial in 1u32..=8,
            live in 1u32..=8,
            frames in 1usize..40,
        ) {
            let controls = ParticleControls { count: 500, center_points: initial, ..ParticleControls::default() };
            let mut system = ParticleSystem::create(0, &window(0), seed, &controls);
            let edited = ParticleControls { center_points: live, ..controls };
            for frame in 0..frames {
                let centers = centers::generate(frame as f64 / 60.0, 0, &edited);
                system.step(&edited, &centers);
                prop_assert!(system.particles().iter().all(|p| p.target_center < live as usize));
            }
        }
    }
}
