use bevy::log::info;
use glam::Vec2;
use nebula_core::*;
use nebula_physics::smoothing::smooth_toward;
use nebula_physics::{centers, ParticleSystem};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

/// Owns every particle system of this surface and advances them per frame.
pub struct SimulationDirector {
    systems: Vec<ParticleSystem>,
    /// Smoothed world offset (this surface's own screen displacement)
    offset: Vec2,
    offset_target: Vec2,
    /// Source of per-system seeds
    rng: ChaCha8Rng,
    /// Incremented on every rebuild (the renderer respawns visuals on change)
    generation: u32,
}

impl SimulationDirector {
    /// `seed` makes particle generation reproducible; `None` draws from the OS
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            systems: Vec::new(),
            offset: Vec2::ZERO,
            offset_target: Vec2::ZERO,
            rng,
            generation: 0,
        }
    }

    /// Discard every system and build one per window, in registry order.
    /// Safe with an empty list: the frame tick then has nothing to do.
    pub fn on_topology_changed(&mut self, windows: &[WindowRecord], controls: &ParticleControls) {
        for system in self.systems.drain(..) {
            system.dispose();
        }

        for (index, window) in windows.iter().enumerate() {
            let seed = self.rng.next_u64();
            self.systems
                .push(ParticleSystem::create(index, window, seed, controls));
        }
        self.generation = self.generation.wrapping_add(1);

        info!(
            "Rebuilt {} particle systems ({} particles each)",
            self.systems.len(),
            controls.count
        );
    }

    /// Aim the world offset at `rect`. Without easing the offset jumps there.
    pub fn set_offset_target(&mut self, rect: Rect, easing: bool) {
        self.offset_target = rect.world_offset();
        if !easing {
            self.offset = self.offset_target;
        }
    }

    /// Jump the anchor of the system built for `window_id` to `rect`, for a
    /// window whose first real placement arrives after the rebuild.
    pub fn snap_anchor(&mut self, window_id: Uuid, rect: Rect) {
        for system in self.systems.iter_mut().filter(|s| s.window_id() == window_id) {
            system.anchor = rect.center();
        }
    }

    /// Advance the whole field by one frame at session time `time`.
    ///
    /// Systems are paired with windows by the id they were built for; a
    /// system whose window is gone is left alone until the next rebuild.
    pub fn frame_tick(
        &mut self,
        time: f64,
        this_window: Option<&WindowRecord>,
        windows: &[WindowRecord],
        controls: &ParticleControls,
    ) {
        if let Some(me) = this_window {
            self.offset_target = me.rect.world_offset();
        }
        self.offset = smooth_toward(self.offset, self.offset_target, SMOOTHING_FALLOFF);

        let t = time as f32;
        for system in self.systems.iter_mut() {
            let Some(window) = windows.iter().find(|w| w.id == system.window_id()) else {
                continue;
            };

            system.anchor = smooth_toward(system.anchor, window.rect.center(), SMOOTHING_FALLOFF);
            system.rotation = Vec2::new(t * ROTATION_RATE_X, t * ROTATION_RATE_Y);

            let centers = centers::generate(time, system.surface_index(), controls);
            system.step(controls, &centers);
        }
    }

    /// Push new size/opacity into every live system without a rebuild
    pub fn refresh_render_hints(&mut self, controls: &ParticleControls) {
        for system in self.systems.iter_mut() {
            system.refresh_render_hints(controls);
        }
    }

    pub fn systems(&self) -> &[ParticleSystem] {
        &self.systems
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
