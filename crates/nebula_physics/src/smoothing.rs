use glam::Vec2;

/// One exponential smoothing step, applied independently per axis:
/// `current + (target - current) * falloff`
pub fn smooth_toward(current: Vec2, target: Vec2, falloff: f32) -> Vec2 {
    current + (target - current) * falloff
}
