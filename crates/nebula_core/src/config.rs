use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared simulation parameters.
///
/// This is the snapshot that travels over the broadcast channel, so the field
/// names serialize in camelCase to match the wire form every surface reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleControls {
    /// Particles per surface (structural: applied on rebuild)
    pub count: u32,
    /// Global velocity multiplier
    pub speed: f32,
    /// Per-step attraction gain toward the target center
    pub attraction: f32,
    /// Rendered point size (no physics effect)
    pub size: f32,
    /// Rendered point opacity (no physics effect)
    pub opacity: f32,
    /// Base radius of the respawn sphere
    pub reset_radius: f32,
    /// Number of moving attractors per surface
    pub center_points: u32,
    /// Angular speed of the attractors
    pub center_speed: f32,
    /// Orbit radius of the attractors
    pub center_radius: f32,
}

impl Default for ParticleControls {
    fn default() -> Self {
        Self {
            count: 2000,
            speed: 1.0,
            attraction: 0.002,
            size: 3.0,
            opacity: 0.9,
            reset_radius: 200.0,
            center_points: 3,
            center_speed: 0.5,
            center_radius: 300.0,
        }
    }
}

impl ParticleControls {
    /// Read one field as a plain number (the form the editor works in)
    pub fn get(&self, field: ControlField) -> f64 {
        match field {
            ControlField::Count => self.count as f64,
            ControlField::Speed => self.speed as f64,
            ControlField::Attraction => self.attraction as f64,
            ControlField::Size => self.size as f64,
            ControlField::Opacity => self.opacity as f64,
            ControlField::ResetRadius => self.reset_radius as f64,
            ControlField::CenterPoints => self.center_points as f64,
            ControlField::CenterSpeed => self.center_speed as f64,
            ControlField::CenterRadius => self.center_radius as f64,
        }
    }

    /// Validate `value` against the field's declared range and store it.
    /// On error the snapshot is left untouched.
    pub fn set(&mut self, field: ControlField, value: f64) -> Result<(), ControlError> {
        if !value.is_finite() {
            return Err(ControlError::NotFinite { field });
        }
        let (min, max) = field.range();
        if value < min || value > max {
            return Err(ControlError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }

        match field {
            ControlField::Count => self.count = value.round() as u32,
            ControlField::Speed => self.speed = value as f32,
            ControlField::Attraction => self.attraction = value as f32,
            ControlField::Size => self.size = value as f32,
            ControlField::Opacity => self.opacity = value as f32,
            ControlField::ResetRadius => self.reset_radius = value as f32,
            ControlField::CenterPoints => self.center_points = value.round() as u32,
            ControlField::CenterSpeed => self.center_speed = value as f32,
            ControlField::CenterRadius => self.center_radius = value as f32,
        }
        Ok(())
    }

    /// Whether the rendering hints differ between two snapshots
    pub fn hints_differ(&self, other: &Self) -> bool {
        self.size != other.size || self.opacity != other.opacity
    }
}

/// One editable parameter of [`ParticleControls`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlField {
    Count,
    Speed,
    Attraction,
    Size,
    Opacity,
    ResetRadius,
    CenterPoints,
    CenterSpeed,
    CenterRadius,
}

impl ControlField {
    /// Editor order
    pub const ALL: [ControlField; 9] = [
        Self::Count,
        Self::Speed,
        Self::Attraction,
        Self::Size,
        Self::Opacity,
        Self::ResetRadius,
        Self::CenterPoints,
        Self::CenterSpeed,
        Self::CenterRadius,
    ];

    /// Wire name of the field inside the snapshot JSON
    pub fn key(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Speed => "speed",
            Self::Attraction => "attraction",
            Self::Size => "size",
            Self::Opacity => "opacity",
            Self::ResetRadius => "resetRadius",
            Self::CenterPoints => "centerPoints",
            Self::CenterSpeed => "centerSpeed",
            Self::CenterRadius => "centerRadius",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Count => "Particle Count",
            Self::Speed => "Speed",
            Self::Attraction => "Attraction",
            Self::Size => "Size",
            Self::Opacity => "Opacity",
            Self::ResetRadius => "Reset Radius",
            Self::CenterPoints => "Center Points",
            Self::CenterSpeed => "Center Speed",
            Self::CenterRadius => "Center Radius",
        }
    }

    /// Inclusive range accepted from local edits
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Count => (500.0, 5000.0),
            Self::Speed => (0.1, 3.0),
            Self::Attraction => (0.001, 0.01),
            Self::Size => (1.0, 10.0),
            Self::Opacity => (0.1, 1.0),
            Self::ResetRadius => (100.0, 500.0),
            Self::CenterPoints => (1.0, 8.0),
            Self::CenterSpeed => (0.1, 2.0),
            Self::CenterRadius => (100.0, 500.0),
        }
    }

    /// Editor increment
    pub fn step(&self) -> f64 {
        match self {
            Self::Count => 100.0,
            Self::Speed => 0.1,
            Self::Attraction => 0.001,
            Self::Size => 0.5,
            Self::Opacity => 0.1,
            Self::ResetRadius => 25.0,
            Self::CenterPoints => 1.0,
            Self::CenterSpeed => 0.1,
            Self::CenterRadius => 25.0,
        }
    }

    /// Move `current` by `steps` increments, snapped to the step grid and
    /// clamped into range.
    pub fn nudge(&self, current: f64, steps: i32) -> f64 {
        let step = self.step();
        let (min, max) = self.range();
        let snapped = ((current / step).round() + steps as f64) * step;
        // Snapping through f64 leaves noise like 0.30000000000000004
        let cleaned = (snapped * 1e6).round() / 1e6;
        cleaned.clamp(min, max)
    }

    /// Size and opacity only affect drawing, never the simulation
    pub fn is_render_hint(&self) -> bool {
        matches!(self, Self::Size | Self::Opacity)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("{} must be within [{min}, {max}], got {value}", .field.key())]
    OutOfRange {
        field: ControlField,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{} must be a finite number", .field.key())]
    NotFinite { field: ControlField },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_within_ranges() {
        let controls = ParticleControls::default();
        for field in ControlField::ALL {
            let (min, max) = field.range();
            let v = controls.get(field);
            assert!(v >= min && v <= max, "{} = {v}", field.key());
        }
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut controls = ParticleControls::default();
        let before = controls;
        let err = controls.set(ControlField::Speed, 3.5).unwrap_err();
        assert!(matches!(err, ControlError::OutOfRange { .. }));
        assert_eq!(controls, before);

        assert!(controls.set(ControlField::Count, 499.0).is_err());
        assert!(controls.set(ControlField::CenterPoints, 9.0).is_err());
        assert!(controls.set(ControlField::Opacity, f64::NAN).is_err());
        assert_eq!(controls, before);
    }

    #[test]
    fn test_set_accepts_bounds() {
        let mut controls = ParticleControls::default();
        controls.set(ControlField::Attraction, 0.001).unwrap();
        controls.set(ControlField::Count, 5000.0).unwrap();
        controls.set(ControlField::CenterPoints, 1.0).unwrap();
        assert_eq!(controls.count, 5000);
        assert_eq!(controls.center_points, 1);
        assert!((controls.attraction - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_wire_form_is_camel_case() {
        let json = serde_json::to_value(ParticleControls::default()).unwrap();
        for field in ControlField::ALL {
            assert!(json.get(field.key()).is_some(), "missing {}", field.key());
        }
        assert_eq!(json["resetRadius"], serde_json::json!(200.0));
        assert_eq!(json["centerPoints"], serde_json::json!(3));
    }

    #[test]
    fn test_nudge_snaps_and_clamps() {
        assert_eq!(ControlField::Speed.nudge(1.0, 2), 1.2);
        assert_eq!(ControlField::Speed.nudge(2.95, 1), 3.0);
        assert_eq!(ControlField::Count.nudge(500.0, -1), 500.0);
        assert_eq!(ControlField::Attraction.nudge(0.002, 1), 0.003);
        assert_eq!(ControlField::CenterPoints.nudge(3.0, -1), 2.0);
    }

    #[test]
    fn test_hints_differ() {
        let a = ParticleControls::default();
        let mut b = a;
        b.speed = 2.0;
        assert!(!a.hints_differ(&b));
        b.opacity = 0.5;
        assert!(a.hints_differ(&b));
    }
}
