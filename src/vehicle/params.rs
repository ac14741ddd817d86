use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Rotor-craft parameters
// ---------------------------------------------------------------------------

/// Physical parameters of the planar rotor-craft.
///
/// Fields are private so that every value in circulation has passed
/// [`RotorParams::new`]. Deserialization goes through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRotorParams")]
pub struct RotorParams {
    mass: f64,          // kg
    inertia: f64,       // kg·m^2, about the out-of-plane axis
    beam_distance: f64, // m, rotor to rotor
    gravity: f64,       // m/s^2
}

impl RotorParams {
    pub fn new(mass: f64, inertia: f64, beam_distance: f64, gravity: f64) -> Result<Self> {
        positive("mass", mass)?;
        positive("inertia", inertia)?;
        positive("beam_distance", beam_distance)?;
        if !gravity.is_finite() {
            return Err(SimError::invalid_parameter("gravity", gravity, "must be finite"));
        }
        Ok(Self {
            mass,
            inertia,
            beam_distance,
            gravity,
        })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn beam_distance(&self) -> f64 {
        self.beam_distance
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    /// Per-rotor thrust that holds the craft level and still, `m g / 2`.
    pub fn hover_thrust(&self) -> f64 {
        0.5 * self.mass * self.gravity
    }

    /// Angular acceleration per newton of differential thrust, `d / 2J`.
    pub fn torque_arm_ratio(&self) -> f64 {
        self.beam_distance / (2.0 * self.inertia)
    }
}

impl Default for RotorParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: 0.01,
            beam_distance: 0.5,
            gravity: 9.8,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid_parameter(name, value, "must be finite and positive"))
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawRotorParams {
    mass: f64,
    inertia: f64,
    beam_distance: f64,
    gravity: f64,
}

impl Default for RawRotorParams {
    fn default() -> Self {
        let p = RotorParams::default();
        Self {
            mass: p.mass,
            inertia: p.inertia,
            beam_distance: p.beam_distance,
            gravity: p.gravity,
        }
    }
}

impl TryFrom<RawRotorParams> for RotorParams {
    type Error = SimError;

    fn try_from(raw: RawRotorParams) -> Result<Self> {
        RotorParams::new(raw.mass, raw.inertia, raw.beam_distance, raw.gravity)
    }
}

// ---------------------------------------------------------------------------
// Params builder
// ---------------------------------------------------------------------------

pub struct RotorParamsBuilder {
    mass: f64,
    inertia: f64,
    beam_distance: f64,
    gravity: f64,
}

impl RotorParamsBuilder {
    pub fn new() -> Self {
        Self::from_params(&RotorParams::default())
    }

    /// Start from an existing parameter set.
    pub fn from_params(params: &RotorParams) -> Self {
        Self {
            mass: params.mass,
            inertia: params.inertia,
            beam_distance: params.beam_distance,
            gravity: params.gravity,
        }
    }

    pub fn mass(mut self, v: f64) -> Self { self.mass = v; self }
    pub fn inertia(mut self, v: f64) -> Self { self.inertia = v; self }
    pub fn beam_distance(mut self, v: f64) -> Self { self.beam_distance = v; self }
    pub fn gravity(mut self, v: f64) -> Self { self.gravity = v; self }

    pub fn build(self) -> Result<RotorParams> {
        RotorParams::new(self.mass, self.inertia, self.beam_distance, self.gravity)
    }
}

impl Default for RotorParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_craft() {
        let p = RotorParams::default();
        assert_eq!(p.mass(), 1.0);
        assert_eq!(p.inertia(), 0.01);
        assert_eq!(p.beam_distance(), 0.5);
        assert_eq!(p.gravity(), 9.8);
        assert!((p.hover_thrust() - 4.9).abs() < 1e-12);
        assert!((p.torque_arm_ratio() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_values() {
        for (m, j, d) in [(0.0, 0.01, 0.5), (1.0, -0.01, 0.5), (1.0, 0.01, 0.0)] {
            let err = RotorParams::new(m, j, d, 9.8).unwrap_err();
            assert!(matches!(err, SimError::InvalidParameter { .. }), "{err}");
        }
        assert!(RotorParams::new(1.0, 0.01, 0.5, f64::INFINITY).is_err());
        assert!(RotorParams::new(f64::NAN, 0.01, 0.5, 9.8).is_err());
    }

    #[test]
    fn builder_validates() {
        let p = RotorParamsBuilder::new().mass(2.0).gravity(9.81).build().unwrap();
        assert_eq!(p.mass(), 2.0);
        assert_eq!(p.inertia(), 0.01);

        let err = RotorParamsBuilder::new().beam_distance(-0.5).build().unwrap_err();
        match err {
            SimError::InvalidParameter { name, value, .. } => {
                assert_eq!(name, "beam_distance");
                assert_eq!(value, -0.5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn deserialize_goes_through_validation() {
        let p: RotorParams = serde_json::from_str(r#"{"mass": 2.0, "gravity": 1.62}"#).unwrap();
        assert_eq!(p.mass(), 2.0);
        assert_eq!(p.beam_distance(), 0.5);
        assert_eq!(p.gravity(), 1.62);

        let bad = serde_json::from_str::<RotorParams>(r#"{"inertia": 0.0}"#);
        assert!(bad.is_err());
    }
}
