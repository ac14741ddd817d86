use nalgebra::{Matrix2x6, Vector2, Vector6};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// State, input and gain
// ---------------------------------------------------------------------------

/// Planar rotor state `(x, y, theta, vx, vy, omega)`.
///
/// `theta` is never wrapped; it is valid over all of R.
pub type State = Vector6<f64>;

/// Rotor thrusts `(f1, f2)`, N.
pub type Input = Vector2<f64>;

/// State feedback gain, `u = K x + uf`.
pub type Gain = Matrix2x6<f64>;

pub const X: usize = 0;
pub const Y: usize = 1;
pub const THETA: usize = 2;
pub const VX: usize = 3;
pub const VY: usize = 4;
pub const OMEGA: usize = 5;

/// Hover equilibrium at `(x, y)`: level attitude, all rates zero.
pub fn hover_state(x: f64, y: f64) -> State {
    State::new(x, y, 0.0, 0.0, 0.0, 0.0)
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

/// Longest run a [`SimConfig`] may describe, in control samples.
pub const MAX_STEPS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub sampling_time: f64, // s, zero-order hold period
    pub final_time: f64,    // s, exclusive end of the sample grid
}

impl SimConfig {
    pub fn new(sampling_time: f64, final_time: f64) -> Result<Self> {
        let config = Self {
            sampling_time,
            final_time,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_time.is_finite() && self.sampling_time > 0.0) {
            return Err(SimError::invalid_parameter(
                "sampling_time",
                self.sampling_time,
                "must be finite and positive",
            ));
        }
        if !(self.final_time.is_finite() && self.final_time > 0.0) {
            return Err(SimError::invalid_parameter(
                "final_time",
                self.final_time,
                "must be finite and positive",
            ));
        }
        let samples = (self.final_time / self.sampling_time).ceil();
        if !(samples <= MAX_STEPS as f64) {
            return Err(SimError::invalid_parameter(
                "final_time",
                self.final_time,
                "needs more than 1_000_000 samples at this sampling_time",
            ));
        }
        Ok(())
    }

    /// Number of control samples over `[0, final_time)`.
    pub fn steps(&self) -> usize {
        (self.final_time / self.sampling_time).ceil() as usize
    }

    /// Time of sample `i`.
    pub fn time_at(&self, i: usize) -> f64 {
        i as f64 * self.sampling_time
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sampling_time: 0.05, // 20 Hz
            final_time: 10.0,
        }
    }
}
