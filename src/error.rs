// ---------------------------------------------------------------------------
// Simulation errors
// ---------------------------------------------------------------------------

use thiserror::Error;

use crate::dynamics::state::State;

/// Errors that abort a simulation run.
///
/// Every variant carries the inputs that triggered it. None of them are
/// retried: an invalid physical configuration or a diverged step means the
/// run is invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A physical or simulation parameter is out of range.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Constraint that was violated.
        reason: &'static str,
    },

    /// Integration step size is not finite and positive.
    #[error("invalid integration step: dt = {dt}")]
    InvalidStep {
        /// Requested step size.
        dt: f64,
    },

    /// The linearized (A, B) pair admits no stabilizing Riccati solution.
    #[error("uncontrollable pair: {reason}")]
    UncontrollablePair {
        /// What failed during synthesis.
        reason: String,
    },

    /// Input requested from a controller that has no gain yet.
    #[error("controller has not been solved")]
    NotSolved,

    /// The integrator failed or produced a non-finite state.
    #[error("integrator diverged over dt = {dt} from state {state:?}")]
    IntegratorDiverged {
        /// Step size being integrated.
        dt: f64,
        /// State the step started from.
        state: [f64; 6],
    },
}

impl SimError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub const fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter { name, value, reason }
    }

    /// Creates an uncontrollable pair error.
    #[must_use]
    pub fn uncontrollable(reason: impl Into<String>) -> Self {
        Self::UncontrollablePair {
            reason: reason.into(),
        }
    }

    /// Creates a divergence error for a step of `dt` starting at `state`.
    #[must_use]
    pub fn diverged(dt: f64, state: &State) -> Self {
        let mut s = [0.0; 6];
        s.copy_from_slice(state.as_slice());
        Self::IntegratorDiverged { dt, state: s }
    }
}

/// Result alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_offending_inputs() {
        let e = SimError::invalid_parameter("mass", -1.0, "must be positive");
        assert_eq!(e.to_string(), "invalid parameter: mass = -1 (must be positive)");

        let e = SimError::InvalidStep { dt: 0.0 };
        assert!(e.to_string().contains("dt = 0"));
    }

    #[test]
    fn diverged_copies_state() {
        let state = State::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        match SimError::diverged(0.1, &state) {
            SimError::IntegratorDiverged { dt, state } => {
                assert_eq!(dt, 0.1);
                assert_eq!(state, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
