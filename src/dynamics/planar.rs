use crate::dynamics::state::{Input, State, OMEGA, THETA, VX, VY};
use crate::vehicle::RotorParams;

// ---------------------------------------------------------------------------
// Planar rotor equations of motion
// ---------------------------------------------------------------------------

/// Compute the state derivative for a given state and thrust pair.
///
/// Two rotors a beam distance `d` apart push along the body axis:
///   1. Collective thrust `f1 + f2` tilted by `theta` accelerates the body
///   2. Gravity pulls straight down
///   3. Differential thrust `f1 - f2` spins the body about its center
///
/// `theta` may take any real value.
pub fn derivatives(params: &RotorParams, state: &State, input: &Input) -> State {
    let (sin_theta, cos_theta) = state[THETA].sin_cos();
    let thrust_accel = (input[0] + input[1]) / params.mass();

    State::new(
        state[VX],
        state[VY],
        state[OMEGA],
        -thrust_accel * sin_theta,
        thrust_accel * cos_theta - params.gravity(),
        params.torque_arm_ratio() * (input[0] - input[1]),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
