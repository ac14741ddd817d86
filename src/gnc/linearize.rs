use nalgebra::{Matrix6, Matrix6x2};

use crate::dynamics;
use crate::dynamics::state::{Input, State, OMEGA, THETA, VX, VY, X, Y};
use crate::vehicle::RotorParams;

// ---------------------------------------------------------------------------
// Linearization about hover
// ---------------------------------------------------------------------------

/// Jacobians `(A, B)` of the planar dynamics at hover.
///
/// Independent of the hover position. A tilt `theta` redirects the hover
/// thrust `m g` sideways (`-g theta`); collective thrust lifts at `1/m` per
/// rotor and differential thrust spins at `d/2J`.
pub fn hover_jacobians(params: &RotorParams) -> (Matrix6<f64>, Matrix6x2<f64>) {
    let mut a = Matrix6::zeros();
    a[(X, VX)] = 1.0;
    a[(Y, VY)] = 1.0;
    a[(THETA, OMEGA)] = 1.0;
    a[(VX, THETA)] = -params.gravity();

    let lift = 1.0 / params.mass();
    let spin = params.torque_arm_ratio();
    let mut b = Matrix6x2::zeros();
    b[(VY, 0)] = lift;
    b[(VY, 1)] = lift;
    b[(OMEGA, 0)] = spin;
    b[(OMEGA, 1)] = -spin;

    (a, b)
}

/// Central-difference Jacobians of the dynamics at `(state, input)`.
pub fn numerical_jacobians(
    params: &RotorParams,
    state: &State,
    input: &Input,
    step: f64,
) -> (Matrix6<f64>, Matrix6x2<f64>) {
    let f = |s: &State, u: &Input| dynamics::derivatives(params, s, u);

    let mut a = Matrix6::zeros();
    for j in 0..6 {
        let mut plus = *state;
        let mut minus = *state;
        plus[j] += step;
        minus[j] -= step;
        a.set_column(j, &((f(&plus, input) - f(&minus, input)) / (2.0 * step)));
    }

    let mut b = Matrix6x2::zeros();
    for j in 0..2 {
        let mut plus = *input;
        let mut minus = *input;
        plus[j] += step;
        minus[j] -= step;
        b.set_column(j, &((f(state, &plus) - f(state, &minus)) / (2.0 * step)));
    }

    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::hover_state;
    use approx::assert_relative_eq;

    #[test]
    fn analytic_matches_finite_difference() {
        for params in [
            RotorParams::default(),
            RotorParams::new(2.5, 0.2, 1.1, 3.7).unwrap(),
        ] {
            let uf = Input::repeat(params.hover_thrust());
            let (a, b) = hover_jacobians(&params);
            let (a_fd, b_fd) = numerical_jacobians(&params, &hover_state(4.0, -2.0), &uf, 1e-6);
            assert_relative_eq!(a, a_fd, epsilon = 1e-6);
            assert_relative_eq!(b, b_fd, epsilon = 1e-6);
        }
    }

    #[test]
    fn reference_craft_entries() {
        let (a, b) = hover_jacobians(&RotorParams::default());
        assert_eq!(a[(VX, THETA)], -9.8);
        assert!((a.sum() - (3.0 - 9.8)).abs() < 1e-12);
        assert_eq!(b[(VY, 0)], 1.0);
        assert_eq!(b[(OMEGA, 0)], 25.0);
        assert_eq!(b[(OMEGA, 1)], -25.0);
    }
}
