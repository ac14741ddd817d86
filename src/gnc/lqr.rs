use nalgebra::{Complex, DMatrix, Matrix2, Matrix6};
use tracing::debug;

use crate::dynamics::state::{Gain, Input, State};
use crate::error::{Result, SimError};
use crate::vehicle::RotorParams;
use super::controller::Controller;
use super::linearize::hover_jacobians;
use super::riccati::solve_care;

// ---------------------------------------------------------------------------
// LQR weights
// ---------------------------------------------------------------------------

/// Quadratic cost weights: `Q` on state deviation, `R` on thrust deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct LqrWeights {
    pub q: Matrix6<f64>,
    pub r: Matrix2<f64>,
}

impl LqrWeights {
    /// Uniform diagonal weights.
    pub fn diagonal(state_weight: f64, input_weight: f64) -> Self {
        Self {
            q: Matrix6::identity() * state_weight,
            r: Matrix2::identity() * input_weight,
        }
    }
}

impl Default for LqrWeights {
    fn default() -> Self {
        Self::diagonal(0.1, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Gain synthesis
// ---------------------------------------------------------------------------

/// Everything fixed at the start of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LqrSolution {
    /// `K = -R^-1 B' P`.
    pub gain: Gain,
    /// Stabilizing Riccati solution `P`.
    pub riccati: Matrix6<f64>,
    /// Hover trim thrusts.
    pub feedforward: Input,
    /// Eigenvalues of `A + B K`.
    pub closed_loop_poles: Vec<Complex<f64>>,
}

/// Per-rotor thrust that cancels gravity at hover, `(m g / 2, m g / 2)`.
pub fn feedforward(params: &RotorParams) -> Input {
    Input::repeat(params.hover_thrust())
}

/// `u = K x + uf`.
pub fn compute_input(state: &State, gain: &Gain, uf: &Input) -> Input {
    gain * state + uf
}

/// Linearize about hover and solve for the optimal gain.
pub fn synthesize(params: &RotorParams, weights: &LqrWeights) -> Result<LqrSolution> {
    let (a, b) = hover_jacobians(params);

    let p = solve_care(
        &DMatrix::from_column_slice(6, 6, a.as_slice()),
        &DMatrix::from_column_slice(6, 2, b.as_slice()),
        &DMatrix::from_column_slice(6, 6, weights.q.as_slice()),
        &DMatrix::from_column_slice(2, 2, weights.r.as_slice()),
    )?;
    let riccati = Matrix6::from_column_slice(p.as_slice());

    let r_inv = weights
        .r
        .try_inverse()
        .ok_or_else(|| SimError::uncontrollable("input weight R is singular"))?;
    let gain: Gain = -(r_inv * b.transpose() * riccati);

    let closed_loop_poles = closed_loop_poles(&(a + b * gain))?;
    if let Some(pole) = closed_loop_poles.iter().find(|p| p.re >= 0.0) {
        return Err(SimError::uncontrollable(format!(
            "closed loop is not stable: pole at {pole}"
        )));
    }

    debug!(%gain, "LQR gain");
    debug!(poles = ?closed_loop_poles, "closed-loop poles");

    Ok(LqrSolution {
        gain,
        riccati,
        feedforward: feedforward(params),
        closed_loop_poles,
    })
}

/// Eigenvalues of a closed-loop system matrix.
pub fn closed_loop_poles(system: &Matrix6<f64>) -> Result<Vec<Complex<f64>>> {
    let schur = system
        .try_schur(f64::EPSILON, 10_000)
        .ok_or_else(|| SimError::uncontrollable("closed-loop eigenvalue computation failed"))?;
    Ok(schur.complex_eigenvalues().iter().copied().collect())
}

// ---------------------------------------------------------------------------
// LQR controller: unsolved -> solved
// ---------------------------------------------------------------------------

pub struct LqrController<'a> {
    params: &'a RotorParams,
    weights: LqrWeights,
    solution: Option<LqrSolution>,
}

impl<'a> LqrController<'a> {
    pub fn new(params: &'a RotorParams) -> Self {
        Self::with_weights(params, LqrWeights::default())
    }

    pub fn with_weights(params: &'a RotorParams, weights: LqrWeights) -> Self {
        Self {
            params,
            weights,
            solution: None,
        }
    }

    pub fn params(&self) -> &'a RotorParams {
        self.params
    }

    pub fn weights(&self) -> &LqrWeights {
        &self.weights
    }

    pub fn is_solved(&self) -> bool {
        self.solution.is_some()
    }

    pub fn solution(&self) -> Option<&LqrSolution> {
        self.solution.as_ref()
    }

    /// Compute gain and feedforward; afterwards the controller is solved.
    pub fn solve(&mut self) -> Result<&LqrSolution> {
        let solution = synthesize(self.params, &self.weights)?;
        Ok(self.solution.insert(solution))
    }

    pub fn gain(&self) -> Result<&Gain> {
        self.solution
            .as_ref()
            .map(|s| &s.gain)
            .ok_or(SimError::NotSolved)
    }

    pub fn compute_input(&self, state: &State) -> Result<Input> {
        let solution = self.solution.as_ref().ok_or(SimError::NotSolved)?;
        Ok(compute_input(state, &solution.gain, &solution.feedforward))
    }
}

impl Controller for LqrController<'_> {
    fn control(&mut self, state: &State) -> Result<Input> {
        self.compute_input(state)
    }

    fn name(&self) -> &str {
        "LQR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::{hover_state, THETA, X};
    use approx::assert_relative_eq;

    #[test]
    fn feedforward_is_half_weight() {
        let uf = feedforward(&RotorParams::default());
        assert_relative_eq!(uf, Input::new(4.9, 4.9), epsilon = 1e-12);
    }

    #[test]
    fn compute_input_before_solve_fails() {
        let p = RotorParams::default();
        let mut ctrl = LqrController::new(&p);
        assert!(!ctrl.is_solved());
        assert_eq!(ctrl.compute_input(&State::zeros()), Err(SimError::NotSolved));
        assert_eq!(ctrl.control(&State::zeros()), Err(SimError::NotSolved));
        assert!(matches!(ctrl.gain(), Err(SimError::NotSolved)));
    }

    #[test]
    fn solved_controller_holds_hover() {
        let p = RotorParams::default();
        let mut ctrl = LqrController::new(&p);
        ctrl.solve().unwrap();
        assert!(ctrl.is_solved());
        let u = ctrl.compute_input(&hover_state(0.0, 0.0)).unwrap();
        assert_relative_eq!(u, Input::new(4.9, 4.9), epsilon = 1e-12);
    }

    #[test]
    fn gain_matches_reference_values() {
        let p = RotorParams::default();
        let sol = synthesize(&p, &LqrWeights::default()).unwrap();
        let k = sol.gain;
        // Lateral position gain is sqrt(0.1) / sqrt(2) per rotor, opposite signs
        assert_relative_eq!(k[(0, X)], 0.1_f64.sqrt() / 2.0_f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(k[(1, X)], -k[(0, X)], epsilon = 1e-9);
        assert_relative_eq!(k[(0, THETA)], -1.4765, epsilon = 1e-3);
        assert_relative_eq!(sol.riccati, sol.riccati.transpose(), epsilon = 1e-9);
        assert!(sol.riccati.cholesky().is_some());
    }

    #[test]
    fn closed_loop_is_hurwitz() {
        let p = RotorParams::default();
        let sol = synthesize(&p, &LqrWeights::default()).unwrap();
        assert_eq!(sol.closed_loop_poles.len(), 6);
        for pole in &sol.closed_loop_poles {
            assert!(pole.re < 0.0, "pole {pole} not in left half-plane");
        }
    }

    #[test]
    fn weak_differential_thrust_is_stabilized() {
        // d / 2J = 5e-7: the craft barely turns
        let p = RotorParams::new(1000.0, 1000.0, 0.001, 9.8).unwrap();
        let sol = synthesize(&p, &LqrWeights::default()).unwrap();
        for pole in &sol.closed_loop_poles {
            assert!(pole.re < 0.0, "pole {pole} not in left half-plane");
        }
        assert!(sol.riccati.cholesky().is_some());
        assert_relative_eq!(sol.feedforward, Input::repeat(4900.0), epsilon = 1e-9);
    }

    #[test]
    fn heavier_state_weight_stiffens_gain() {
        let p = RotorParams::default();
        let soft = synthesize(&p, &LqrWeights::default()).unwrap();
        let stiff = synthesize(&p, &LqrWeights::diagonal(10.0, 1.0)).unwrap();
        assert!(stiff.gain.norm() > soft.gain.norm());
    }

    #[test]
    fn singular_input_weight_is_rejected() {
        let p = RotorParams::default();
        let weights = LqrWeights {
            q: Matrix6::identity(),
            r: Matrix2::zeros(),
        };
        let err = synthesize(&p, &weights).unwrap_err();
        assert!(matches!(err, SimError::UncontrollablePair { .. }));
    }
}
