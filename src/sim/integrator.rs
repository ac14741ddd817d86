use crate::dynamics::state::State;
use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Integrator strategy: advance an autonomous state by dt
// ---------------------------------------------------------------------------

/// Trait for one-step integrators.
///
/// `field` is the vector field with the input already held fixed, so an
/// implementation only sees `dx/dt = f(x)` over `[0, dt]`. Callers validate
/// `dt` before stepping.
pub trait Integrator: Send + Sync {
    /// Advance `state` by `dt` under `field`.
    fn step(&self, field: &dyn Fn(&State) -> State, state: &State, dt: f64) -> Result<State>;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

// ---------------------------------------------------------------------------
// Classical 4th-order Runge-Kutta
// ---------------------------------------------------------------------------

/// Single RK4 step: advance state by dt.
pub fn rk4_step<F: Fn(&State) -> State>(field: F, state: &State, dt: f64) -> State {
    let k1 = field(state);
    let k2 = field(&(state + k1 * (dt * 0.5)));
    let k3 = field(&(state + k2 * (dt * 0.5)));
    let k4 = field(&(state + k3 * dt));

    state + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * (dt / 6.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn step(&self, field: &dyn Fn(&State) -> State, state: &State, dt: f64) -> Result<State> {
        Ok(rk4_step(field, state, dt))
    }

    fn name(&self) -> &str {
        "RK4"
    }
}

// ---------------------------------------------------------------------------
// Adaptive Runge-Kutta 4(5)
// ---------------------------------------------------------------------------

/// Adaptive step-size solver, substeps internally to reach `dt`.
#[derive(Debug, Clone, Copy)]
pub struct Rk45 {
    pub tolerance: f64,
}

impl Rk45 {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Default for Rk45 {
    fn default() -> Self {
        Self { tolerance: 1e-10 }
    }
}

struct HeldInputOde<'a> {
    field: &'a dyn Fn(&State) -> State,
}

impl fast_ode::DifferentialEquation<6> for HeldInputOde<'_> {
    fn ode_dot_y(&self, _t: f64, y: &fast_ode::Coord<6>) -> (fast_ode::Coord<6>, bool) {
        let dot = (self.field)(&State::from(y.0));
        let ok = dot.iter().all(|v| v.is_finite());
        (fast_ode::Coord(dot.into()), ok)
    }
}

impl Integrator for Rk45 {
    fn step(&self, field: &dyn Fn(&State) -> State, state: &State, dt: f64) -> Result<State> {
        let ode = HeldInputOde { field };
        let result = fast_ode::solve_ivp(
            &ode,
            (0.0, dt),
            fast_ode::Coord((*state).into()),
            |_, _| true,
            self.tolerance,
            self.tolerance * 10.0,
        );

        match result {
            fast_ode::IvpResult::FinalTimeReached(final_coord) => Ok(State::from(final_coord.0)),
            _ => Err(SimError::diverged(dt, state)),
        }
    }

    fn name(&self) -> &str {
        "RK45"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // x'' = -x written as a 6-state system (three decoupled oscillators)
    fn oscillator(s: &State) -> State {
        State::new(s[3], s[4], s[5], -s[0], -s[1], -s[2])
    }

    fn exact_oscillator(t: f64) -> State {
        State::new(t.cos(), 0.0, 0.0, -t.sin(), 0.0, 0.0)
    }

    fn propagate(integrator: &dyn Integrator, dt: f64, t_end: f64) -> State {
        let steps = (t_end / dt).round() as usize;
        let mut s = exact_oscillator(0.0);
        for _ in 0..steps {
            s = integrator.step(&oscillator, &s, dt).unwrap();
        }
        s
    }

    #[test]
    fn rk4_tracks_oscillator() {
        let s = propagate(&Rk4, 0.01, 1.0);
        assert!((s - exact_oscillator(1.0)).norm() < 1e-9);
    }

    #[test]
    fn rk4_is_fourth_order() {
        let e1 = (propagate(&Rk4, 0.1, 1.0) - exact_oscillator(1.0)).norm();
        let e2 = (propagate(&Rk4, 0.05, 1.0) - exact_oscillator(1.0)).norm();
        let ratio = e1 / e2;
        assert!(
            ratio > 12.0 && ratio < 20.0,
            "Halving dt should cut error ~16x, got {:.2}",
            ratio
        );
    }

    #[test]
    fn rk4_exact_for_constant_field() {
        let accel = |_: &State| State::new(0.0, 0.0, 0.0, 0.0, -9.8, 0.0);
        let s0 = State::zeros();
        let s = rk4_step(accel, &s0, 0.5);
        assert!((s[4] + 4.9).abs() < 1e-12);
    }

    #[test]
    fn rk45_agrees_with_rk4() {
        let a = propagate(&Rk4, 0.01, 0.5);
        let b = propagate(&Rk45::default(), 0.01, 0.5);
        assert!((a - b).norm() < 1e-7, "RK45 {b} vs RK4 {a}");
    }

    #[test]
    fn rk45_reports_divergence() {
        let blow_up = |_: &State| State::repeat(f64::NAN);
        let s0 = State::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        match Rk45::default().step(&blow_up, &s0, 0.1) {
            Err(SimError::IntegratorDiverged { dt, state }) => {
                assert_eq!(dt, 0.1);
                assert_eq!(state, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn names() {
        assert_eq!(Rk4.name(), "RK4");
        assert_eq!(Rk45::default().name(), "RK45");
    }
}
