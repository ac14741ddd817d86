use crate::dynamics;
use crate::dynamics::state::{Input, State};
use crate::error::{Result, SimError};
use crate::vehicle::RotorParams;
use super::integrator::{Integrator, Rk4};

// ---------------------------------------------------------------------------
// Plant: rotor-craft parameters + current state
// ---------------------------------------------------------------------------

/// The simulated rotor-craft.
///
/// Parameters are borrowed, so the controller of the same run can read the
/// same record. State only changes through [`Plant::set_state`] and
/// [`Plant::integrate`].
pub struct Plant<'a> {
    params: &'a RotorParams,
    state: State,
    integrator: Box<dyn Integrator>,
}

impl<'a> Plant<'a> {
    /// Plant at the origin, integrated with RK4.
    pub fn new(params: &'a RotorParams) -> Self {
        Self::with_integrator(params, Box::new(Rk4))
    }

    pub fn with_integrator(params: &'a RotorParams, integrator: Box<dyn Integrator>) -> Self {
        Self {
            params,
            state: State::zeros(),
            integrator,
        }
    }

    pub fn params(&self) -> &'a RotorParams {
        self.params
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn integrator_name(&self) -> &str {
        self.integrator.name()
    }

    /// State derivative at `state` under `input`.
    pub fn dynamics(&self, state: &State, input: &Input) -> State {
        dynamics::derivatives(self.params, state, input)
    }

    /// Advance the plant by `dt` with `input` held constant.
    ///
    /// On error the current state is left as it was.
    pub fn integrate(&mut self, input: &Input, dt: f64) -> Result<State> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidStep { dt });
        }

        let params = self.params;
        let field = move |s: &State| dynamics::derivatives(params, s, input);
        let next = self.integrator.step(&field, &self.state, dt)?;

        if next.iter().any(|v| !v.is_finite()) {
            return Err(SimError::diverged(dt, &self.state));
        }

        self.state = next;
        Ok(next)
    }
}
