use crate::dynamics::state::{Input, State};
use crate::error::Result;

/// Trait for rotor-craft controllers.
///
/// Implement this to create custom controllers that can be plugged into
/// the simulation loop. Called once per sampling period; the returned
/// thrusts are held until the next call.
pub trait Controller {
    /// Compute rotor thrusts from the current state.
    fn control(&mut self, state: &State) -> Result<Input>;

    /// Reset controller internal state between runs.
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
