use tracing::{info, warn};

use crate::dynamics::state::{SimConfig, State};
use crate::error::Result;
use crate::gnc::{Controller, LqrController};
use crate::vehicle::RotorParams;
use super::plant::Plant;
use super::trajectory::Trajectory;

// ---------------------------------------------------------------------------
// Fixed-horizon closed-loop simulation
// ---------------------------------------------------------------------------

/// Run `plant` under `controller` for `config.steps()` sampling periods.
///
/// The plant starts from its current state. Each step asks the controller
/// for thrusts, holds them over one sampling period and records the result.
/// The controller is reset before the first step. Any error aborts the run.
pub fn simulate_with(
    plant: &mut Plant<'_>,
    controller: &mut dyn Controller,
    config: &SimConfig,
) -> Result<Trajectory> {
    config.validate()?;
    let steps = config.steps();
    let dt = config.sampling_time;

    info!(
        steps,
        dt,
        controller = controller.name(),
        integrator = plant.integrator_name(),
        "starting closed-loop run"
    );

    controller.reset();
    let mut trajectory = Trajectory::new(*plant.state(), dt, steps);

    for step in 0..steps {
        let advanced = controller
            .control(plant.state())
            .and_then(|input| plant.integrate(&input, dt).map(|next| (input, next)));

        match advanced {
            Ok((input, next)) => trajectory.push(input, next),
            Err(e) => {
                warn!(step, time = config.time_at(step), error = %e, "run aborted");
                return Err(e);
            }
        }
    }

    let last = trajectory.final_state();
    info!(
        steps,
        final_time = trajectory.final_time(),
        x = last[0],
        y = last[1],
        theta = last[2],
        "run complete"
    );

    Ok(trajectory)
}

/// Simulate with an RK4 plant and a freshly solved LQR controller
/// (convenience wrapper).
pub fn simulate(params: &RotorParams, initial_state: State, config: &SimConfig) -> Result<Trajectory> {
    let mut plant = Plant::new(params);
    plant.set_state(initial_state);

    let mut controller = LqrController::new(params);
    controller.solve()?;

    simulate_with(&mut plant, &mut controller, config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
