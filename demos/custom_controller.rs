use planar_rotor::dynamics::state::{Input, SimConfig, State, THETA, X, Y};
use planar_rotor::gnc::{Controller, LqrController};
use planar_rotor::io::RunSummary;
use planar_rotor::sim::{self, Plant};
use planar_rotor::vehicle::RotorParamsBuilder;
use planar_rotor::Result;

/// Wraps another controller and clips each rotor thrust to what the
/// motors can actually deliver.
struct Saturated<C> {
    inner: C,
    max_thrust: f64,
}

impl<C: Controller> Controller for Saturated<C> {
    fn control(&mut self, state: &State) -> Result<Input> {
        let u = self.inner.control(state)?;
        Ok(u.map(|f| f.clamp(0.0, self.max_thrust)))
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn name(&self) -> &str {
        "Saturated LQR"
    }
}

fn main() -> anyhow::Result<()> {
    let params = RotorParamsBuilder::new().mass(1.2).build()?;
    let config = SimConfig::new(0.02, 8.0)?;
    // Large offset: the unclipped gain asks for more than the motors give
    let x0 = State::new(3.0, -2.0, 0.0, 0.0, 0.0, 0.0);

    let mut lqr = LqrController::new(&params);
    lqr.solve()?;
    let mut controller = Saturated {
        inner: lqr,
        max_thrust: 1.3 * params.hover_thrust(),
    };

    let mut plant = Plant::new(&params);
    plant.set_state(x0);

    println!("Simulating with {} controller...", controller.name());
    let trajectory = sim::simulate_with(&mut plant, &mut controller, &config)?;
    let summary = RunSummary::from_trajectory(&trajectory);

    let last = trajectory.final_state();
    println!("Final position: ({:.4}, {:.4}) m", last[X], last[Y]);
    println!("Final attitude: {:.4} rad", last[THETA]);
    println!("Peak |θ|: {:.3} rad", summary.max_abs_theta);
    if let (Some(lo), Some(hi)) = (summary.min_thrust, summary.max_thrust) {
        println!("Thrust range: {:.3} .. {:.3} N", lo, hi);
    }
    println!("Trajectory points: {}", trajectory.states().len());
    Ok(())
}
