use planar_rotor::dynamics::state::{Input, State};
use planar_rotor::sim::{Integrator, Plant, Rk4, Rk45};
use planar_rotor::vehicle::RotorParams;

/// Open-loop tumble: 1 s of differential thrust from rest, integrated with
/// fixed-step RK4 at shrinking steps and compared against tight RK45.
fn propagate(params: &RotorParams, integrator: Box<dyn Integrator>, dt: f64) -> anyhow::Result<State> {
    let mut plant = Plant::with_integrator(params, integrator);
    plant.set_state(State::zeros());
    let input = Input::new(params.hover_thrust() + 0.05, params.hover_thrust() - 0.05);
    let steps = (1.0 / dt).round() as usize;
    for _ in 0..steps {
        plant.integrate(&input, dt)?;
    }
    Ok(*plant.state())
}

fn main() -> anyhow::Result<()> {
    let params = RotorParams::default();
    let reference = propagate(&params, Box::new(Rk45::new(1e-12)), 1.0)?;

    println!("{:>8}  {:>12}  {:>8}", "dt (s)", "error", "ratio");
    let mut previous: Option<f64> = None;
    for dt in [0.2, 0.1, 0.05, 0.025] {
        let err = (propagate(&params, Box::new(Rk4), dt)? - reference).norm();
        match previous {
            Some(p) => println!("{:>8.3}  {:>12.3e}  {:>8.1}", dt, err, p / err),
            None => println!("{:>8.3}  {:>12.3e}  {:>8}", dt, err, "-"),
        }
        previous = Some(err);
    }
    Ok(())
}
