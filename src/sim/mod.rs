pub mod integrator;
pub mod plant;
pub mod runner;
pub mod trajectory;

pub use integrator::{rk4_step, Integrator, Rk4, Rk45};
pub use plant::Plant;
pub use runner::{simulate, simulate_with};
pub use trajectory::{PlotSeries, Trajectory};
