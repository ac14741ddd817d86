pub mod controller;
pub mod linearize;
pub mod lqr;
pub mod riccati;

pub use controller::Controller;
pub use linearize::{hover_jacobians, numerical_jacobians};
pub use lqr::{compute_input, feedforward, synthesize, LqrController, LqrSolution, LqrWeights};
pub use riccati::solve_care;
