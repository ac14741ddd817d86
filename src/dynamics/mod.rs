pub mod planar;
pub mod state;

pub use planar::derivatives;
pub use state::{hover_state, Gain, Input, SimConfig, State};
