pub mod params;

pub use params::{RotorParams, RotorParamsBuilder};
