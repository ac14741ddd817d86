use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::dynamics::state::{THETA, VX, VY, X, Y};
use crate::sim::Trajectory;

/// Position band used by [`RunSummary::from_trajectory`], in metres.
pub const DEFAULT_SETTLING_BAND: f64 = 0.05;

/// Summary statistics computed from a closed-loop run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub final_time: f64,
    pub steps: usize,
    /// Distance of the final position from the hover target.
    pub final_position_error: f64,
    pub final_speed: f64,
    pub max_abs_theta: f64,
    /// `None` for a run with no control steps.
    pub min_thrust: Option<f64>,
    pub max_thrust: Option<f64>,
    pub settling_band: f64,
    /// First stamp after which the position error stays inside the band.
    pub settling_time: Option<f64>,
}

impl RunSummary {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        Self::with_band(trajectory, DEFAULT_SETTLING_BAND)
    }

    pub fn with_band(trajectory: &Trajectory, band: f64) -> Self {
        let last = trajectory.final_state();

        let max_abs_theta = trajectory
            .states()
            .iter()
            .map(|s| s[THETA].abs())
            .fold(0.0_f64, f64::max);

        let thrusts = trajectory.inputs().iter().flat_map(|u| u.iter().copied());
        let (min_thrust, max_thrust) = thrusts.fold((None, None), |(lo, hi): (Option<f64>, Option<f64>), f| {
            (
                Some(lo.map_or(f, |v| v.min(f))),
                Some(hi.map_or(f, |v| v.max(f))),
            )
        });

        RunSummary {
            final_time: trajectory.final_time(),
            steps: trajectory.steps(),
            final_position_error: last[X].hypot(last[Y]),
            final_speed: last[VX].hypot(last[VY]),
            max_abs_theta,
            min_thrust,
            max_thrust,
            settling_band: band,
            settling_time: settling_time(trajectory, band),
        }
    }
}

fn settling_time(trajectory: &Trajectory, band: f64) -> Option<f64> {
    let states = trajectory.states();
    let stamps = trajectory.time_stamps();
    // Index just past the last state outside the band
    let settled_from = match states.iter().rposition(|s| s[X].hypot(s[Y]) >= band) {
        Some(i) => i + 1,
        None => 0,
    };
    stamps.get(settled_from).copied()
}

/// Write a run summary as pretty-printed JSON.
pub fn write_summary<W: Write>(writer: W, summary: &RunSummary) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Write run summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &RunSummary) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)?;
    writeln!(file)
}
