use std::io::Write;
use std::path::Path;

use crate::sim::Trajectory;

const HEADER: [&str; 9] = ["time", "x", "y", "theta", "vx", "vy", "omega", "f1", "f2"];

/// Write trajectory data to CSV format.
///
/// Columns: time, x, y, theta, vx, vy, omega, f1, f2
///
/// One row per control sample, then a last row holding the terminal state
/// with empty thrust columns.
pub fn write_trajectory<W: Write>(writer: W, trajectory: &Trajectory) -> ::csv::Result<()> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    for (t, s, u) in trajectory.samples() {
        let mut row = vec![format!("{:.4}", t)];
        row.extend(s.iter().map(|v| format!("{:.6}", v)));
        row.extend(u.iter().map(|v| format!("{:.6}", v)));
        wtr.write_record(&row)?;
    }

    let mut last = vec![format!("{:.4}", trajectory.final_time())];
    last.extend(trajectory.final_state().iter().map(|v| format!("{:.6}", v)));
    last.extend([String::new(), String::new()]);
    wtr.write_record(&last)?;

    wtr.flush()?;
    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file(path: impl AsRef<Path>, trajectory: &Trajectory) -> ::csv::Result<()> {
    let file = std::fs::File::create(path)?;
    write_trajectory(file, trajectory)
}
