use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use planar_rotor::dynamics::state::{SimConfig, State, OMEGA, THETA, VX, VY, X, Y};
use planar_rotor::gnc::LqrController;
use planar_rotor::io::{self, RunSummary};
use planar_rotor::sim::{self, Integrator, Plant, Rk4, Rk45};
use planar_rotor::vehicle::{RotorParams, RotorParamsBuilder};

#[derive(Parser)]
#[command(name = "planar-rotor")]
#[command(about = "Planar two-rotor craft driven back to hover by an LQR controller")]
#[command(version)]
struct Cli {
    /// JSON file with mass, inertia, beam_distance, gravity (missing keys use defaults)
    #[arg(long)]
    params: Option<PathBuf>,

    /// Mass in kg
    #[arg(long)]
    mass: Option<f64>,

    /// Moment of inertia in kg·m^2
    #[arg(long)]
    inertia: Option<f64>,

    /// Rotor-to-rotor distance in m
    #[arg(long)]
    beam_distance: Option<f64>,

    /// Gravitational acceleration in m/s^2
    #[arg(long, allow_hyphen_values = true)]
    gravity: Option<f64>,

    /// Initial state as x,y,theta,vx,vy,omega
    #[arg(long, value_parser = parse_state, default_value = "0.5,-0.5,0,0,0,0", allow_hyphen_values = true)]
    initial_state: State,

    /// Controller sampling period in s
    #[arg(long, default_value_t = 0.05)]
    sampling_time: f64,

    /// Simulated horizon in s
    #[arg(long, default_value_t = 10.0)]
    final_time: f64,

    #[arg(long, value_enum, default_value_t = IntegratorKind::Rk4)]
    integrator: IntegratorKind,

    /// Write the trajectory as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write a JSON run summary
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum IntegratorKind {
    Rk4,
    Rk45,
}

impl IntegratorKind {
    fn build(self) -> Box<dyn Integrator> {
        match self {
            IntegratorKind::Rk4 => Box::new(Rk4),
            IntegratorKind::Rk45 => Box::new(Rk45::default()),
        }
    }
}

fn parse_state(s: &str) -> std::result::Result<State, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{v}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if values.len() != 6 {
        return Err(format!("expected 6 comma-separated values, got {}", values.len()));
    }
    Ok(State::from_column_slice(&values))
}

fn load_params(cli: &Cli) -> Result<RotorParams> {
    let base = match &cli.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => RotorParams::default(),
    };

    let mut builder = RotorParamsBuilder::from_params(&base);
    if let Some(v) = cli.mass {
        builder = builder.mass(v);
    }
    if let Some(v) = cli.inertia {
        builder = builder.inertia(v);
    }
    if let Some(v) = cli.beam_distance {
        builder = builder.beam_distance(v);
    }
    if let Some(v) = cli.gravity {
        builder = builder.gravity(v);
    }
    Ok(builder.build()?)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let params = load_params(&cli)?;
    let config = SimConfig::new(cli.sampling_time, cli.final_time)?;

    let mut controller = LqrController::new(&params);
    let solution = controller.solve().context("LQR synthesis failed")?.clone();

    let mut plant = Plant::with_integrator(&params, cli.integrator.build());
    plant.set_state(cli.initial_state);
    let trajectory = sim::simulate_with(&mut plant, &mut controller, &config)?;
    let summary = RunSummary::from_trajectory(&trajectory);

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  PLANAR ROTOR-CRAFT LQR HOVER");
    println!("====================================================================");
    println!();
    println!("  Craft Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Mass:          {:>8.3} kg      Inertia:      {:>8.4} kg·m^2",
        params.mass(),
        params.inertia()
    );
    println!(
        "  Beam:          {:>8.3} m       Gravity:      {:>8.3} m/s^2",
        params.beam_distance(),
        params.gravity()
    );
    println!(
        "  Hover thrust:  {:>8.3} N/rotor Integrator:   {:>8}",
        params.hover_thrust(),
        plant.integrator_name()
    );
    println!();

    println!("  LQR Gain (rows f1, f2; columns x y θ vx vy ω)");
    println!("  ──────────────────────────────────────────────────────────────────");
    for row in solution.gain.row_iter() {
        let cells: Vec<String> = row.iter().map(|k| format!("{:>9.4}", k)).collect();
        println!("  {}", cells.join(" "));
    }
    let slowest = solution
        .closed_loop_poles
        .iter()
        .map(|p| p.re)
        .fold(f64::NEG_INFINITY, f64::max);
    println!("  Slowest closed-loop pole: Re = {:.4}", slowest);
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>6}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}  {:>7}  {:>7}",
        "t (s)", "x", "y", "θ", "vx", "vy", "ω", "f1", "f2"
    );
    println!("  {}", "─".repeat(86));

    let sample_interval = (trajectory.steps() / 25).max(1);
    for (i, (t, s, u)) in trajectory.samples().enumerate() {
        if i % sample_interval != 0 {
            continue;
        }
        println!(
            "  {:>6.2}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}  {:>7.3}  {:>7.3}",
            t, s[X], s[Y], s[THETA], s[VX], s[VY], s[OMEGA], u[0], u[1]
        );
    }
    let last = trajectory.final_state();
    println!(
        "  {:>6.2}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}",
        trajectory.final_time(),
        last[X],
        last[Y],
        last[THETA],
        last[VX],
        last[VY],
        last[OMEGA]
    );
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Final position error: {:>10.6} m", summary.final_position_error);
    println!("  Final speed:          {:>10.6} m/s", summary.final_speed);
    println!("  Peak |θ|:             {:>10.4} rad", summary.max_abs_theta);
    if let (Some(lo), Some(hi)) = (summary.min_thrust, summary.max_thrust) {
        println!("  Thrust range:         {:>10.3} .. {:.3} N", lo, hi);
    }
    match summary.settling_time {
        Some(t) => println!("  Settling time (±{} m): {:>8.2} s", summary.settling_band, t),
        None => println!("  Settling time (±{} m):      n/a", summary.settling_band),
    }
    println!();
    println!(
        "  Simulation: {} steps, dt={} s",
        trajectory.steps(),
        trajectory.sampling_time()
    );
    println!("====================================================================");
    println!();

    if let Some(path) = &cli.csv {
        io::csv::write_trajectory_file(path, &trajectory)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Trajectory written to {}", path.display());
    }
    if let Some(path) = &cli.json {
        io::json::write_summary_file(path, &summary)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Summary written to {}", path.display());
    }

    Ok(())
}
