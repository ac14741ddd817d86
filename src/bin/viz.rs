use eframe::egui;
use egui_plot::{Line, Plot};

use planar_rotor::dynamics::state::{SimConfig, State};
use planar_rotor::io::RunSummary;
use planar_rotor::sim::{self, PlotSeries};
use planar_rotor::vehicle::RotorParams;

const STATE_LABELS: [&str; 6] = [
    "x (m)",
    "y (m)",
    "θ (rad)",
    "vx (m/s)",
    "vy (m/s)",
    "ω (rad/s)",
];

fn main() -> anyhow::Result<()> {
    let params = RotorParams::default();
    let config = SimConfig::default();
    let x0 = State::new(0.5, -0.5, 0.0, 0.0, 0.0, 0.0);
    let trajectory = sim::simulate(&params, x0, &config)?;

    let app = SimViz {
        series: trajectory.plot_series(),
        summary: RunSummary::from_trajectory(&trajectory),
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 1100.0]),
        ..Default::default()
    };
    eframe::run_native("Planar Rotor LQR", options, Box::new(|_| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

struct SimViz {
    series: PlotSeries,
    summary: RunSummary,
}

impl SimViz {
    fn points(&self, row: impl Fn(usize) -> f64) -> Vec<[f64; 2]> {
        self.series
            .times
            .iter()
            .enumerate()
            .map(|(i, &t)| [t, row(i)])
            .collect()
    }
}

impl eframe::App for SimViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading("LQR hover recovery");
            ui.label(format!(
                "Steps: {}  |  Final error: {:.4} m  |  Peak |θ|: {:.3} rad  |  Settling: {}",
                self.summary.steps,
                self.summary.final_position_error,
                self.summary.max_abs_theta,
                self.summary
                    .settling_time
                    .map_or("n/a".to_string(), |t| format!("{t:.2} s")),
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let width = ui.available_width();
            let height = ui.available_height() / 7.0 - 8.0;

            egui::ScrollArea::vertical().show(ui, |ui| {
                for (row, label) in STATE_LABELS.iter().enumerate() {
                    ui.label(*label);
                    let points = self.points(|i| self.series.states[(row, i)]);
                    Plot::new(format!("state_{row}"))
                        .width(width)
                        .height(height)
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new(*label, points));
                        });
                }

                ui.label("Thrust (N)");
                let f1 = self.points(|i| self.series.inputs[(0, i)]);
                let f2 = self.points(|i| self.series.inputs[(1, i)]);
                Plot::new("thrust")
                    .width(width)
                    .height(height)
                    .x_axis_label("Time (s)")
                    .show(ui, |plot_ui| {
                        plot_ui.line(Line::new("f1", f1));
                        plot_ui.line(Line::new("f2", f2));
                    });
            });
        });
    }
}
