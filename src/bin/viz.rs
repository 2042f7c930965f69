use std::time::Instant;

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use tecs_autopilot::config::{AutopilotConfig, LongitudinalLaw};
use tecs_autopilot::gnc::FlightMode;
use tecs_autopilot::history::{FlightHistory, PlotSample};
use tecs_autopilot::runtime::ControlLoop;
use tecs_autopilot::sim::{ModelPlant, PlantConfig};

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => AutopilotConfig::load(&path).unwrap_or_else(|e| {
            log::error!("{}: {}, using defaults", path, e);
            AutopilotConfig::default()
        }),
        None => AutopilotConfig {
            longitudinal_law: LongitudinalLaw::TotalEnergy,
            ..Default::default()
        },
    };

    let plant_config = PlantConfig { dt: config.loop_cfg.dt, ..Default::default() };
    let plant = ModelPlant::trimmed(plant_config, config.modes.climb_speed_kt, 400.0, config.modes.runway_heading_deg)
        .map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    let history = FlightHistory::new(config.loop_cfg.history_len);

    let app = AutopilotViz {
        control: ControlLoop::new(&config, FlightMode::Climb, plant, history),
        dt: config.loop_cfg.dt,
        last_frame: Instant::now(),
        backlog: 0.0,
        paused: false,
        fault: None,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native("Autopilot", options, Box::new(|_| Ok(Box::new(app))))
}

struct AutopilotViz {
    control: ControlLoop<ModelPlant, FlightHistory>,
    dt: f64,
    last_frame: Instant,
    /// Wall time not yet covered by ticks, s.
    backlog: f64,
    paused: bool,
    fault: Option<String>,
}

impl AutopilotViz {
    fn advance(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;
        if self.paused || self.fault.is_some() {
            return;
        }
        // Cap catch-up after a stall so the UI stays responsive.
        self.backlog = (self.backlog + elapsed).min(20.0 * self.dt);
        while self.backlog >= self.dt {
            self.backlog -= self.dt;
            if let Err(e) = self.control.tick() {
                self.fault = Some(e.to_string());
                break;
            }
        }
    }

    fn channel_plot(
        &self,
        ui: &mut egui::Ui,
        id: &str,
        title: &str,
        size: egui::Vec2,
        value: fn(&PlotSample) -> f64,
        setpoint: fn(&PlotSample) -> f64,
    ) {
        let history = self.control.sink();
        ui.vertical(|ui| {
            ui.label(title);
            let actual: PlotPoints = history.series(value).into();
            let target: PlotPoints = history.series(setpoint).into();
            Plot::new(id)
                .width(size.x)
                .height(size.y)
                .legend(Legend::default())
                .x_axis_label("Sample")
                .show(ui, |plot_ui| {
                    plot_ui.line(Line::new("actual", actual));
                    plot_ui.line(Line::new("setpoint", target));
                });
        });
    }
}

impl eframe::App for AutopilotViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            let plant = self.control.link().state();
            ui.heading(format!("Mode {}", self.control.autopilot.mode()));
            ui.label(format!(
                "t = {:.1} s  |  alt {:.0} ft  |  hdg {:.0} deg  |  {:.0} kt",
                plant.time,
                plant.altitude_ft,
                plant.heading_deg,
                plant.long[0] / self.control.link().config.kt_to_fps,
            ));
            ui.horizontal(|ui| {
                for mode in FlightMode::ALL {
                    if ui.button(mode.number().to_string()).on_hover_text(mode.to_string()).clicked() {
                        self.control.autopilot.override_mode(mode);
                    }
                }
                let label = if self.paused { "Resume" } else { "Pause" };
                if ui.button(label).clicked() {
                    self.paused = !self.paused;
                }
            });
            if let Some(fault) = &self.fault {
                ui.colored_label(egui::Color32::RED, fault);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let size = egui::vec2(available.x / 2.0 - 8.0, available.y / 3.0 - 24.0);

            ui.horizontal(|ui| {
                self.channel_plot(ui, "roll", "Roll (deg)", size, |s| s.roll, |s| s.roll_sp);
                self.channel_plot(ui, "pitch", "Pitch (deg)", size, |s| s.pitch, |s| s.pitch_sp);
            });
            ui.horizontal(|ui| {
                self.channel_plot(ui, "heading", "Heading (deg)", size, |s| s.heading, |s| s.heading_sp);
                self.channel_plot(ui, "altitude", "Altitude (ft)", size, |s| s.altitude, |s| s.altitude_sp);
            });
            ui.horizontal(|ui| {
                self.channel_plot(ui, "airspeed", "Airspeed (kt)", size, |s| s.airspeed, |s| s.airspeed_sp);
            });
        });

        ctx.request_repaint();
    }
}
