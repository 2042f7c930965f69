use tecs_autopilot::config::TelemetryScale;
use tecs_autopilot::gnc::{saturate, Controller};
use tecs_autopilot::link::{Actuation, AircraftState, ControlCommand, Telemetry};
use tecs_autopilot::sim::{ModelPlant, PlantConfig};

/// Proportional wings-leveler with a fixed pitch attitude. Leaves the
/// throttle alone.
struct WingLeveler {
    pitch_deg: f64,
    k_pitch: f64,
    k_roll: f64,
}

impl Controller for WingLeveler {
    fn control(&mut self, state: &AircraftState) -> ControlCommand {
        ControlCommand {
            elevator: Some(saturate(self.k_pitch * (self.pitch_deg - state.pitch_deg), -1.0, 1.0)),
            aileron: Some(saturate(-self.k_roll * state.roll_deg, -1.0, 1.0)),
            rudder: Some(0.0),
            throttle: None,
        }
    }

    fn name(&self) -> &str {
        "WingLeveler"
    }
}

fn main() {
    let scale = TelemetryScale::default();
    let mut plant = match ModelPlant::trimmed(PlantConfig::default(), 90.0, 1500.0, 240.0) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("trim failed: {e}");
            return;
        }
    };

    // Upset: 30 deg right bank
    plant.state_mut().roll_deg = 30.0;

    let mut controller = WingLeveler { pitch_deg: 3.0, k_pitch: 0.05, k_roll: 0.03 };
    println!("Flying 20 s with {} controller...", controller.name());

    for i in 0..400 {
        let frame = match plant.read() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("read failed: {e}");
                return;
            }
        };
        let state = AircraftState::from_frame(&frame, &scale);
        if i % 40 == 0 {
            println!(
                "  t={:>5.1}s  roll={:>6.1}  pitch={:>5.1}  hdg={:>6.1}  alt={:>7.1}",
                i as f64 * 0.05, state.roll_deg, state.pitch_deg, state.heading_deg, state.altitude_ft
            );
        }
        let cmd = controller.control(&state);
        if let Err(e) = plant.write(&cmd) {
            eprintln!("write failed: {e}");
            return;
        }
    }
}
