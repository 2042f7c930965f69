//! Telemetry/actuation boundary to the flight-dynamics host.
//!
//! The host itself is out of scope; the autopilot only sees the two traits
//! below and the types they exchange.

use serde::{Deserialize, Serialize};

use crate::config::TelemetryScale;
use crate::error::TransportError;

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Raw snapshot as the host reports it (simulator units).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub heading_mag_deg: f64,
    pub airspeed_kt: f64,
    pub altitude_ft: f64,
    pub vertical_speed_fpm: f64,
    pub airspeed_accel_kt_s: f64,
    pub on_ground: bool,
    /// Localizer deviation, dots.
    pub localizer_dots: f64,
    /// Glideslope deviation, dots.
    pub glideslope_dots: f64,
}

/// Per-cycle aircraft state in control-law units. Replaced wholesale each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AircraftState {
    pub airspeed_kt: f64,
    pub altitude_ft: f64,
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub heading_deg: f64,
    pub vertical_speed_fps: f64,
    /// Along-track airspeed rate, ft/s^2.
    pub acceleration_fps2: f64,
    pub on_ground: bool,
    pub localizer_deviation: f64,
    pub glideslope_deviation: f64,
    /// Indicated airspeed in ft/s, for the energy mixer.
    pub airspeed_fps: f64,
}

impl AircraftState {
    pub fn from_frame(frame: &TelemetryFrame, scale: &TelemetryScale) -> Self {
        Self {
            airspeed_kt: frame.airspeed_kt,
            altitude_ft: frame.altitude_ft,
            roll_deg: frame.roll_deg,
            pitch_deg: frame.pitch_deg,
            heading_deg: frame.heading_mag_deg,
            vertical_speed_fps: frame.vertical_speed_fpm / scale.seconds_per_minute,
            acceleration_fps2: frame.airspeed_accel_kt_s * scale.kt_to_fps,
            on_ground: frame.on_ground,
            localizer_deviation: frame.localizer_dots * scale.localizer,
            glideslope_deviation: frame.glideslope_dots * scale.glideslope,
            airspeed_fps: frame.airspeed_kt * scale.kt_to_fps,
        }
    }
}

// ---------------------------------------------------------------------------
// Actuation
// ---------------------------------------------------------------------------

/// One control-surface or throttle command. `None` on a [`ControlCommand`]
/// axis means "leave the host's current value alone".
pub type AxisCommand = Option<f64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub elevator: AxisCommand,  // [-1, 1], positive nose up
    pub aileron: AxisCommand,   // [-1, 1], positive right wing down
    pub rudder: AxisCommand,    // [-1, 1]
    pub throttle: AxisCommand,  // [0, 1]
}

impl ControlCommand {
    /// Clamp every commanded axis into its legal range.
    pub fn saturated(self) -> Self {
        let surface = |a: AxisCommand| a.map(|v| crate::gnc::saturate(v, -1.0, 1.0));
        Self {
            elevator: surface(self.elevator),
            aileron: surface(self.aileron),
            rudder: surface(self.rudder),
            throttle: self.throttle.map(|v| crate::gnc::saturate(v, 0.0, 1.0)),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Source of aircraft state.
pub trait Telemetry {
    fn read(&mut self) -> Result<TelemetryFrame, TransportError>;
}

/// Sink for control commands.
pub trait Actuation {
    fn write(&mut self, command: &ControlCommand) -> Result<(), TransportError>;
}
