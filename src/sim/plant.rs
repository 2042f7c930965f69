//! Model-backed stand-in for the flight-dynamics host.
//!
//! Longitudinal motion comes from the nonlinear model; lateral motion is a
//! kinematic coordinated turn in the air and nosewheel steering on the
//! ground. Each accepted command advances the plant by one control period.

use serde::{Deserialize, Serialize};

use crate::dynamics::state::{IDX_ALPHA, IDX_THETA, IDX_V};
use crate::dynamics::{self, long_controls, AircraftParams, LongState};
use crate::error::TransportError;
use crate::gnc::wrap_degrees;
use crate::link::{Actuation, ControlCommand, Telemetry, TelemetryFrame};
use super::integrator::rk4_step;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub aircraft: AircraftParams,
    pub dt: f64,
    /// Shaft power at full throttle.
    pub max_power_hp: f64,
    /// Elevator travel at full deflection, rad.
    pub max_elevator_deflection: f64,
    /// Steady roll rate at full aileron, deg/s.
    pub max_roll_rate_dps: f64,
    /// Roll-rate lag behind aileron, s.
    pub roll_time_constant: f64,
    /// Heading rate at full rudder while on the ground, deg/s.
    pub max_nosewheel_rate_dps: f64,
    pub kt_to_fps: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            aircraft: AircraftParams::cessna_172(),
            dt: 0.05,
            max_power_hp: 160.0,
            max_elevator_deflection: 25f64.to_radians(),
            max_roll_rate_dps: 60.0,
            roll_time_constant: 0.3,
            max_nosewheel_rate_dps: 15.0,
            kt_to_fps: 1.688,
        }
    }
}

/// Full plant state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantState {
    pub time: f64,
    pub long: LongState,
    pub altitude_ft: f64,
    pub heading_deg: f64,
    pub roll_deg: f64,
    pub roll_rate_dps: f64,
    pub on_ground: bool,
}

/// Surfaces as last commanded; axes sent as `None` keep these values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct HeldControls {
    elevator: f64,
    aileron: f64,
    rudder: f64,
    throttle: f64,
}

pub struct ModelPlant {
    pub config: PlantConfig,
    state: PlantState,
    held: HeldControls,
    v_dot: f64,
    pending_read_failures: u32,
    pending_write_failures: u32,
}

impl ModelPlant {
    pub fn new(config: PlantConfig, initial: PlantState) -> Self {
        Self {
            config,
            state: initial,
            held: HeldControls::default(),
            v_dot: 0.0,
            pending_read_failures: 0,
            pending_write_failures: 0,
        }
    }

    /// Trimmed level flight at `airspeed_kt`, wings level.
    pub fn trimmed(
        config: PlantConfig,
        airspeed_kt: f64,
        altitude_ft: f64,
        heading_deg: f64,
    ) -> Result<Self, crate::error::TrimError> {
        let trim = dynamics::trim_level_flight(airspeed_kt * config.kt_to_fps, &config.aircraft)?;
        let mut plant = Self::new(
            config,
            PlantState {
                time: 0.0,
                long: trim.state,
                altitude_ft,
                heading_deg,
                roll_deg: 0.0,
                roll_rate_dps: 0.0,
                on_ground: false,
            },
        );
        plant.held.throttle = trim.controls[0] / config.max_power_hp;
        plant.held.elevator = trim.controls[1] / config.max_elevator_deflection;
        Ok(plant)
    }

    pub fn state(&self) -> &PlantState {
        &self.state
    }

    /// Direct access for setting up upsets and test conditions.
    pub fn state_mut(&mut self) -> &mut PlantState {
        &mut self.state
    }

    /// Make the next `n` reads fail.
    pub fn inject_read_failures(&mut self, n: u32) {
        self.pending_read_failures = n;
    }

    /// Make the next `n` writes fail.
    pub fn inject_write_failures(&mut self, n: u32) {
        self.pending_write_failures = n;
    }

    pub fn frame(&self) -> TelemetryFrame {
        let s = &self.state;
        let v = s.long[IDX_V];
        let gamma = s.long[IDX_THETA] - s.long[IDX_ALPHA];
        TelemetryFrame {
            pitch_deg: s.long[IDX_THETA].to_degrees(),
            roll_deg: s.roll_deg,
            heading_mag_deg: s.heading_deg,
            airspeed_kt: v / self.config.kt_to_fps,
            altitude_ft: s.altitude_ft,
            vertical_speed_fpm: v * gamma.sin() * 60.0,
            airspeed_accel_kt_s: self.v_dot / self.config.kt_to_fps,
            on_ground: s.on_ground,
            localizer_dots: 0.0,
            glideslope_dots: 0.0,
        }
    }

    /// Advance one control period with the held controls.
    pub fn advance(&mut self) -> Result<(), TransportError> {
        let c = &self.config;
        let dt = c.dt;
        let u = long_controls(
            self.held.throttle.clamp(0.0, 1.0) * c.max_power_hp,
            self.held.elevator.clamp(-1.0, 1.0) * c.max_elevator_deflection,
        );

        let prev_v = self.state.long[IDX_V];
        let next = rk4_step(self.state.time, &self.state.long, &u, &c.aircraft, dt)
            .map_err(|e| TransportError::Rejected(format!("plant left its envelope: {e}")))?;

        let gamma = next[IDX_THETA] - next[IDX_ALPHA];
        let v = next[IDX_V];

        let s = &mut self.state;
        s.long = next;
        s.altitude_ft += v * gamma.sin() * dt;
        let rate_demand = self.held.aileron.clamp(-1.0, 1.0) * c.max_roll_rate_dps;
        s.roll_rate_dps += (rate_demand - s.roll_rate_dps) * dt / c.roll_time_constant.max(dt);
        s.roll_deg = (s.roll_deg + s.roll_rate_dps * dt).clamp(-80.0, 80.0);
        let turn_rate_dps = if s.on_ground {
            self.held.rudder.clamp(-1.0, 1.0) * c.max_nosewheel_rate_dps
        } else {
            (c.aircraft.g * s.roll_deg.to_radians().tan() / v).to_degrees()
        };
        s.heading_deg = wrap_degrees(s.heading_deg + turn_rate_dps * dt).rem_euclid(360.0);
        if s.altitude_ft <= 0.0 {
            s.altitude_ft = 0.0;
            s.on_ground = true;
        } else {
            s.on_ground = false;
        }
        s.time += dt;
        self.v_dot = (v - prev_v) / dt;
        Ok(())
    }
}

impl Telemetry for ModelPlant {
    fn read(&mut self) -> Result<TelemetryFrame, TransportError> {
        if self.pending_read_failures > 0 {
            self.pending_read_failures -= 1;
            return Err(TransportError::Timeout);
        }
        Ok(self.frame())
    }
}

impl Actuation for ModelPlant {
    fn write(&mut self, command: &ControlCommand) -> Result<(), TransportError> {
        if self.pending_write_failures > 0 {
            self.pending_write_failures -= 1;
            return Err(TransportError::Disconnected);
        }
        let cmd = command.saturated();
        if let Some(v) = cmd.elevator {
            self.held.elevator = v;
        }
        if let Some(v) = cmd.aileron {
            self.held.aileron = v;
        }
        if let Some(v) = cmd.rudder {
            self.held.rudder = v;
        }
        if let Some(v) = cmd.throttle {
            self.held.throttle = v;
        }
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cruise() -> ModelPlant {
        ModelPlant::trimmed(PlantConfig::default(), 95.0, 1000.0, 240.0).unwrap()
    }

    #[test]
    fn trimmed_plant_holds_altitude_with_no_command_change() {
        let mut plant = cruise();
        let hold = ControlCommand::default();
        for _ in 0..100 {
            plant.write(&hold).unwrap();
        }
        let f = plant.read().unwrap();
        assert!((f.altitude_ft - 1000.0).abs() < 1.0, "alt {}", f.altitude_ft);
        assert!((f.airspeed_kt - 95.0).abs() < 0.5);
        assert!((f.heading_mag_deg - 240.0).abs() < 1e-6);
    }

    #[test]
    fn aileron_turns_right() {
        let mut plant = cruise();
        let cmd = ControlCommand { aileron: Some(0.2), ..Default::default() };
        for _ in 0..20 {
            plant.write(&cmd).unwrap();
        }
        let f = plant.read().unwrap();
        assert!(f.roll_deg > 0.0);
        assert!(f.heading_mag_deg > 240.0);
    }

    #[test]
    fn rudder_steers_only_on_the_ground() {
        let cmd = ControlCommand { rudder: Some(0.5), ..Default::default() };

        let mut airborne = cruise();
        airborne.write(&cmd).unwrap();
        assert!((airborne.state().heading_deg - 240.0).abs() < 1e-9);

        let mut rolling = cruise();
        rolling.state_mut().altitude_ft = 0.0;
        rolling.state_mut().on_ground = true;
        rolling.write(&cmd).unwrap();
        // 0.5 x 15 deg/s for one 0.05 s period
        assert!((rolling.state().heading_deg - 240.375).abs() < 1e-9);
    }

    #[test]
    fn injected_failures_are_counted_down() {
        let mut plant = cruise();
        plant.inject_read_failures(2);
        assert_eq!(plant.read(), Err(TransportError::Timeout));
        assert_eq!(plant.read(), Err(TransportError::Timeout));
        assert!(plant.read().is_ok());

        plant.inject_write_failures(1);
        let t0 = plant.state().time;
        assert_eq!(plant.write(&ControlCommand::default()), Err(TransportError::Disconnected));
        assert_eq!(plant.state().time, t0, "a failed write must not advance the plant");
    }

    #[test]
    fn descending_into_the_ground_sets_weight_on_wheels() {
        let mut plant = ModelPlant::trimmed(PlantConfig::default(), 90.0, 5.0, 60.0).unwrap();
        let cmd = ControlCommand { elevator: Some(-0.3), throttle: Some(0.0), ..Default::default() };
        for _ in 0..40 {
            plant.write(&cmd).unwrap();
            if plant.read().unwrap().on_ground {
                break;
            }
        }
        let f = plant.read().unwrap();
        assert!(f.on_ground);
        assert_eq!(f.altitude_ft, 0.0);
    }
}
