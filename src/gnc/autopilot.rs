use log::{debug, info};

use crate::config::{AutopilotConfig, Limits, LongitudinalLaw, TelemetryScale};
use crate::history::PlotSample;
use crate::link::{AircraftState, ControlCommand};
use super::modes::{FlightMode, GuidanceInputs, ModeSequencer, SetpointBundle};
use super::pid::{saturate, Pid};
use super::tecs::{Tecs, TecsOutput};

// ---------------------------------------------------------------------------
// Cascaded control law: mode -> outer loops -> inner loops -> surfaces
// ---------------------------------------------------------------------------

/// Result of one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub mode: FlightMode,
    /// Set when the automatic rules changed mode this cycle.
    pub transition: Option<FlightMode>,
    pub command: ControlCommand,
    pub sample: PlotSample,
    /// Energy mixer output, when it drove the longitudinal axes.
    pub tecs: Option<TecsOutput>,
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    pub roll_pid: Pid,
    pub pitch_pid: Pid,
    pub altitude_pid: Pid,
    pub heading_pid: Pid,
    pub speed_pid: Pid,
    pub localizer_pid: Pid,
    pub glideslope_pid: Pid,
    tecs: Tecs,
    sequencer: ModeSequencer,
    limits: Limits,
    scale: TelemetryScale,
    law: LongitudinalLaw,
    ground_rudder_steering: bool,
    dt: f64,
}

impl Autopilot {
    pub fn new(config: &AutopilotConfig, initial: FlightMode) -> Self {
        let dt = config.loop_cfg.dt;
        let g = &config.gains;
        let mut autopilot = Self {
            roll_pid: Pid::new(g.roll, dt),
            pitch_pid: Pid::new(g.pitch, dt),
            altitude_pid: Pid::new(g.altitude, dt),
            heading_pid: Pid::new(g.heading, dt),
            speed_pid: Pid::new(g.speed, dt),
            localizer_pid: Pid::new(g.localizer, dt),
            glideslope_pid: Pid::new(g.glideslope, dt),
            tecs: Tecs::new(config.tecs),
            sequencer: ModeSequencer::new(config.modes, initial),
            limits: config.limits,
            scale: config.telemetry,
            law: config.longitudinal_law,
            ground_rudder_steering: config.ground_rudder_steering,
            dt,
        };

        // Starting mid-pattern: inherit the setpoints of the legs before `initial`.
        let at_rest = AircraftState::default();
        let guidance = GuidanceInputs::default();
        for mode in FlightMode::ALL.into_iter().take_while(|m| *m != initial) {
            let bundle = autopilot.sequencer.table.select_setpoints(mode, &at_rest, &guidance);
            autopilot.apply_setpoints(&bundle);
        }
        autopilot
    }

    pub fn mode(&self) -> FlightMode {
        self.sequencer.mode()
    }

    pub fn sequencer(&self) -> &ModeSequencer {
        &self.sequencer
    }

    /// Manual mode selection from outside the automatic rules.
    pub fn override_mode(&mut self, mode: FlightMode) -> bool {
        let changed = self.sequencer.set_mode(mode);
        if changed {
            info!("manual override: mode {}", mode);
        }
        changed
    }

    /// Run one full control cycle against a fresh state.
    pub fn step(&mut self, state: &AircraftState) -> CycleReport {
        let transition = self.sequencer.evaluate(state);
        if let Some(mode) = transition {
            info!("switched to mode {}", mode);
        }
        let mode = self.sequencer.mode();

        // --- Guidance ---
        if mode == FlightMode::IlsTracking {
            self.localizer_pid.update(state.localizer_deviation);
            self.glideslope_pid.update(state.glideslope_deviation);
        }
        let guidance = GuidanceInputs {
            flare_elapsed_s: self.sequencer.flare_elapsed(),
            localizer_correction_deg: self.localizer_pid.output(),
        };
        let bundle = self.sequencer.table.select_setpoints(mode, state, &guidance);
        self.apply_setpoints(&bundle);

        // --- Outer loop ---
        self.heading_pid.update(state.heading_deg);
        self.altitude_pid.update(state.altitude_ft);

        let mut tecs_out = None;
        let pitch_sp = if mode == FlightMode::IlsTracking {
            let lim = self.limits.glideslope_pitch_deg;
            saturate(self.glideslope_pid.output(), -lim, lim)
        } else if self.law == LongitudinalLaw::TotalEnergy && mode.is_pattern() {
            let out = self.tecs.evaluate(
                self.altitude_pid.setpoint(),
                self.speed_pid.setpoint() * self.scale.kt_to_fps,
                state.altitude_ft,
                state.airspeed_fps,
                state.vertical_speed_fps,
                state.acceleration_fps2,
            );
            tecs_out = Some(out);
            saturate(
                out.pitch_setpoint.to_degrees(),
                self.limits.tecs_pitch_min_deg,
                self.limits.tecs_pitch_max_deg,
            )
        } else {
            let lim = self.limits.pitch_deg;
            saturate(self.altitude_pid.output(), -lim, lim)
        };
        let roll_lim = self.limits.roll_deg;
        let roll_sp = saturate(self.heading_pid.output(), -roll_lim, roll_lim);

        // --- Inner loop ---
        self.pitch_pid.set_setpoint(pitch_sp);
        self.roll_pid.set_setpoint(roll_sp);
        self.pitch_pid.update(state.pitch_deg);
        self.roll_pid.update(state.roll_deg);
        self.speed_pid.update(state.airspeed_kt);

        let elevator = saturate(self.pitch_pid.output(), -1.0, 1.0);
        let aileron = saturate(self.roll_pid.output(), -1.0, 1.0);
        let throttle_demand = tecs_out.map_or(self.speed_pid.output(), |t| t.throttle_setpoint);
        let throttle = saturate(throttle_demand, 0.0, 1.0);
        let rudder =
            saturate(self.roll_pid.output() * self.limits.rudder_per_roll, -1.0, 1.0);

        let command = if mode.is_ground() {
            ControlCommand {
                elevator: Some(elevator),
                aileron: Some(0.0),
                rudder: self.ground_rudder_steering.then_some(rudder),
                throttle: Some(throttle),
            }
        } else {
            ControlCommand {
                elevator: Some(elevator),
                aileron: Some(aileron),
                rudder: Some(0.0),
                throttle: Some(throttle),
            }
        };

        self.sequencer.advance(self.dt);

        let sample = PlotSample {
            roll: state.roll_deg,
            roll_sp,
            pitch: state.pitch_deg,
            pitch_sp,
            heading: state.heading_deg,
            heading_sp: self.heading_pid.setpoint(),
            altitude: state.altitude_ft,
            altitude_sp: self.altitude_pid.setpoint(),
            airspeed: state.airspeed_kt,
            airspeed_sp: self.speed_pid.setpoint(),
        };
        debug!(
            "mode {} ele {:.3} ail {:.3} thr {:.3} pitch_sp {:.2} roll_sp {:.2}",
            mode.number(),
            elevator,
            aileron,
            throttle,
            pitch_sp,
            roll_sp
        );

        CycleReport { mode, transition, command, sample, tecs: tecs_out }
    }

    fn apply_setpoints(&mut self, bundle: &SetpointBundle) {
        if let Some(v) = bundle.heading {
            self.heading_pid.set_setpoint(v);
        }
        if let Some(v) = bundle.altitude {
            self.altitude_pid.set_setpoint(v);
        }
        if let Some(v) = bundle.speed {
            self.speed_pid.set_setpoint(v);
        }
        if let Some(v) = bundle.localizer {
            self.localizer_pid.set_setpoint(v);
        }
        if let Some(v) = bundle.glideslope {
            self.glideslope_pid.set_setpoint(v);
        }
    }

    pub fn reset(&mut self) {
        for pid in [
            &mut self.roll_pid,
            &mut self.pitch_pid,
            &mut self.altitude_pid,
            &mut self.heading_pid,
            &mut self.speed_pid,
            &mut self.localizer_pid,
            &mut self.glideslope_pid,
        ] {
            pid.reset();
        }
    }
}

impl super::Controller for Autopilot {
    fn control(&mut self, state: &AircraftState) -> ControlCommand {
        self.step(state).command
    }

    fn reset(&mut self) {
        Autopilot::reset(self);
    }

    fn name(&self) -> &str {
        "Autopilot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cruise(altitude_ft: f64, heading_deg: f64) -> AircraftState {
        AircraftState {
            airspeed_kt: 90.0,
            airspeed_fps: 90.0 * 1.688,
            altitude_ft,
            heading_deg,
            ..Default::default()
        }
    }

    #[test]
    fn commands_are_always_in_range() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::Climb);
        for i in 0..200 {
            let s = AircraftState {
                altitude_ft: -500.0 + i as f64 * 37.0,
                heading_deg: (i * 53 % 360) as f64,
                pitch_deg: 40.0 - i as f64,
                roll_deg: 60.0 - i as f64 * 0.6,
                airspeed_kt: i as f64,
                ..Default::default()
            };
            let c = ap.step(&s).command;
            for axis in [c.elevator, c.aileron, c.rudder].into_iter().flatten() {
                assert!((-1.0..=1.0).contains(&axis));
            }
            let thr = c.throttle.unwrap();
            assert!((0.0..=1.0).contains(&thr));
        }
    }

    #[test]
    fn ground_modes_leave_rudder_alone() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::PreTakeoff);
        let c = ap.step(&AircraftState { on_ground: true, ..Default::default() }).command;
        assert_eq!(c.aileron, Some(0.0));
        assert_eq!(c.rudder, None);
        // Full throttle demand below rotate speed
        assert_eq!(c.throttle, Some(1.0));
    }

    #[test]
    fn ground_rudder_steering_uses_roll_demand() {
        let cfg = AutopilotConfig { ground_rudder_steering: true, ..Default::default() };
        let mut ap = Autopilot::new(&cfg, FlightMode::PreTakeoff);
        let s = AircraftState { on_ground: true, heading_deg: 40.0, ..Default::default() };
        let c = ap.step(&s).command;
        let expected = saturate(ap.roll_pid.output() * 5.0, -1.0, 1.0);
        assert_eq!(c.rudder, Some(expected));
        assert!(expected > 0.0, "runway heading is to the right");
    }

    #[test]
    fn airborne_modes_centre_rudder() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::DownwindLeg);
        let c = ap.step(&cruise(1000.0, 240.0)).command;
        assert_eq!(c.rudder, Some(0.0));
        assert!(c.aileron.is_some());
    }

    #[test]
    fn roll_setpoint_is_limited() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::DownwindLeg);
        // 240 deg demanded while flying 61: 179 deg of error
        let r = ap.step(&cruise(1000.0, 61.0));
        assert_abs_diff_eq!(r.sample.roll_sp.abs(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn inverted_limits_still_saturate() {
        let mut cfg = AutopilotConfig {
            longitudinal_law: LongitudinalLaw::TotalEnergy,
            ..Default::default()
        };
        cfg.limits.roll_deg = -20.0;
        cfg.limits.pitch_deg = -10.0;
        cfg.limits.tecs_pitch_min_deg = 10.0;
        cfg.limits.tecs_pitch_max_deg = -15.0;
        cfg.tecs.hdot_min = 17.0;
        cfg.tecs.hdot_max = -17.0;
        assert!(cfg.validate().is_err());

        let mut ap = Autopilot::new(&cfg, FlightMode::DownwindLeg);
        let r = ap.step(&cruise(600.0, 61.0));
        assert!(r.tecs.is_some());
        assert!(r.sample.roll_sp.abs() <= 20.0);
        assert!((-15.0..=10.0).contains(&r.sample.pitch_sp));
        assert!(r.command.elevator.is_some_and(|e| (-1.0..=1.0).contains(&e)));
    }

    #[test]
    fn untouched_setpoints_persist_across_modes() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::CrosswindClimb);
        ap.step(&cruise(600.0, 330.0));
        assert_eq!(ap.altitude_pid.setpoint(), 1000.0);
        // Downwind only owns heading; altitude hold stays at 1000 ft
        ap.override_mode(FlightMode::DownwindLeg);
        let r = ap.step(&cruise(1000.0, 300.0));
        assert_eq!(r.sample.altitude_sp, 1000.0);
        assert_eq!(r.sample.heading_sp, 240.0);
        // Climb speed, inherited at construction
        assert_eq!(r.sample.airspeed_sp, 90.0);
    }

    #[test]
    fn starting_mid_pattern_inherits_earlier_setpoints() {
        let ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::DownwindLeg);
        assert_eq!(ap.altitude_pid.setpoint(), 1000.0);
        assert_eq!(ap.speed_pid.setpoint(), 90.0);
        assert_eq!(ap.heading_pid.setpoint(), 330.0);

        let ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::PreTakeoff);
        assert_eq!(ap.altitude_pid.setpoint(), 0.0);
    }

    #[test]
    fn glideslope_drives_pitch_in_ils() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::IlsTracking);
        let s = AircraftState {
            airspeed_kt: 70.0,
            altitude_ft: 800.0,
            heading_deg: 59.6,
            glideslope_deviation: -10.0,
            ..Default::default()
        };
        let r = ap.step(&s);
        // Well below setpoint: pitch demand saturates at the glideslope limit
        assert_abs_diff_eq!(r.sample.pitch_sp, 5.0, epsilon = 1e-12);
        assert_eq!(r.sample.airspeed_sp, 70.0);
    }

    #[test]
    fn localizer_output_biases_heading() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::IlsTracking);
        let s = AircraftState {
            airspeed_kt: 70.0,
            altitude_ft: 800.0,
            localizer_deviation: 0.5,
            ..Default::default()
        };
        let r = ap.step(&s);
        // kp = -8 on error -0.5 => +4 deg, first sample has no derivative term
        assert_abs_diff_eq!(r.sample.heading_sp, 59.6 + 4.0, epsilon = 1e-9);
    }

    #[test]
    fn flare_tracks_decaying_altitude() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::IlsTracking);
        let low = AircraftState { airspeed_kt: 65.0, altitude_ft: 69.0, ..Default::default() };
        let r = ap.step(&low);
        assert_eq!(r.transition, Some(FlightMode::Flare));
        assert_abs_diff_eq!(r.sample.altitude_sp, 70.0, epsilon = 1e-12);
        let r = ap.step(&low);
        assert!(r.sample.altitude_sp < 70.0);
        assert_eq!(r.command.throttle, Some(0.0));
    }

    #[test]
    fn touchdown_goes_to_rollout() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::Flare);
        let r = ap.step(&AircraftState { airspeed_kt: 60.0, on_ground: true, ..Default::default() });
        assert_eq!(r.mode, FlightMode::RolloutStop);
        assert_eq!(r.command.rudder, None);
        assert_eq!(r.command.throttle, Some(0.0));
    }

    #[test]
    fn total_energy_law_in_pattern() {
        let cfg = AutopilotConfig {
            longitudinal_law: LongitudinalLaw::TotalEnergy,
            ..Default::default()
        };
        let mut ap = Autopilot::new(&cfg, FlightMode::Climb);
        let r = ap.step(&cruise(400.0, 59.6));
        let tecs = r.tecs.expect("mixer should drive the pattern legs");
        assert!(tecs.pitch_setpoint > 0.0);
        assert!(r.sample.pitch_sp > 0.0 && r.sample.pitch_sp <= 10.0);

        // ILS keeps the glideslope loop
        ap.override_mode(FlightMode::IlsTracking);
        assert!(ap.step(&cruise(500.0, 59.6)).tecs.is_none());
    }

    #[test]
    fn override_reports_change() {
        let mut ap = Autopilot::new(&AutopilotConfig::default(), FlightMode::DownwindLeg);
        assert!(ap.override_mode(FlightMode::BaseLeg));
        assert!(!ap.override_mode(FlightMode::BaseLeg));
        assert_eq!(ap.mode(), FlightMode::BaseLeg);
    }
}
