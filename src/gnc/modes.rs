use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OverrideParseError;
use crate::link::AircraftState;

// ---------------------------------------------------------------------------
// Flight modes
// ---------------------------------------------------------------------------

/// Flight phase. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightMode {
    PreTakeoff,
    Climb,
    CrosswindClimb,
    DownwindLeg,
    /// Base leg; flies the localizer intercept heading.
    BaseLeg,
    IlsTracking,
    Flare,
    RolloutStop,
}

impl FlightMode {
    pub const ALL: [FlightMode; 8] = [
        FlightMode::PreTakeoff,
        FlightMode::Climb,
        FlightMode::CrosswindClimb,
        FlightMode::DownwindLeg,
        FlightMode::BaseLeg,
        FlightMode::IlsTracking,
        FlightMode::Flare,
        FlightMode::RolloutStop,
    ];

    /// Console selector number, 1..=8.
    pub fn number(self) -> u8 {
        match self {
            FlightMode::PreTakeoff => 1,
            FlightMode::Climb => 2,
            FlightMode::CrosswindClimb => 3,
            FlightMode::DownwindLeg => 4,
            FlightMode::BaseLeg => 5,
            FlightMode::IlsTracking => 6,
            FlightMode::Flare => 7,
            FlightMode::RolloutStop => 8,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// Parse a console selector. Accepts float text such as `"6.0"`.
    pub fn parse_selector(text: &str) -> Result<Self, OverrideParseError> {
        let trimmed = text.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| OverrideParseError::NotNumeric(trimmed.to_string()))?;
        if value.fract() != 0.0 || !(1.0..=8.0).contains(&value) {
            return Err(OverrideParseError::OutOfRange(value));
        }
        Self::from_number(value as u8).ok_or(OverrideParseError::OutOfRange(value))
    }

    /// Weight on wheels phases: lateral control goes through the rudder.
    pub fn is_ground(self) -> bool {
        matches!(self, FlightMode::PreTakeoff | FlightMode::RolloutStop)
    }

    /// Airborne pattern legs where altitude and speed are both held.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            FlightMode::Climb
                | FlightMode::CrosswindClimb
                | FlightMode::DownwindLeg
                | FlightMode::BaseLeg
        )
    }
}

impl fmt::Display for FlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightMode::PreTakeoff => "pre-takeoff",
            FlightMode::Climb => "climb",
            FlightMode::CrosswindClimb => "crosswind climb",
            FlightMode::DownwindLeg => "downwind",
            FlightMode::BaseLeg => "base / localizer intercept",
            FlightMode::IlsTracking => "ILS tracking",
            FlightMode::Flare => "flare",
            FlightMode::RolloutStop => "rollout",
        };
        write!(f, "{} ({})", self.number(), name)
    }
}

// ---------------------------------------------------------------------------
// Mode table: thresholds and per-mode setpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTable {
    pub rotate_speed_kt: f64,
    pub crosswind_altitude_ft: f64,
    pub downwind_altitude_ft: f64,
    pub flare_altitude_ft: f64,

    pub runway_heading_deg: f64,
    pub takeoff_speed_kt: f64,
    pub climb_speed_kt: f64,
    pub crosswind_heading_deg: f64,
    pub downwind_heading_deg: f64,
    pub intercept_heading_deg: f64,
    pub approach_speed_kt: f64,
    pub localizer_course_deg: f64,

    /// Flare altitude law: amplitude * exp(-t / time_constant) + floor.
    pub flare_amplitude_ft: f64,
    pub flare_time_constant_s: f64,
    pub flare_floor_ft: f64,

    /// Setpoint that drives a loop to its lower stop (idle, nose down).
    pub idle_setpoint: f64,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            rotate_speed_kt: 70.0,
            crosswind_altitude_ft: 500.0,
            downwind_altitude_ft: 1000.0,
            flare_altitude_ft: 70.0,
            runway_heading_deg: 59.6,
            takeoff_speed_kt: 70.0,
            climb_speed_kt: 90.0,
            crosswind_heading_deg: 330.0,
            downwind_heading_deg: 240.0,
            intercept_heading_deg: 125.0,
            approach_speed_kt: 70.0,
            localizer_course_deg: 59.6,
            flare_amplitude_ft: 23.0,
            flare_time_constant_s: 3.0,
            flare_floor_ft: 47.0,
            idle_setpoint: -1.0,
        }
    }
}

/// Outer-loop setpoints a mode owns. `None` leaves the previous value in place.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetpointBundle {
    pub heading: Option<f64>,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub localizer: Option<f64>,
    pub glideslope: Option<f64>,
}

/// Inputs to setpoint selection that are not part of the aircraft state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GuidanceInputs {
    /// Seconds since Flare was entered.
    pub flare_elapsed_s: f64,
    /// Latest localizer PID output, deg of heading correction.
    pub localizer_correction_deg: f64,
}

impl ModeTable {
    /// Next mode given the current one and a fresh state.
    ///
    /// Rules are checked in a fixed order and the first match wins; modes
    /// without a rule only change through an external override.
    pub fn transition(&self, current: FlightMode, state: &AircraftState) -> FlightMode {
        use FlightMode::*;

        if current == PreTakeoff && state.airspeed_kt >= self.rotate_speed_kt {
            return Climb;
        }
        if current == Climb && state.altitude_ft >= self.crosswind_altitude_ft {
            return CrosswindClimb;
        }
        if current == CrosswindClimb && state.altitude_ft >= self.downwind_altitude_ft {
            return DownwindLeg;
        }
        if current == IlsTracking && state.altitude_ft <= self.flare_altitude_ft {
            return Flare;
        }
        if matches!(current, IlsTracking | Flare) && state.on_ground {
            return RolloutStop;
        }
        current
    }

    /// Altitude setpoint during flare, `t` seconds after entry.
    pub fn flare_altitude(&self, t: f64) -> f64 {
        self.flare_amplitude_ft * (-t.max(0.0) / self.flare_time_constant_s).exp()
            + self.flare_floor_ft
    }

    /// Outer-loop setpoints owned by `mode`.
    pub fn select_setpoints(
        &self,
        mode: FlightMode,
        _state: &AircraftState,
        guidance: &GuidanceInputs,
    ) -> SetpointBundle {
        let ils_heading = self.localizer_course_deg + guidance.localizer_correction_deg;
        match mode {
            FlightMode::PreTakeoff => SetpointBundle {
                speed: Some(self.takeoff_speed_kt),
                heading: Some(self.runway_heading_deg),
                ..Default::default()
            },
            FlightMode::Climb => SetpointBundle {
                speed: Some(self.climb_speed_kt),
                altitude: Some(self.crosswind_altitude_ft),
                ..Default::default()
            },
            FlightMode::CrosswindClimb => SetpointBundle {
                heading: Some(self.crosswind_heading_deg),
                altitude: Some(self.downwind_altitude_ft),
                ..Default::default()
            },
            FlightMode::DownwindLeg => SetpointBundle {
                heading: Some(self.downwind_heading_deg),
                ..Default::default()
            },
            FlightMode::BaseLeg => SetpointBundle {
                heading: Some(self.intercept_heading_deg),
                ..Default::default()
            },
            FlightMode::IlsTracking => SetpointBundle {
                speed: Some(self.approach_speed_kt),
                localizer: Some(0.0),
                glideslope: Some(0.0),
                heading: Some(ils_heading),
                ..Default::default()
            },
            FlightMode::Flare => SetpointBundle {
                heading: Some(ils_heading),
                altitude: Some(self.flare_altitude(guidance.flare_elapsed_s)),
                speed: Some(self.idle_setpoint),
                ..Default::default()
            },
            FlightMode::RolloutStop => SetpointBundle {
                speed: Some(self.idle_setpoint),
                altitude: Some(self.idle_setpoint),
                heading: Some(self.runway_heading_deg),
                ..Default::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Sequencer: current mode plus the flare timer
// ---------------------------------------------------------------------------

/// Holds the active mode and the only hidden state the sequencing needs.
#[derive(Debug, Clone)]
pub struct ModeSequencer {
    pub table: ModeTable,
    mode: FlightMode,
    flare_elapsed_s: f64,
}

impl ModeSequencer {
    pub fn new(table: ModeTable, initial: FlightMode) -> Self {
        Self { table, mode: initial, flare_elapsed_s: 0.0 }
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    pub fn flare_elapsed(&self) -> f64 {
        self.flare_elapsed_s
    }

    /// Force a mode (manual override). Returns true if the mode changed.
    pub fn set_mode(&mut self, mode: FlightMode) -> bool {
        self.enter(mode)
    }

    /// Evaluate the automatic transition rules once.
    /// Returns the new mode if a transition happened.
    pub fn evaluate(&mut self, state: &AircraftState) -> Option<FlightMode> {
        let next = self.table.transition(self.mode, state);
        self.enter(next).then_some(next)
    }

    /// Advance the flare timer by one control period. No-op outside Flare.
    pub fn advance(&mut self, dt: f64) {
        if self.mode == FlightMode::Flare {
            self.flare_elapsed_s += dt;
        }
    }

    fn enter(&mut self, mode: FlightMode) -> bool {
        if mode == self.mode {
            return false;
        }
        if mode == FlightMode::Flare {
            self.flare_elapsed_s = 0.0;
        }
        self.mode = mode;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn state(airspeed_kt: f64, altitude_ft: f64, on_ground: bool) -> AircraftState {
        AircraftState { airspeed_kt, altitude_ft, on_ground, ..Default::default() }
    }

    #[test]
    fn takeoff_threshold_is_inclusive() {
        let t = ModeTable::default();
        assert_eq!(t.transition(FlightMode::PreTakeoff, &state(69.9, 0.0, true)), FlightMode::PreTakeoff);
        assert_eq!(t.transition(FlightMode::PreTakeoff, &state(70.0, 0.0, true)), FlightMode::Climb);
    }

    #[test]
    fn one_transition_per_evaluation() {
        let mut seq = ModeSequencer::new(ModeTable::default(), FlightMode::PreTakeoff);
        // Already above every climb threshold: still advances a single step per tick
        let s = state(120.0, 1500.0, false);
        assert_eq!(seq.evaluate(&s), Some(FlightMode::Climb));
        assert_eq!(seq.evaluate(&s), Some(FlightMode::CrosswindClimb));
        assert_eq!(seq.evaluate(&s), Some(FlightMode::DownwindLeg));
        assert_eq!(seq.evaluate(&s), None);
        assert_eq!(seq.mode(), FlightMode::DownwindLeg);
    }

    #[test]
    fn reevaluation_is_idempotent() {
        let mut seq = ModeSequencer::new(ModeTable::default(), FlightMode::PreTakeoff);
        let s = state(70.0, 0.0, true);
        assert_eq!(seq.evaluate(&s), Some(FlightMode::Climb));
        assert_eq!(seq.evaluate(&s), None);
        assert_eq!(seq.mode(), FlightMode::Climb);
    }

    #[test]
    fn flare_outranks_touchdown() {
        let t = ModeTable::default();
        let s = state(65.0, 60.0, true);
        assert_eq!(t.transition(FlightMode::IlsTracking, &s), FlightMode::Flare);
        assert_eq!(t.transition(FlightMode::Flare, &s), FlightMode::RolloutStop);
    }

    #[test]
    fn touchdown_from_ils_above_flare_altitude() {
        let t = ModeTable::default();
        let s = state(65.0, 200.0, true);
        assert_eq!(t.transition(FlightMode::IlsTracking, &s), FlightMode::RolloutStop);
    }

    #[test]
    fn manual_modes_never_auto_transition() {
        let t = ModeTable::default();
        let s = state(200.0, 10.0, true);
        for mode in [FlightMode::DownwindLeg, FlightMode::BaseLeg, FlightMode::RolloutStop] {
            assert_eq!(t.transition(mode, &s), mode);
        }
    }

    #[test]
    fn flare_altitude_law() {
        let t = ModeTable::default();
        assert_abs_diff_eq!(t.flare_altitude(0.0), 70.0, epsilon = 1e-12);
        let mut prev = t.flare_altitude(0.0);
        for i in 1..400 {
            let h = t.flare_altitude(i as f64 * 0.05);
            assert!(h < prev);
            assert!(h > 47.0);
            prev = h;
        }
        assert_abs_diff_eq!(t.flare_altitude(1e3), 47.0, epsilon = 1e-9);
    }

    #[test]
    fn flare_timer_resets_on_reentry() {
        let mut seq = ModeSequencer::new(ModeTable::default(), FlightMode::IlsTracking);
        assert_eq!(seq.evaluate(&state(70.0, 65.0, false)), Some(FlightMode::Flare));
        for _ in 0..20 {
            seq.advance(0.05);
        }
        assert_abs_diff_eq!(seq.flare_elapsed(), 1.0, epsilon = 1e-9);

        seq.set_mode(FlightMode::IlsTracking);
        seq.advance(0.05);
        assert_abs_diff_eq!(seq.flare_elapsed(), 1.0, epsilon = 1e-9);

        seq.evaluate(&state(70.0, 65.0, false));
        assert_eq!(seq.mode(), FlightMode::Flare);
        assert_eq!(seq.flare_elapsed(), 0.0);
    }

    #[test]
    fn setpoints_follow_table() {
        let t = ModeTable::default();
        let s = AircraftState::default();
        let g = GuidanceInputs::default();

        let b = t.select_setpoints(FlightMode::Climb, &s, &g);
        assert_eq!(b.speed, Some(90.0));
        assert_eq!(b.altitude, Some(500.0));
        assert_eq!(b.heading, None);

        let b = t.select_setpoints(FlightMode::DownwindLeg, &s, &g);
        assert_eq!(b.heading, Some(240.0));
        assert_eq!(b.altitude, None);
        assert_eq!(b.speed, None);
    }

    #[test]
    fn ils_heading_adds_localizer_correction() {
        let t = ModeTable::default();
        let g = GuidanceInputs { localizer_correction_deg: -4.0, flare_elapsed_s: 3.0 };
        let b = t.select_setpoints(FlightMode::IlsTracking, &AircraftState::default(), &g);
        assert_abs_diff_eq!(b.heading.unwrap(), 55.6, epsilon = 1e-9);
        assert_eq!(b.glideslope, Some(0.0));

        let b = t.select_setpoints(FlightMode::Flare, &AircraftState::default(), &g);
        assert_abs_diff_eq!(b.heading.unwrap(), 55.6, epsilon = 1e-9);
        assert_abs_diff_eq!(b.altitude.unwrap(), 23.0 * (-1.0f64).exp() + 47.0, epsilon = 1e-9);
        assert_eq!(b.speed, Some(-1.0));
    }

    #[test]
    fn selector_parsing() {
        assert_eq!(FlightMode::parse_selector("6"), Ok(FlightMode::IlsTracking));
        assert_eq!(FlightMode::parse_selector(" 5.0\n"), Ok(FlightMode::BaseLeg));
        assert!(matches!(
            FlightMode::parse_selector("nine"),
            Err(OverrideParseError::NotNumeric(_))
        ));
        assert_eq!(FlightMode::parse_selector("9"), Err(OverrideParseError::OutOfRange(9.0)));
        assert_eq!(FlightMode::parse_selector("2.5"), Err(OverrideParseError::OutOfRange(2.5)));
        for mode in FlightMode::ALL {
            assert_eq!(FlightMode::from_number(mode.number()), Some(mode));
        }
        assert_eq!(FlightMode::from_number(0), None);
    }
}
