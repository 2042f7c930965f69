//! Version-tagged autopilot configuration.
//!
//! Every field defaults to the reference tuning, so a config file only needs
//! the values it changes (plus `version`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gnc::{ModeTable, PidGains, TecsConfig};

pub const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub dt: f64,                     // s, 20 Hz
    pub max_consecutive_failures: u32,
    pub history_len: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { dt: 0.05, max_consecutive_failures: 10, history_len: 300 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gains {
    pub roll: PidGains,
    pub pitch: PidGains,
    pub altitude: PidGains,
    pub heading: PidGains,
    pub speed: PidGains,
    pub localizer: PidGains,
    pub glideslope: PidGains,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            roll: PidGains::new(0.05, 0.01, 0.005),
            pitch: PidGains::new(0.06, 0.02, 0.014),
            altitude: PidGains::new(0.2, 0.04, 0.03),
            heading: PidGains::new(0.5, 0.01, 0.05).wrapped(),
            speed: PidGains::new(0.2, 0.04, 0.09),
            localizer: PidGains::new(-8.0, 0.0, -0.02),
            glideslope: PidGains::new(3.0, 0.3, 0.05),
        }
    }
}

/// Saturation applied to outer-loop outputs before they become inner-loop
/// setpoints (deg), plus the rudder coordination factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub pitch_deg: f64,
    pub glideslope_pitch_deg: f64,
    pub roll_deg: f64,
    pub tecs_pitch_min_deg: f64,
    pub tecs_pitch_max_deg: f64,
    pub rudder_per_roll: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            pitch_deg: 10.0,
            glideslope_pitch_deg: 5.0,
            roll_deg: 20.0,
            tecs_pitch_min_deg: -15.0,
            tecs_pitch_max_deg: 10.0,
            rudder_per_roll: 5.0,
        }
    }
}

/// Unit conversions applied to raw telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryScale {
    pub kt_to_fps: f64,
    pub seconds_per_minute: f64,
    pub glideslope: f64,
    pub localizer: f64,
}

impl Default for TelemetryScale {
    fn default() -> Self {
        Self { kt_to_fps: 1.688, seconds_per_minute: 60.0, glideslope: 0.35, localizer: 1.0 }
    }
}

/// How altitude and speed demands reach pitch and throttle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongitudinalLaw {
    /// Altitude PID drives pitch, speed PID drives throttle.
    #[default]
    Cascaded,
    /// Energy mixer drives both in the pattern legs.
    TotalEnergy,
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub version: u32,
    #[serde(rename = "loop")]
    pub loop_cfg: LoopConfig,
    pub gains: Gains,
    pub limits: Limits,
    pub tecs: TecsConfig,
    pub modes: ModeTable,
    pub telemetry: TelemetryScale,
    pub longitudinal_law: LongitudinalLaw,
    /// Steer with the rudder (roll demand x `rudder_per_roll`) on the ground.
    pub ground_rudder_steering: bool,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            loop_cfg: LoopConfig::default(),
            gains: Gains::default(),
            limits: Limits::default(),
            tecs: TecsConfig::default(),
            modes: ModeTable::default(),
            telemetry: TelemetryScale::default(),
            longitudinal_law: LongitudinalLaw::default(),
            ground_rudder_steering: false,
        }
    }
}

impl AutopilotConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: AutopilotConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                expected: CONFIG_VERSION,
            });
        }
        if !(self.loop_cfg.dt > 0.0 && self.loop_cfg.dt.is_finite()) {
            return Err(ConfigError::Invalid(format!("loop.dt must be positive, got {}", self.loop_cfg.dt)));
        }
        if self.loop_cfg.history_len == 0 {
            return Err(ConfigError::Invalid("loop.history_len must be at least 1".into()));
        }
        let l = &self.limits;
        for (name, value) in [
            ("limits.pitch_deg", l.pitch_deg),
            ("limits.glideslope_pitch_deg", l.glideslope_pitch_deg),
            ("limits.roll_deg", l.roll_deg),
            ("limits.rudder_per_roll", l.rudder_per_roll),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid(format!("{name} must be finite and non-negative, got {value}")));
            }
        }
        if !(l.tecs_pitch_min_deg.is_finite() && l.tecs_pitch_max_deg.is_finite())
            || l.tecs_pitch_min_deg > l.tecs_pitch_max_deg
        {
            return Err(ConfigError::Invalid(format!(
                "limits.tecs_pitch_min_deg ({}) must not exceed limits.tecs_pitch_max_deg ({})",
                l.tecs_pitch_min_deg, l.tecs_pitch_max_deg
            )));
        }
        let t = &self.tecs;
        if t.hdot_min > t.hdot_max || t.vdot_min > t.vdot_max {
            return Err(ConfigError::Invalid("tecs rate bounds are inverted".into()));
        }
        if !(0.0..=2.0).contains(&t.pitch_speed_weight) {
            return Err(ConfigError::Invalid(format!(
                "tecs.pitch_speed_weight must be in [0, 2], got {}",
                t.pitch_speed_weight
            )));
        }
        if t.max_climb_rate <= 0.0 || t.min_sink_rate >= 0.0 {
            return Err(ConfigError::Invalid("tecs climb/sink normalization must straddle zero".into()));
        }
        if t.min_airspeed <= 0.0 {
            return Err(ConfigError::Invalid("tecs.min_airspeed must be positive".into()));
        }
        if self.modes.flare_time_constant_s <= 0.0 {
            return Err(ConfigError::Invalid("modes.flare_time_constant_s must be positive".into()));
        }
        Ok(())
    }
}
