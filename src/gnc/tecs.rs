//! Total energy control: altitude and airspeed demands become a climb-angle
//! demand (energy distribution) and a throttle demand (total energy).
//!
//! Units follow the telemetry: feet, ft/s, ft/s^2. The pitch demand is
//! returned in radians.

use serde::{Deserialize, Serialize};

use super::pid::saturate;

/// Tunables for the energy mixer. Defaults are the reference constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TecsConfig {
    pub g: f64,              // ft/s^2
    pub hdot_min: f64,       // ft/s
    pub hdot_max: f64,       // ft/s
    pub vdot_min: f64,       // ft/s^2
    pub vdot_max: f64,       // ft/s^2
    pub altitude_error_gain: f64,
    pub airspeed_error_gain: f64,
    /// 0 = pitch holds altitude only, 2 = pitch holds speed only, 1 = neutral.
    pub pitch_speed_weight: f64,
    pub pitch_damping_gain: f64,
    pub seb_rate_ff: f64,
    pub max_climb_rate: f64, // ft/s
    pub min_sink_rate: f64,  // ft/s (negative)
    pub throttle_damping_gain: f64,
    pub throttle_trim: f64,
    /// Airspeed floor applied before any division by V.
    pub min_airspeed: f64,   // ft/s
}

impl Default for TecsConfig {
    fn default() -> Self {
        Self {
            g: 32.2,
            hdot_min: -17.0,
            hdot_max: 17.0,
            vdot_min: -10.0,
            vdot_max: 10.0,
            altitude_error_gain: 5.0,
            airspeed_error_gain: 5.0,
            pitch_speed_weight: 1.0,
            pitch_damping_gain: 0.1,
            seb_rate_ff: 1.0,
            max_climb_rate: 16.67,
            min_sink_rate: -16.67,
            throttle_damping_gain: 0.05,
            throttle_trim: 0.7,
            min_airspeed: 10.0,
        }
    }
}

/// Specific energies and their rates for one evaluation. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyState {
    pub ske: f64,
    pub spe: f64,
    pub ske_dot: f64,
    pub spe_dot: f64,
    pub ske_sp: f64,
    pub spe_sp: f64,
    pub ske_dot_sp: f64,
    pub spe_dot_sp: f64,
    /// Weighted specific energy balance rate (pitch axis).
    pub seb_dot: f64,
    pub seb_dot_sp: f64,
    /// Specific total energy rate (throttle axis).
    pub ste_dot: f64,
    pub ste_dot_sp: f64,
}

/// Mixer output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TecsOutput {
    /// Climb-angle demand, rad. Unclamped.
    pub pitch_setpoint: f64,
    /// Throttle demand, nominally [0, 1]. Unclamped.
    pub throttle_setpoint: f64,
    pub energy: EnergyState,
}

/// Stateless energy mixer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tecs {
    pub config: TecsConfig,
}

impl Tecs {
    pub fn new(config: TecsConfig) -> Self {
        Self { config }
    }

    /// `(pitch_setpoint, throttle_setpoint)` for the given demands and state.
    pub fn compute(&self, h_sp: f64, v_sp: f64, h: f64, v: f64, hdot: f64, vdot: f64) -> (f64, f64) {
        let out = self.evaluate(h_sp, v_sp, h, v, hdot, vdot);
        (out.pitch_setpoint, out.throttle_setpoint)
    }

    /// Same as [`Tecs::compute`] but also exposes the energy terms.
    pub fn evaluate(&self, h_sp: f64, v_sp: f64, h: f64, v: f64, hdot: f64, vdot: f64) -> TecsOutput {
        let c = &self.config;
        let g = c.g;

        let vdot_sp = saturate((v_sp - v) * c.airspeed_error_gain, c.vdot_min, c.vdot_max);
        let hdot_sp = saturate((h_sp - h) * c.altitude_error_gain, c.hdot_min, c.hdot_max);

        let ske = 0.5 * v * v;
        let spe = h * g;
        let spe_dot = hdot * g;
        let ske_dot = v * vdot;

        let spe_sp = h_sp * g;
        let ske_sp = 0.5 * v_sp * v_sp;
        let ske_dot_sp = v_sp * vdot_sp;
        let spe_dot_sp = hdot_sp * g;

        // --- Pitch: specific energy balance ---
        let weight = saturate(c.pitch_speed_weight, 0.0, 2.0);
        let spe_weight = 2.0 - weight;
        let ske_weight = weight;

        let seb_dot = spe_dot * spe_weight - ske_dot * ske_weight;
        let seb_dot_sp = spe_dot_sp * spe_weight - ske_dot_sp * ske_weight;

        let v_guarded = v.max(c.min_airspeed);
        let climb_angle_to_seb_rate = v_guarded * g;
        let seb_dot_correction =
            (seb_dot_sp - seb_dot) * c.pitch_damping_gain + c.seb_rate_ff * seb_dot_sp;
        let pitch_setpoint = seb_dot_correction / climb_angle_to_seb_rate;

        // --- Throttle: specific total energy ---
        let ste_dot = spe_dot + ske_dot;
        let ste_dot_sp = spe_dot_sp + ske_dot_sp;

        let ste_dot_max = c.max_climb_rate * g;
        let ste_dot_min = c.min_sink_rate * g;
        let ste_dot_to_throttle = 1.0 / (ste_dot_max - ste_dot_min);

        let throttle_above_trim_per_ste_rate = (1.0 - c.throttle_trim) / ste_dot_max;
        let throttle_below_trim_per_ste_rate = c.throttle_trim / ste_dot_max;

        // Negative demand must pull the feed-forward below trim.
        let throttle_ff = if ste_dot_sp >= 0.0 {
            c.throttle_trim + ste_dot_sp * throttle_above_trim_per_ste_rate
        } else {
            c.throttle_trim + ste_dot_sp * throttle_below_trim_per_ste_rate
        };

        let throttle_setpoint =
            (ste_dot_sp - ste_dot) * c.throttle_damping_gain * ste_dot_to_throttle + throttle_ff;

        TecsOutput {
            pitch_setpoint,
            throttle_setpoint,
            energy: EnergyState {
                ske,
                spe,
                ske_dot,
                spe_dot,
                ske_sp,
                spe_sp,
                ske_dot_sp,
                spe_dot_sp,
                seb_dot,
                seb_dot_sp,
                ste_dot,
                ste_dot_sp,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn on_setpoint_gives_trim() {
        let tecs = Tecs::default();
        let (pitch, throttle) = tecs.compute(1500.0, 160.0, 1500.0, 160.0, 0.0, 0.0);
        assert_abs_diff_eq!(pitch, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(throttle, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn pitch_monotonic_in_altitude_demand() {
        let tecs = Tecs::default();
        let mut prev = f64::NEG_INFINITY;
        for i in 0..200 {
            let h_sp = 1000.0 + i as f64 * 5.0;
            let (pitch, _) = tecs.compute(h_sp, 160.0, 1500.0, 158.0, 1.0, -0.5);
            assert!(pitch >= prev, "pitch decreased at h_sp={h_sp}");
            prev = pitch;
        }
    }

    #[test]
    fn climb_demand_raises_pitch_and_throttle() {
        let tecs = Tecs::default();
        let (pitch, throttle) = tecs.compute(2000.0, 160.0, 1500.0, 160.0, 0.0, 0.0);
        assert!(pitch > 0.0);
        assert!(throttle > 0.7);
        // hdot demand saturates at 17 ft/s: SEB_sp = 17 * 32.2
        let expected = (17.0 * 32.2 * 0.1 + 17.0 * 32.2) / (160.0 * 32.2);
        assert_abs_diff_eq!(pitch, expected, epsilon = 1e-12);
    }

    #[test]
    fn descent_demand_below_trim() {
        let tecs = Tecs::default();
        let (pitch, throttle) = tecs.compute(1000.0, 160.0, 1500.0, 160.0, 0.0, 0.0);
        assert!(pitch < 0.0);
        assert!(throttle < 0.7);
    }

    #[test]
    fn speed_demand_pitches_down_with_neutral_weight() {
        let tecs = Tecs::default();
        let (pitch, throttle) = tecs.compute(1500.0, 180.0, 1500.0, 160.0, 0.0, 0.0);
        assert!(pitch < 0.0, "trading altitude for speed should pitch down");
        assert!(throttle > 0.7);
    }

    #[test]
    fn zero_airspeed_is_floored() {
        let tecs = Tecs::default();
        let out = tecs.evaluate(1500.0, 160.0, 1400.0, 0.0, 0.0, 0.0);
        assert!(out.pitch_setpoint.is_finite());
        assert!(out.throttle_setpoint.is_finite());
    }

    #[test]
    fn inverted_rate_bounds_are_reordered() {
        let swapped = Tecs::new(TecsConfig {
            hdot_min: 17.0,
            hdot_max: -17.0,
            vdot_min: 10.0,
            vdot_max: -10.0,
            ..TecsConfig::default()
        });
        let reference = Tecs::default();
        let a = swapped.compute(2000.0, 180.0, 1500.0, 160.0, 0.0, 0.0);
        let b = reference.compute(2000.0, 180.0, 1500.0, 160.0, 0.0, 0.0);
        assert_abs_diff_eq!(a.0, b.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.1, b.1, epsilon = 1e-12);
    }

    #[test]
    fn energy_terms_reported() {
        let tecs = Tecs::default();
        let out = tecs.evaluate(1500.0, 160.0, 1000.0, 150.0, 5.0, 1.0);
        assert_abs_diff_eq!(out.energy.ske, 0.5 * 150.0 * 150.0);
        assert_abs_diff_eq!(out.energy.spe, 1000.0 * 32.2);
        assert_abs_diff_eq!(out.energy.ste_dot, 5.0 * 32.2 + 150.0);
    }
}
