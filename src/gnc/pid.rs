use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PID Controller (single loop, fixed step)
// ---------------------------------------------------------------------------

/// Gains and behaviour flags for one loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Symmetric bound on the integral accumulator.
    #[serde(default = "default_windup_guard")]
    pub windup_guard: f64,
    /// Treat the error as an angle in degrees and wrap it into (-180, 180].
    #[serde(default)]
    pub angle_wrap: bool,
}

fn default_windup_guard() -> f64 {
    20.0
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd, windup_guard: 20.0, angle_wrap: false }
    }

    pub const fn wrapped(mut self) -> Self {
        self.angle_wrap = true;
        self
    }
}

/// Discrete PID with derivative-on-measurement and a clamped integrator.
///
/// The output is never clamped here; each caller applies the saturation
/// that fits its loop.
#[derive(Debug, Clone)]
pub struct Pid {
    pub gains: PidGains,
    dt: f64,
    setpoint: f64,
    integral: f64,
    prev_error: f64,
    prev_measurement: Option<f64>,
    output: f64,
}

impl Pid {
    pub fn new(gains: PidGains, dt: f64) -> Self {
        Self {
            gains,
            dt,
            setpoint: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            prev_measurement: None,
            output: 0.0,
        }
    }

    pub fn set_setpoint(&mut self, value: f64) {
        self.setpoint = value;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Output of the most recent `update`.
    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn last_error(&self) -> f64 {
        self.prev_error
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn update(&mut self, measurement: f64) -> f64 {
        let mut error = self.setpoint - measurement;
        if self.gains.angle_wrap {
            error = wrap_degrees(error);
        }

        let guard = self.gains.windup_guard.abs();
        self.integral = saturate(self.integral + error * self.dt, -guard, guard);

        // First sample has no history: no derivative kick.
        let measurement_rate = match self.prev_measurement {
            Some(prev) if self.dt > 0.0 => {
                let mut delta = measurement - prev;
                if self.gains.angle_wrap {
                    delta = wrap_degrees(delta);
                }
                delta / self.dt
            }
            _ => 0.0,
        };

        self.prev_error = error;
        self.prev_measurement = Some(measurement);
        self.output =
            self.gains.kp * error + self.gains.ki * self.integral - self.gains.kd * measurement_rate;
        self.output
    }

    /// Clear accumulated history. Gains and setpoint are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_measurement = None;
        self.output = 0.0;
    }
}

/// Wrap an angle difference in degrees into (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Saturate `value` into the interval spanned by `lo` and `hi`.
///
/// Never panics: inverted bounds are reordered and a NaN value maps to the
/// lower bound.
pub fn saturate(value: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if value.is_nan() {
        lo
    } else {
        value.max(lo).min(hi)
    }
}
