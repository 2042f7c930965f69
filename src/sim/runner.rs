use nalgebra::Vector2;

use crate::dynamics::{self, AircraftParams, LongControls, LongState};
use crate::error::SimError;
use super::integrator::rk4_step;

// ---------------------------------------------------------------------------
// Open-loop trajectory generation for the longitudinal model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub dt: f64,        // integration timestep, s
    pub max_time: f64,  // hard stop, s
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,         // 100 Hz
            max_time: 60.0,
        }
    }
}

/// One sampled point of a model trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub state: LongState,
    pub controls: LongControls,
    /// `[theta, gamma]`, rad.
    pub outputs: Vector2<f64>,
}

/// Integrate from `initial` until `max_time`, asking `schedule` for the
/// controls at the start of every step.
///
/// `dt` must be finite and positive and `max_time` finite and non-negative.
pub fn simulate<S>(
    initial: LongState,
    params: &AircraftParams,
    config: &SimConfig,
    mut schedule: S,
) -> Result<Vec<TrajectoryPoint>, SimError>
where
    S: FnMut(f64, &LongState) -> LongControls,
{
    if !(config.dt > 0.0 && config.dt.is_finite()) {
        return Err(SimError::InvalidTiming(format!("dt must be positive, got {}", config.dt)));
    }
    if !(config.max_time >= 0.0 && config.max_time.is_finite()) {
        return Err(SimError::InvalidTiming(format!(
            "max_time must be non-negative, got {}",
            config.max_time
        )));
    }
    let steps = (config.max_time / config.dt).round() as usize;
    let mut trajectory = Vec::with_capacity((steps + 1).min(1_000_000));

    let mut t = 0.0;
    let mut x = initial;
    let mut u = schedule(t, &x);
    trajectory.push(point(t, &x, &u, params));

    for i in 1..=steps {
        x = rk4_step(t, &x, &u, params, config.dt)?;
        t = i as f64 * config.dt;
        u = schedule(t, &x);
        trajectory.push(point(t, &x, &u, params));
    }

    Ok(trajectory)
}

fn point(t: f64, x: &LongState, u: &LongControls, params: &AircraftParams) -> TrajectoryPoint {
    TrajectoryPoint {
        time: t,
        state: *x,
        controls: *u,
        outputs: dynamics::outputs(t, x, u, params),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
