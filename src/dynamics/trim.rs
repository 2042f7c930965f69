use nalgebra::{Matrix3, Matrix4, Matrix4x2, Vector3};

use crate::error::{SingularInputError, TrimError};
use super::longitudinal::derivatives;
use super::state::{
    long_controls, long_state, AircraftParams, LongControls, LongState, IDX_ALPHA, IDX_Q, IDX_V,
};

const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-10;

/// Steady, wings-level, unaccelerated flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimPoint {
    pub state: LongState,
    pub controls: LongControls,
    pub iterations: usize,
    /// Max-norm of `[V_dot, alpha_dot, q_dot]` at the solution.
    pub residual: f64,
}

/// Trim for level flight at `airspeed` (ft/s).
///
/// Unknowns are alpha, elevator and throttle with theta = alpha and q = 0.
/// Newton iteration on a forward-difference Jacobian.
pub fn trim_level_flight(airspeed: f64, params: &AircraftParams) -> Result<TrimPoint, TrimError> {
    if !(airspeed > params.min_airspeed) {
        return Err(SingularInputError {
            quantity: "airspeed",
            value: airspeed,
            floor: params.min_airspeed,
        }
        .into());
    }

    // [alpha (rad), elevator (rad), throttle (hp)]
    let mut z = Vector3::new(0.05, 0.0, 50.0);
    let steps = Vector3::new(1e-7, 1e-7, 1e-5);

    let mut r = residual(airspeed, &z, params)?;
    for iteration in 0..MAX_ITERATIONS {
        let norm = r.amax();
        if norm < TOLERANCE {
            return Ok(trim_point(airspeed, &z, iteration, norm));
        }

        let mut jac = Matrix3::zeros();
        for j in 0..3 {
            let mut zp = z;
            zp[j] += steps[j];
            let rp = residual(airspeed, &zp, params)?;
            jac.set_column(j, &((rp - r) / steps[j]));
        }

        let dz = jac.lu().solve(&(-r)).ok_or(TrimError::SingularJacobian)?;
        z += dz;
        r = residual(airspeed, &z, params)?;
    }

    let norm = r.amax();
    if norm < TOLERANCE {
        Ok(trim_point(airspeed, &z, MAX_ITERATIONS, norm))
    } else {
        Err(TrimError::NotConverged { iterations: MAX_ITERATIONS, residual: norm })
    }
}

fn trim_point(airspeed: f64, z: &Vector3<f64>, iterations: usize, residual: f64) -> TrimPoint {
    TrimPoint {
        state: long_state(airspeed, z[0], z[0], 0.0),
        controls: long_controls(z[2], z[1]),
        iterations,
        residual,
    }
}

fn residual(
    airspeed: f64,
    z: &Vector3<f64>,
    params: &AircraftParams,
) -> Result<Vector3<f64>, SingularInputError> {
    let x = long_state(airspeed, z[0], z[0], 0.0);
    let u = long_controls(z[2], z[1]);
    let xdot = derivatives(0.0, &x, &u, params)?;
    Ok(Vector3::new(xdot[IDX_V], xdot[IDX_ALPHA], xdot[IDX_Q]))
}

/// Central-difference Jacobians `(A, B)` of the model about `(x, u)`.
pub fn linearize(
    x: &LongState,
    u: &LongControls,
    params: &AircraftParams,
) -> Result<(Matrix4<f64>, Matrix4x2<f64>), SingularInputError> {
    let delta = 1e-6;
    let mut a = Matrix4::zeros();
    let mut b = Matrix4x2::zeros();

    for j in 0..4 {
        let mut xp = *x;
        let mut xm = *x;
        xp[j] += delta;
        xm[j] -= delta;
        let col = (derivatives(0.0, &xp, u, params)? - derivatives(0.0, &xm, u, params)?)
            / (2.0 * delta);
        a.set_column(j, &col);
    }
    for j in 0..2 {
        let mut up = *u;
        let mut um = *u;
        up[j] += delta;
        um[j] -= delta;
        let col = (derivatives(0.0, x, &up, params)? - derivatives(0.0, x, &um, params)?)
            / (2.0 * delta);
        b.set_column(j, &col);
    }
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::{IDX_ELEVATOR, IDX_THETA, IDX_THROTTLE};

    #[test]
    fn trimmed_derivatives_vanish() {
        let p = AircraftParams::default();
        let trim = trim_level_flight(160.0, &p).unwrap();
        let xdot = derivatives(0.0, &trim.state, &trim.controls, &p).unwrap();
        for i in 0..4 {
            assert!(xdot[i].abs() < 1e-6, "derivative {} = {:e}", i, xdot[i]);
        }
    }

    #[test]
    fn trim_is_physical() {
        let p = AircraftParams::default();
        let trim = trim_level_flight(160.0, &p).unwrap();
        let alpha = trim.state[IDX_ALPHA];
        assert!(alpha > 0.0 && alpha < 0.15, "alpha = {alpha}");
        assert_eq!(trim.state[IDX_THETA], alpha);
        let hp = trim.controls[IDX_THROTTLE];
        assert!(hp > 40.0 && hp < 160.0, "power = {hp} hp");
        assert!(trim.controls[IDX_ELEVATOR].abs() < 0.2);
    }

    #[test]
    fn slower_trim_needs_more_alpha() {
        let p = AircraftParams::default();
        let fast = trim_level_flight(180.0, &p).unwrap();
        let slow = trim_level_flight(120.0, &p).unwrap();
        assert!(slow.state[IDX_ALPHA] > fast.state[IDX_ALPHA]);
    }

    #[test]
    fn trim_rejects_zero_airspeed() {
        let p = AircraftParams::default();
        assert!(matches!(trim_level_flight(0.0, &p), Err(TrimError::Singular(_))));
    }

    #[test]
    fn linearization_shows_pitch_stiffness() {
        let p = AircraftParams::default();
        let trim = trim_level_flight(160.0, &p).unwrap();
        let (a, b) = linearize(&trim.state, &trim.controls, &p).unwrap();
        // theta_dot = q exactly
        assert!((a[(IDX_THETA, IDX_Q)] - 1.0).abs() < 1e-6);
        // Static stability: more alpha, nose-down moment
        assert!(a[(IDX_Q, IDX_ALPHA)] < 0.0);
        // Pitch damping
        assert!(a[(IDX_Q, IDX_Q)] < 0.0);
        // Up elevator, nose-up pitch acceleration
        assert!(b[(IDX_Q, IDX_ELEVATOR)] > 0.0);
        // Power accelerates
        assert!(b[(IDX_V, IDX_THROTTLE)] > 0.0);
    }
}
