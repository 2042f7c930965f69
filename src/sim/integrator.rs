use crate::dynamics::{self, AircraftParams, LongControls, LongState};
use crate::error::SingularInputError;

// ---------------------------------------------------------------------------
// Classical 4th-order Runge-Kutta
// ---------------------------------------------------------------------------

/// Single RK4 step of a fallible right-hand side `f(t, x)`.
pub fn rk4<F, E>(f: F, t: f64, x: &LongState, dt: f64) -> Result<LongState, E>
where
    F: Fn(f64, &LongState) -> Result<LongState, E>,
{
    let k1 = f(t, x)?;
    let k2 = f(t + dt * 0.5, &(x + k1 * (dt * 0.5)))?;
    let k3 = f(t + dt * 0.5, &(x + k2 * (dt * 0.5)))?;
    let k4 = f(t + dt, &(x + k3 * dt))?;
    Ok(x + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * (dt / 6.0))
}

/// Single RK4 step of the longitudinal model with controls held over the step.
pub fn rk4_step(
    t: f64,
    x: &LongState,
    u: &LongControls,
    params: &AircraftParams,
    dt: f64,
) -> Result<LongState, SingularInputError> {
    rk4(|t, x| dynamics::derivatives(t, x, u, params), t, x, dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    #[test]
    fn rk4_exact_for_cubic() {
        // x' = 3 t^2 has solution t^3; RK4 integrates cubics exactly
        let f = |t: f64, _x: &LongState| -> Result<LongState, ()> {
            Ok(Vector4::new(3.0 * t * t, 0.0, 0.0, 0.0))
        };
        let mut x = LongState::zeros();
        let mut t = 0.0;
        for _ in 0..10 {
            x = rk4(f, t, &x, 0.1).unwrap();
            t += 0.1;
        }
        assert!((x[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rk4_exponential_decay() {
        let f = |_t: f64, x: &LongState| -> Result<LongState, ()> { Ok(-x) };
        let mut x = Vector4::new(1.0, 2.0, 0.0, 0.0);
        for _ in 0..100 {
            x = rk4(f, 0.0, &x, 0.01).unwrap();
        }
        assert!((x[0] - (-1.0f64).exp()).abs() < 1e-9);
        assert!((x[1] - 2.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn error_aborts_step() {
        let p = AircraftParams::default();
        let x = Vector4::new(0.5, 0.0, 0.0, 0.0);
        let u = LongControls::new(80.0, 0.0);
        assert!(rk4_step(0.0, &x, &u, &p, 0.05).is_err());
    }
}
