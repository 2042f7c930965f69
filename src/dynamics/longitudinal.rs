use nalgebra::{Vector2, Vector4};

use crate::error::SingularInputError;
use super::state::{
    AircraftParams, LongControls, LongState, HP_TO_FT_LBF_S, IDX_ALPHA, IDX_ELEVATOR, IDX_Q,
    IDX_THETA, IDX_THROTTLE, IDX_V,
};

// ---------------------------------------------------------------------------
// Nonlinear longitudinal equations of motion
// ---------------------------------------------------------------------------

/// Forces, moments and coefficients behind one derivative evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroBreakdown {
    pub qbar: f64,
    pub thrust: f64,
    pub gamma: f64,
    pub alpha_dot: f64,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
    pub lift: f64,
    pub drag: f64,
    pub moment: f64,
}

/// State derivative `[V_dot, alpha_dot, theta_dot, q_dot]`.
///
/// Pure and reentrant: safe to call for every stage of any integrator.
/// `_t` is accepted for integrator signatures; the model is autonomous.
pub fn derivatives(
    _t: f64,
    x: &LongState,
    u: &LongControls,
    params: &AircraftParams,
) -> Result<LongState, SingularInputError> {
    let (xdot, _) = evaluate(x, u, params)?;
    Ok(xdot)
}

/// Model outputs `[theta, gamma]` (rad).
pub fn outputs(_t: f64, x: &LongState, _u: &LongControls, _params: &AircraftParams) -> Vector2<f64> {
    Vector2::new(x[IDX_THETA], x[IDX_THETA] - x[IDX_ALPHA])
}

/// Derivative plus the aerodynamic breakdown it was computed from.
pub fn evaluate(
    x: &LongState,
    u: &LongControls,
    p: &AircraftParams,
) -> Result<(LongState, AeroBreakdown), SingularInputError> {
    let v = x[IDX_V];
    let alpha = x[IDX_ALPHA];
    let theta = x[IDX_THETA];
    let q = x[IDX_Q];

    if !(v > p.min_airspeed) {
        return Err(SingularInputError { quantity: "airspeed", value: v, floor: p.min_airspeed });
    }

    let w = p.weight;
    let s = p.wing_area;
    let cbar = p.chord;
    let m = p.mass();

    let qbar = 0.5 * p.rho * v * v;

    let throttle = u[IDX_THROTTLE];
    // Model convention: positive deflection is trailing edge down (nose down)
    let el = -u[IDX_ELEVATOR];

    let thrust = HP_TO_FT_LBF_S * throttle * p.prop_efficiency / v;
    let gamma = theta - alpha;
    let rate_scale = cbar / (2.0 * v);

    // alpha_dot appears in its own lift term; solve the linear relation in closed form
    let cl_static = p.cl0 + p.cl_alpha * alpha + p.cl_elevator * el + rate_scale * p.cl_q * q;
    let num = -qbar * s * cl_static + w * gamma.cos() - thrust * (alpha - p.thrust_incidence).sin()
        + m * v * q;
    let den = m * v - cbar * p.cl_alpha_dot / (2.0 * v);
    let alpha_dot = num / den;

    let cl = cl_static + rate_scale * p.cl_alpha_dot * alpha_dot;
    let cd = p.cd_min
        + p.k_induced * (p.cl0 + p.cl_alpha * alpha + p.cl_elevator * el - p.cl_at_cd_min).powi(2);
    let cm = p.cm0
        + p.cm_alpha * alpha
        + p.cm_elevator * el
        + rate_scale * p.cm_alpha_dot * alpha_dot
        + rate_scale * p.cm_q * q;

    let lift = qbar * s * cl;
    let drag = qbar * s * cd;
    let moment = qbar * s * cbar * cm;

    let v_dot = (-drag - w * gamma.sin() + thrust * (alpha - p.thrust_incidence).cos()) / m;
    let q_dot = moment / p.inertia_yy;

    let xdot = Vector4::new(v_dot, alpha_dot, q, q_dot);
    let breakdown = AeroBreakdown {
        qbar,
        thrust,
        gamma,
        alpha_dot,
        cl,
        cd,
        cm,
        lift,
        drag,
        moment,
    };
    Ok((xdot, breakdown))
}
