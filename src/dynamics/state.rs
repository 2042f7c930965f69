use nalgebra::{Vector2, Vector4};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Physical constants (imperial units)
// ---------------------------------------------------------------------------

pub const G_FPS2: f64 = 32.2;             // ft/s^2
pub const RHO_SEA_LEVEL: f64 = 2.377e-3;  // slug/ft^3
pub const HP_TO_FT_LBF_S: f64 = 550.0;

// ---------------------------------------------------------------------------
// Longitudinal state and inputs
// ---------------------------------------------------------------------------

/// `[V (ft/s), alpha (rad), theta (rad), q (rad/s)]`. V must stay positive.
pub type LongState = Vector4<f64>;

/// `[throttle (shaft hp), elevator (rad, positive nose up)]`.
pub type LongControls = Vector2<f64>;

pub const IDX_V: usize = 0;
pub const IDX_ALPHA: usize = 1;
pub const IDX_THETA: usize = 2;
pub const IDX_Q: usize = 3;

pub const IDX_THROTTLE: usize = 0;
pub const IDX_ELEVATOR: usize = 1;

pub fn long_state(v: f64, alpha: f64, theta: f64, q: f64) -> LongState {
    Vector4::new(v, alpha, theta, q)
}

pub fn long_controls(throttle_hp: f64, elevator_rad: f64) -> LongControls {
    Vector2::new(throttle_hp, elevator_rad)
}

// ---------------------------------------------------------------------------
// Airframe parameters
// ---------------------------------------------------------------------------

/// Mass, geometry and stability derivatives. Angles in rad, derivatives /rad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AircraftParams {
    pub weight: f64,      // lbf
    pub wing_area: f64,   // ft^2
    pub chord: f64,       // ft, mean aerodynamic chord
    pub inertia_yy: f64,  // slug ft^2
    pub rho: f64,         // slug/ft^3
    pub g: f64,           // ft/s^2

    // Lift
    pub cl0: f64,
    pub cl_alpha: f64,
    pub cl_elevator: f64,
    pub cl_alpha_dot: f64,
    pub cl_q: f64,

    // Drag polar
    pub cd_min: f64,
    pub k_induced: f64,
    pub cl_at_cd_min: f64,

    // Pitching moment
    pub cm0: f64,
    pub cm_alpha: f64,
    pub cm_elevator: f64,
    pub cm_alpha_dot: f64,
    pub cm_q: f64,

    pub prop_efficiency: f64,
    /// Thrust line incidence, rad.
    pub thrust_incidence: f64,

    /// Singularity floor for every division by V.
    pub min_airspeed: f64, // ft/s
}

impl AircraftParams {
    pub fn mass(&self) -> f64 {
        self.weight / self.g
    }

    /// Cessna 172 (Roskam, Airplane Flight Dynamics), sea level.
    pub fn cessna_172() -> Self {
        Self {
            weight: 2650.0,
            wing_area: 174.0,
            chord: 4.9,
            inertia_yy: 1346.0,
            rho: RHO_SEA_LEVEL,
            g: G_FPS2,
            cl0: 0.307,
            cl_alpha: 4.41,
            cl_elevator: 0.43,
            cl_alpha_dot: 1.7,
            cl_q: 3.9,
            cd_min: 0.0223,
            k_induced: 0.0554,
            cl_at_cd_min: 0.0,
            cm0: 0.04,
            cm_alpha: -0.613,
            cm_elevator: -1.122,
            cm_alpha_dot: -7.27,
            cm_q: -12.4,
            prop_efficiency: 0.7,
            thrust_incidence: 0.0,
            min_airspeed: 1.0,
        }
    }
}

impl Default for AircraftParams {
    fn default() -> Self {
        Self::cessna_172()
    }
}
