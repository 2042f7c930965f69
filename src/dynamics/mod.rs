pub mod longitudinal;
pub mod state;
pub mod trim;

pub use longitudinal::{derivatives, evaluate, outputs, AeroBreakdown};
pub use state::{long_controls, long_state, AircraftParams, LongControls, LongState};
pub use trim::{linearize, trim_level_flight, TrimPoint};
