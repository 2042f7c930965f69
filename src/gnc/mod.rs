pub mod autopilot;
pub mod controller;
pub mod modes;
pub mod pid;
pub mod tecs;

pub use autopilot::{Autopilot, CycleReport};
pub use controller::Controller;
pub use modes::{FlightMode, GuidanceInputs, ModeSequencer, ModeTable, SetpointBundle};
pub use pid::{saturate, wrap_degrees, Pid, PidGains};
pub use tecs::{EnergyState, Tecs, TecsConfig, TecsOutput};
