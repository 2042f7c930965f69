pub mod config;
pub mod dynamics;
pub mod error;
pub mod gnc;
pub mod history;
pub mod io;
pub mod link;
pub mod runtime;
pub mod sim;

pub use config::AutopilotConfig;
pub use error::{ControlError, ControlResult, SingularInputError, TransportError};
pub use gnc::{Autopilot, FlightMode};
