//! Fixed-rate loop around the autopilot, plus operator overrides.

pub mod console;
pub mod control_loop;

pub use console::{forward_overrides, parse_override, spawn_console_input, ModeOverride};
pub use control_loop::{ControlLoop, RunSummary, TickOutcome};
