use crate::link::{AircraftState, ControlCommand};

/// A control law: one fresh state in, one actuator command out.
///
/// [`super::Autopilot`] is the full mode-sequenced law; simpler laws can
/// implement this directly and drive any [`crate::link::Actuation`] sink.
pub trait Controller {
    /// Compute one cycle of actuator commands from a fresh state.
    fn control(&mut self, state: &AircraftState) -> ControlCommand;

    /// Reset controller internal state (e.g., PID integrators).
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
