use thiserror::Error;

/// Airspeed at or below the configured floor where the model divides by V.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("{quantity} = {value:.3} is at or below the singularity floor {floor:.3}")]
pub struct SingularInputError {
    pub quantity: &'static str,
    pub value: f64,
    pub floor: f64,
}

/// Failures of the telemetry/actuation collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("simulator link disconnected")]
    Disconnected,

    #[error("simulator did not answer within the tick budget")]
    Timeout,

    #[error("simulator rejected request: {0}")]
    Rejected(String),

    #[error("transport I/O failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A console line that is neither a mode number nor `exit`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverrideParseError {
    #[error("not a mode number: {0:?}")]
    NotNumeric(String),

    #[error("mode {0} is outside 1..=8")]
    OutOfRange(f64),
}

/// Trim solver failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrimError {
    #[error("trim did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("trim Jacobian is singular")]
    SingularJacobian,

    #[error(transparent)]
    Singular(#[from] SingularInputError),
}

/// Open-loop simulation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid simulation timing: {0}")]
    InvalidTiming(String),

    #[error(transparent)]
    Singular(#[from] SingularInputError),
}

/// Control-loop level errors. Anything here stops the loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error("{failures} consecutive transport failures, last: {last}")]
    TransportFatal { failures: u32, last: TransportError },
}

pub type ControlResult<T> = Result<T, ControlError>;
