use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SteeringError {
    #[error("trying to follow an empty path")]
    EmptyPath,

    #[error("trying to loop a single node path")]
    SingleWaypointLoop,

    #[error("minimum separation must be > 0 (got {0})")]
    NonPositiveSeparation(f32),

    #[error("{field} must be > 0 (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("query interval must be at least one tick")]
    InvalidThrottle,
}

pub type Result<T> = std::result::Result<T, SteeringError>;
