use ai_core::CapabilityError;
use ai_fsm::FsmError;
use ai_nav::GridError;
use ai_steering::SteeringError;
use thiserror::Error;

use crate::objects::ZoneId;

/// Construction failures for town objects, characters, actions, conditions and machines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Fsm(#[from] FsmError),

    #[error(transparent)]
    Steering(#[from] SteeringError),

    #[error("zone {zone:?} has an invalid grid")]
    Grid {
        zone: String,
        #[source]
        source: GridError,
    },

    #[error("amount must be positive, got {0}")]
    InvalidAmount(u32),

    #[error("unknown agent {0}")]
    UnknownAgent(u64),

    #[error("agent {0} already exists")]
    DuplicateAgent(u64),

    #[error("unknown zone {0:?}")]
    UnknownZone(ZoneId),
}

pub type Result<T> = std::result::Result<T, BuildError>;
