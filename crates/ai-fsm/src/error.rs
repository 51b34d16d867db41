use thiserror::Error;

use crate::StateId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    #[error("unknown state {0:?}")]
    UnknownState(StateId),
}

pub type Result<T> = std::result::Result<T, FsmError>;
