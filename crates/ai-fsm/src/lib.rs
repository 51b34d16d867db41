//! Finite-state machine runtime built on `ai-core`.
//!
//! A [`StateMachine`] owns an arena of [`State`]s and [`Transition`]s. Each state may carry an
//! entry, execute and exit [`Action`](ai_core::Action); the machine runs them through an
//! [`ActionRuntime`](ai_core::ActionRuntime) so any of them can suspend across ticks.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod builder;
pub mod condition;
pub mod error;
pub mod machine;
pub mod state;
pub mod trace;

pub use agent::{tick_agents, Agent};
pub use builder::FsmBuilder;
pub use condition::{and, condition, not, or, And, Condition, ConditionRef, FnCondition, Not, Or};
pub use error::{FsmError, Result};
pub use machine::StateMachine;
pub use state::{State, StateId, Transition, TransitionId};
pub use trace::{FsmEvent, FsmEventKind, FsmTraceLog, FSM_TRACE};
