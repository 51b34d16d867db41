//! Deterministic, engine-agnostic agent kernel primitives.
//!
//! Everything here is driven by an explicit [`TickContext`]: actions suspend on typed
//! [`Wait`] points and are resumed by an [`ActionRuntime`] once per tick, and agents expose
//! their sensors and actuators through a typed [`Capabilities`] registry.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod blackboard;
pub mod capability;
pub mod rng;
pub mod tick;
pub mod world;

pub use action::{Action, ActionOutcome, ActionRuntime, ActionStatus, RuntimeStep, Wait};
pub use blackboard::{BbKey, Blackboard};
pub use capability::{Capabilities, CapabilityError};
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::TickContext;
pub use world::{AgentId, WorldMut, WorldView};
