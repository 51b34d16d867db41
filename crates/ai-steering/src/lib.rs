//! Steering control laws and a blended movement controller.
//!
//! Control laws are plain functions over [`Kinematic`] snapshots. The [`MovementController`]
//! owns one character's kinematic state, evaluates its active behaviours against a
//! [`SpatialQuery`] of the previous tick's settled bodies, and integrates the blended result.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod controller;
pub mod data;
pub mod dynamic;
pub mod error;
pub mod kinematic;
pub mod path;
pub mod query;
pub mod vars;

pub use controller::{AvoidanceRay, MovementController, MovementMode};
pub use data::{BodyId, Kinematic, KinematicOutput, SteeringOutput, Target};
pub use dynamic::{DynamicBehaviour, Wander};
pub use error::{Result, SteeringError};
pub use kinematic::KinematicBehaviour;
pub use path::FollowPath;
pub use query::{BodySnapshot, SpatialQuery};
pub use vars::MovementVars;
