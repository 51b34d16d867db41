//! Umbrella crate that re-exports the `ai-*` building blocks.
//!
//! Crates layer leaf-first: [`nav`] (tile graphs and A*), [`steering`] (control laws and the
//! movement controller), [`fsm`] (state machines over resumable actions) and [`behavior`] (the
//! town world, its characters and their archetype machines), all on top of [`core`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use ai_core as core;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use ai_nav as nav;

#[cfg(feature = "steering")]
#[cfg_attr(docsrs, doc(cfg(feature = "steering")))]
pub use ai_steering as steering;

#[cfg(feature = "fsm")]
#[cfg_attr(docsrs, doc(cfg(feature = "fsm")))]
pub use ai_fsm as fsm;

#[cfg(feature = "behavior")]
#[cfg_attr(docsrs, doc(cfg(feature = "behavior")))]
pub use ai_behavior as behavior;
