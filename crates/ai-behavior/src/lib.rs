//! Town simulation on top of the agent kernel: the shared [`Town`] world, character
//! components, the target-seeking actions and conditions built from them, archetype state
//! machines, and the [`Simulation`] host loop that steps it all.
//!
//! ```
//! use ai_behavior::Scenario;
//!
//! let mut sim = Scenario::sample().build().expect("sample scenario");
//! sim.run(20, 0.1);
//! assert_eq!(sim.steps(), 20);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod actions;
pub mod archetype;
pub mod candidate;
pub mod components;
pub mod conditions;
pub mod error;
pub mod objects;
pub mod scenario;
pub mod sim;
pub mod town;

pub use archetype::Archetype;
pub use candidate::{CandidateSource, NearestCandidate, Sourcing, Visit, ARRIVAL_TOLERANCE};
pub use components::{Drunkenness, Energy, Inventory, Mining};
pub use error::{BuildError, Result};
pub use objects::{Bed, BedId, Deposit, DepositId, Interval, ResourceKind, Vein, VeinId, ZoneId};
pub use scenario::{AgentSpec, BeerTableSpec, DepositSpec, Scenario, VeinSpec, ZoneSpec};
pub use sim::{AgentSummary, Simulation, Summary};
pub use town::{Character, Town, Zone};
