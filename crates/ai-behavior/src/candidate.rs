//! The "walk to the nearest candidate, claim it or try the next one" loop shared by every
//! target-seeking action.

use std::collections::VecDeque;
use std::fmt::Debug;

use ai_core::{Action, ActionStatus, Blackboard, TickContext};
use ai_nav::Vec2;

use crate::Town;

/// Distance at which a walking character counts as having reached its candidate.
pub const ARRIVAL_TOLERANCE: f32 = 0.5;

/// What to do after arriving at a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// The action is done.
    Finish,
    /// Move on to the next-nearest candidate.
    Next,
}

/// How the candidate list is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sourcing {
    /// Re-query whenever the list runs out and wait until something is available.
    Persistent,
    /// Query once when the action starts and finish after a single pass.
    SinglePass,
}

/// Supplies and claims the targets of a [`NearestCandidate`] action.
pub trait CandidateSource: Clone + 'static {
    type Candidate: Copy + Eq + Debug + 'static;

    const SOURCING: Sourcing;

    fn name(&self) -> &'static str;

    /// Candidates near `agent` with their positions, in any order.
    fn candidates(&self, town: &Town, agent: u64, out: &mut Vec<(Self::Candidate, Vec2)>);

    /// Whether a candidate is still worth walking to.
    fn is_valid(&self, _town: &Town, _agent: u64, _candidate: Self::Candidate) -> bool {
        true
    }

    /// Called on arrival with a candidate that is still valid.
    fn visit(&mut self, town: &mut Town, agent: u64, candidate: Self::Candidate) -> Visit;

    /// Checked before every candidate; ends the action early when true.
    fn is_done(&self, _town: &Town, _agent: u64) -> bool {
        false
    }

    /// Reset per-run state when the action (re)starts.
    fn reset(&mut self) {}

    fn has_candidates(&self, town: &Town, agent: u64) -> bool {
        let mut out = Vec::new();
        self.candidates(town, agent, &mut out);
        !out.is_empty()
    }
}

/// Walks to the nearest candidate of a [`CandidateSource`], falling back to the next-nearest
/// when one is taken or unreachable.
pub struct NearestCandidate<S: CandidateSource> {
    source: S,
    queue: VecDeque<(S::Candidate, Vec2)>,
    walking: Option<(S::Candidate, Vec2)>,
}

impl<S: CandidateSource> NearestCandidate<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            queue: VecDeque::new(),
            walking: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn refill(&mut self, town: &Town, agent: u64) {
        let Some(origin) = town.position(agent) else {
            self.queue.clear();
            return;
        };
        let mut found = Vec::new();
        self.source.candidates(town, agent, &mut found);
        // Stable sort keeps the zone's listing order between equally distant candidates.
        found.sort_by(|a, b| {
            origin
                .distance_squared(a.1)
                .total_cmp(&origin.distance_squared(b.1))
        });
        self.queue = found.into();
    }

    fn stop_walking(&mut self, town: &mut Town, agent: u64) {
        self.walking = None;
        if let Some(mover) = town.mover_mut(agent) {
            if mover.is_following_path() {
                mover.stop_follow_path();
            }
        }
    }
}

impl<S: CandidateSource> Action<Town> for NearestCandidate<S> {
    fn start(&mut self, _ctx: &TickContext, agent: u64, town: &mut Town, _bb: &mut Blackboard) {
        self.source.reset();
        self.walking = None;
        self.queue.clear();
        if S::SOURCING == Sourcing::SinglePass {
            self.refill(town, agent);
        }
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        agent: u64,
        town: &mut Town,
        _bb: &mut Blackboard,
    ) -> ActionStatus<Town> {
        let mut refilled = false;
        loop {
            if self.source.is_done(town, agent) {
                self.stop_walking(town, agent);
                return ActionStatus::Success;
            }

            if let Some((candidate, _)) = self.walking.take() {
                if !self.source.is_valid(town, agent, candidate) {
                    tracing::debug!(
                        agent,
                        action = self.source.name(),
                        ?candidate,
                        "candidate taken before arrival"
                    );
                    continue;
                }
                match self.source.visit(town, agent, candidate) {
                    Visit::Finish => {
                        self.stop_walking(town, agent);
                        return ActionStatus::Success;
                    }
                    Visit::Next => continue,
                }
            }

            let Some((candidate, target)) = self.queue.pop_front() else {
                if S::SOURCING == Sourcing::SinglePass {
                    self.stop_walking(town, agent);
                    return ActionStatus::Success;
                }
                if !refilled {
                    refilled = true;
                    self.refill(town, agent);
                    if !self.queue.is_empty() {
                        continue;
                    }
                }
                self.stop_walking(town, agent);
                let source = self.source.clone();
                return ActionStatus::until(move |town: &Town, agent| {
                    source.has_candidates(town, agent)
                });
            };

            if !self.source.is_valid(town, agent, candidate) {
                continue;
            }
            let Some(path) = town.find_path(agent, target) else {
                tracing::debug!(
                    agent,
                    action = self.source.name(),
                    ?candidate,
                    "no path to candidate"
                );
                continue;
            };
            let started = town
                .mover_mut(agent)
                .map(|mover| mover.start_follow_path(path.points, false));
            match started {
                Some(Ok(())) => {}
                Some(Err(error)) => {
                    tracing::debug!(agent, %error, "could not follow path");
                    continue;
                }
                None => return ActionStatus::Failure,
            }

            self.walking = Some((candidate, target));
            let source = self.source.clone();
            return ActionStatus::until(move |town: &Town, agent| {
                !source.is_valid(town, agent, candidate)
                    || town
                        .position(agent)
                        .is_some_and(|p| p.distance(target) < ARRIVAL_TOLERANCE)
            });
        }
    }

    fn cancel(&mut self, _ctx: &TickContext, agent: u64, town: &mut Town, _bb: &mut Blackboard) {
        if self.walking.is_some() {
            self.stop_walking(town, agent);
        }
        self.queue.clear();
    }

    fn name(&self) -> &'static str {
        self.source.name()
    }
}
