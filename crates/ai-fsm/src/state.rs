use std::borrow::Cow;

use ai_core::{Action, WorldMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ConditionRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransitionId(pub(crate) usize);

impl TransitionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The three action slots of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Entry,
    Execute,
    Exit,
}

pub struct State<W>
where
    W: WorldMut + 'static,
{
    pub(crate) name: Cow<'static, str>,
    pub(crate) entry: Option<Box<dyn Action<W>>>,
    pub(crate) execute: Option<Box<dyn Action<W>>>,
    pub(crate) exit: Option<Box<dyn Action<W>>>,
    pub(crate) transitions: Vec<TransitionId>,
}

impl<W> State<W>
where
    W: WorldMut + 'static,
{
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            entry: None,
            execute: None,
            exit: None,
            transitions: Vec::new(),
        }
    }

    pub fn on_entry(mut self, action: impl Action<W>) -> Self {
        self.entry = Some(Box::new(action));
        self
    }

    pub fn on_execute(mut self, action: impl Action<W>) -> Self {
        self.execute = Some(Box::new(action));
        self
    }

    pub fn on_exit(mut self, action: impl Action<W>) -> Self {
        self.exit = Some(Box::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outgoing local transitions in declaration order.
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub(crate) fn has_actions(&self) -> bool {
        self.entry.is_some() || self.execute.is_some() || self.exit.is_some()
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut Option<Box<dyn Action<W>>> {
        match slot {
            Slot::Entry => &mut self.entry,
            Slot::Execute => &mut self.execute,
            Slot::Exit => &mut self.exit,
        }
    }
}

/// A guarded edge to `target`. Stateless once built.
pub struct Transition<W>
where
    W: WorldMut + 'static,
{
    pub(crate) target: StateId,
    pub(crate) condition: ConditionRef<W>,
    pub(crate) global: bool,
}

impl<W> Transition<W>
where
    W: WorldMut + 'static,
{
    pub fn target(&self) -> StateId {
        self.target
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn is_triggered(&self, world: &W, agent: W::Agent) -> bool {
        self.condition.test(world, agent)
    }
}
