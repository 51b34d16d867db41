#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use ai_core::{BbKey, Blackboard};

use crate::StateId;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FsmEventKind {
    Started { state: StateId },
    Transition { from: StateId, to: StateId, global: bool },
    /// Entry finished; the machine is no longer in transition.
    Entered { state: StateId },
    Executing { state: StateId },
    Cancelled { state: StateId, action: Cow<'static, str> },
    Stopped { state: StateId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FsmEvent {
    pub tick: u64,
    pub kind: FsmEventKind,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FsmTraceLog {
    pub events: Vec<FsmEvent>,
}

impl FsmTraceLog {
    pub fn push(&mut self, event: FsmEvent) {
        self.events.push(event);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &FsmEventKind> + '_ {
        self.events.iter().map(|e| &e.kind)
    }
}

/// Blackboard key for collecting machine events in memory. Nothing is recorded unless set.
pub const FSM_TRACE: BbKey<FsmTraceLog> = BbKey::new(0xF5A1_7ACE_0000_0001);

pub(crate) fn emit(blackboard: &mut Blackboard, tick: u64, kind: FsmEventKind) {
    if let Some(log) = blackboard.get_mut(FSM_TRACE) {
        log.push(FsmEvent { tick, kind });
    }
}
