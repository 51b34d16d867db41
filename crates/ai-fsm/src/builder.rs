use std::borrow::Cow;

use ai_core::WorldMut;

use crate::state::{State, StateId, Transition, TransitionId};
use crate::{ConditionRef, FsmError, Result, StateMachine};

/// Assembles the state and transition arenas of a [`StateMachine`].
pub struct FsmBuilder<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    states: Vec<State<W>>,
    transitions: Vec<Transition<W>>,
    globals: Vec<TransitionId>,
}

impl<W> FsmBuilder<W>
where
    W: WorldMut + 'static,
{
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            transitions: Vec::new(),
            globals: Vec::new(),
        }
    }

    pub fn add_state(&mut self, state: State<W>) -> StateId {
        if !state.has_actions() {
            tracing::warn!(fsm = %self.name, state = %state.name, "state has no actions");
        }
        let id = StateId(self.states.len());
        self.states.push(state);
        id
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Local transition checked while `from` is current, after every global transition.
    pub fn add_transition(
        &mut self,
        from: StateId,
        to: StateId,
        condition: ConditionRef<W>,
    ) -> Result<TransitionId> {
        self.check(from)?;
        self.check(to)?;
        let id = self.push(to, condition, false);
        self.states[from.0].transitions.push(id);
        Ok(id)
    }

    /// Transition checked every tick regardless of the current state.
    pub fn add_global_transition(
        &mut self,
        to: StateId,
        condition: ConditionRef<W>,
    ) -> Result<TransitionId> {
        self.check(to)?;
        let id = self.push(to, condition, true);
        self.globals.push(id);
        Ok(id)
    }

    pub fn build(self, initial: StateId) -> Result<StateMachine<W>> {
        self.check(initial)?;
        Ok(StateMachine::from_parts(
            self.name,
            self.states,
            self.transitions,
            self.globals,
            initial,
        ))
    }

    fn check(&self, id: StateId) -> Result<()> {
        if id.0 < self.states.len() {
            Ok(())
        } else {
            Err(FsmError::UnknownState(id))
        }
    }

    fn push(&mut self, target: StateId, condition: ConditionRef<W>, global: bool) -> TransitionId {
        let id = TransitionId(self.transitions.len());
        self.transitions.push(Transition {
            target,
            condition,
            global,
        });
        id
    }
}
