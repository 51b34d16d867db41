use std::borrow::Cow;

use ai_core::{ActionRuntime, Blackboard, RuntimeStep, TickContext, WorldMut};

use crate::state::{Slot, State, StateId, Transition, TransitionId};
use crate::trace::{emit, FsmEventKind};

/// Which part of a state change the machine is working through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Execute finished (or the machine is stopped); only transitions can move it on.
    Idle,
    Exit(TransitionId),
    Entry,
    Execute,
}

/// A finite-state machine whose state actions are resumable.
///
/// The machine owns its states, so a state's action is moved into the [`ActionRuntime`] while
/// it runs and put back into its slot once it finishes or is cancelled. The exit, entry and
/// execute phases of a state change never interleave: each one is driven to completion (across
/// as many ticks as its waits need) before the next one starts.
pub struct StateMachine<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    states: Vec<State<W>>,
    transitions: Vec<Transition<W>>,
    globals: Vec<TransitionId>,
    initial: StateId,
    current: StateId,
    last_transition: Option<TransitionId>,
    in_transition: bool,
    started: bool,
    phase: Phase,
    runtime: ActionRuntime<W>,
    running: Option<(StateId, Slot)>,
}

impl<W> StateMachine<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn from_parts(
        name: Cow<'static, str>,
        states: Vec<State<W>>,
        transitions: Vec<Transition<W>>,
        globals: Vec<TransitionId>,
        initial: StateId,
    ) -> Self {
        Self {
            name,
            states,
            transitions,
            globals,
            initial,
            current: initial,
            last_transition: None,
            in_transition: false,
            started: false,
            phase: Phase::Idle,
            runtime: ActionRuntime::new(),
            running: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn current_state_name(&self) -> &str {
        self.state_name(self.current).unwrap_or_default()
    }

    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.states.get(id.0).map(State::name)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition<W>> {
        self.transitions.get(id.0)
    }

    pub fn in_transition(&self) -> bool {
        self.in_transition
    }

    pub fn last_transition(&self) -> Option<TransitionId> {
        self.last_transition
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Name of the action currently held by the runtime.
    pub fn running_action_name(&self) -> Option<&'static str> {
        self.runtime.current_name()
    }

    /// Run the initial state's entry and execute actions.
    pub fn start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.started {
            tracing::warn!(fsm = %self.name, agent = ?agent, "state machine already started");
            return;
        }
        self.started = true;
        self.current = self.initial;
        emit(
            blackboard,
            ctx.tick,
            FsmEventKind::Started {
                state: self.current,
            },
        );
        tracing::debug!(fsm = %self.name, agent = ?agent, state = %self.current_state_name(), "started");

        self.in_transition = true;
        self.phase = Phase::Entry;
        self.begin(Slot::Entry, ctx, agent, world, blackboard);
        self.drive(ctx, agent, world, blackboard);
    }

    /// Cancel whatever action is running. Transitions keep being evaluated on later ticks.
    pub fn stop(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if !self.cancel_running(ctx, agent, world, blackboard) {
            tracing::warn!(fsm = %self.name, agent = ?agent, "stop called with no running action");
        }
        self.phase = Phase::Idle;
        self.in_transition = false;
        emit(
            blackboard,
            ctx.tick,
            FsmEventKind::Stopped {
                state: self.current,
            },
        );
    }

    /// Take at most one transition, then advance whatever phase is in progress.
    ///
    /// Transitions are not evaluated while the machine is exiting or entering a state.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if !self.started {
            return;
        }

        if !self.in_transition {
            if let Some(id) = self.select(world, agent) {
                self.take(id, ctx, agent, world, blackboard);
            }
        }

        self.drive(ctx, agent, world, blackboard);
    }

    fn select(&self, world: &W, agent: W::Agent) -> Option<TransitionId> {
        let global = self
            .globals
            .iter()
            .copied()
            .find(|id| self.transitions[id.0].is_triggered(world, agent));
        // A global transition never fires twice in a row.
        if let Some(id) = global {
            if self.last_transition != Some(id) {
                return Some(id);
            }
        }

        self.states[self.current.0]
            .transitions
            .iter()
            .copied()
            .find(|id| self.transitions[id.0].is_triggered(world, agent))
    }

    fn take(
        &mut self,
        id: TransitionId,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(((state, _), action)) = self.running.zip(self.runtime.current_name()) {
            tracing::info!(
                fsm = %self.name,
                agent = ?agent,
                state = %self.states[state.0].name,
                action,
                "preempting running action"
            );
            emit(
                blackboard,
                ctx.tick,
                FsmEventKind::Cancelled {
                    state,
                    action: Cow::Borrowed(action),
                },
            );
            self.cancel_running(ctx, agent, world, blackboard);
        }

        self.in_transition = true;
        self.last_transition = Some(id);
        self.phase = Phase::Exit(id);
        self.begin(Slot::Exit, ctx, agent, world, blackboard);
    }

    /// Poll the runtime and move through finished phases until something suspends.
    fn drive(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        loop {
            match self.runtime.poll(ctx, agent, world, blackboard) {
                RuntimeStep::Pending => {
                    tracing::debug!(
                        fsm = %self.name,
                        agent = ?agent,
                        action = self.runtime.current_name().unwrap_or_default(),
                        "action suspended"
                    );
                    return;
                }
                RuntimeStep::Finished { action, outcome } => {
                    tracing::debug!(
                        fsm = %self.name,
                        agent = ?agent,
                        action = action.name(),
                        ?outcome,
                        "action finished"
                    );
                    self.restore(action);
                }
                RuntimeStep::Idle => {}
            }

            if !self.advance(ctx, agent, world, blackboard) {
                return;
            }
        }
    }

    /// Move to the phase after the current one. Returns `false` once there is nothing left to run.
    fn advance(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> bool {
        match self.phase {
            Phase::Idle => false,
            Phase::Exit(id) => {
                let transition = &self.transitions[id.0];
                let (from, to, global) = (self.current, transition.target, transition.global);
                self.current = to;
                tracing::info!(
                    fsm = %self.name,
                    agent = ?agent,
                    from = %self.states[from.0].name,
                    to = %self.states[to.0].name,
                    global,
                    "transition"
                );
                emit(
                    blackboard,
                    ctx.tick,
                    FsmEventKind::Transition { from, to, global },
                );
                self.phase = Phase::Entry;
                self.begin(Slot::Entry, ctx, agent, world, blackboard);
                true
            }
            Phase::Entry => {
                self.in_transition = false;
                emit(
                    blackboard,
                    ctx.tick,
                    FsmEventKind::Entered {
                        state: self.current,
                    },
                );
                self.phase = Phase::Execute;
                if self.begin(Slot::Execute, ctx, agent, world, blackboard) {
                    emit(
                        blackboard,
                        ctx.tick,
                        FsmEventKind::Executing {
                            state: self.current,
                        },
                    );
                }
                true
            }
            Phase::Execute => {
                self.phase = Phase::Idle;
                false
            }
        }
    }

    /// Move the current state's action for `slot` into the runtime, if the state has one.
    fn begin(
        &mut self,
        slot: Slot,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> bool {
        let state = self.current;
        let Some(action) = self.states[state.0].slot_mut(slot).take() else {
            return false;
        };
        tracing::debug!(
            fsm = %self.name,
            agent = ?agent,
            state = %self.states[state.0].name,
            ?slot,
            action = action.name(),
            "starting action"
        );
        // Nothing else can be running here: every phase change drains the runtime first.
        if let Some(previous) = self.runtime.start(action, ctx, agent, world, blackboard) {
            self.restore(previous);
        }
        self.running = Some((state, slot));
        true
    }

    fn cancel_running(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> bool {
        match self.runtime.cancel(ctx, agent, world, blackboard) {
            Some(action) => {
                self.restore(action);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, action: Box<dyn ai_core::Action<W>>) {
        if let Some((state, slot)) = self.running.take() {
            *self.states[state.0].slot_mut(slot) = Some(action);
        }
    }
}
