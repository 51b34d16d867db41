use core::fmt;

use crate::{Blackboard, TickContext, WorldMut, WorldView};

/// Tolerance when comparing accumulated tick time against a timed wait.
const WAIT_EPSILON: f32 = 1e-4;

pub type WaitPredicate<W> = Box<dyn Fn(&W, <W as WorldView>::Agent) -> bool>;

/// A typed suspension point.
///
/// An action that returns [`ActionStatus::Running`] is parked on one of these and resumed by
/// the [`ActionRuntime`] on a later tick. A wait is never satisfied on the tick that created it.
pub enum Wait<W: WorldView> {
    /// Resume on the next tick.
    NextTick,
    /// Resume once the accumulated tick time reaches the duration.
    Seconds(f32),
    /// Resume on the first tick where the predicate holds. Polled once per tick.
    Until(WaitPredicate<W>),
}

impl<W: WorldView> Wait<W> {
    pub fn until<F>(predicate: F) -> Self
    where
        F: Fn(&W, W::Agent) -> bool + 'static,
    {
        Wait::Until(Box::new(predicate))
    }
}

impl<W: WorldView> fmt::Debug for Wait<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wait::NextTick => f.write_str("NextTick"),
            Wait::Seconds(s) => f.debug_tuple("Seconds").field(s).finish(),
            Wait::Until(_) => f.write_str("Until(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failure,
}

pub enum ActionStatus<W: WorldView> {
    Running(Wait<W>),
    Success,
    Failure,
}

impl<W: WorldView> ActionStatus<W> {
    pub fn outcome(&self) -> Option<ActionOutcome> {
        match self {
            ActionStatus::Running(_) => None,
            ActionStatus::Success => Some(ActionOutcome::Success),
            ActionStatus::Failure => Some(ActionOutcome::Failure),
        }
    }

    pub fn next_tick() -> Self {
        ActionStatus::Running(Wait::NextTick)
    }

    pub fn seconds(seconds: f32) -> Self {
        ActionStatus::Running(Wait::Seconds(seconds))
    }

    pub fn until<F>(predicate: F) -> Self
    where
        F: Fn(&W, W::Agent) -> bool + 'static,
    {
        ActionStatus::Running(Wait::until(predicate))
    }
}

impl<W: WorldView> From<ActionOutcome> for ActionStatus<W> {
    fn from(value: ActionOutcome) -> Self {
        match value {
            ActionOutcome::Success => ActionStatus::Success,
            ActionOutcome::Failure => ActionStatus::Failure,
        }
    }
}

impl<W: WorldView> fmt::Debug for ActionStatus<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Running(wait) => f.debug_tuple("Running").field(wait).finish(),
            ActionStatus::Success => f.write_str("Success"),
            ActionStatus::Failure => f.write_str("Failure"),
        }
    }
}

/// A resumable unit of work.
///
/// `start` runs every time the action is (re)started, `tick` advances it to its next suspension
/// point, and `cancel` is the cleanup hook invoked when the action is preempted while running.
/// `cancel` may be called on an action that already cleaned up and must tolerate that.
pub trait Action<W>: 'static
where
    W: WorldMut + 'static,
{
    fn start(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) {
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> ActionStatus<W>;

    fn cancel(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) {
    }

    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

struct RunningAction<W>
where
    W: WorldMut + 'static,
{
    action: Box<dyn Action<W>>,
    wait: Option<Wait<W>>,
}

/// Result of polling an [`ActionRuntime`].
pub enum RuntimeStep<W>
where
    W: WorldMut + 'static,
{
    /// Nothing is running.
    Idle,
    /// The action is parked on a wait.
    Pending,
    /// The action completed; ownership goes back to the caller.
    Finished {
        action: Box<dyn Action<W>>,
        outcome: ActionOutcome,
    },
}

/// Drives at most one action through its suspension points.
pub struct ActionRuntime<W>
where
    W: WorldMut + 'static,
{
    current: Option<RunningAction<W>>,
}

impl<W> ActionRuntime<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the running action is parked on a wait (as opposed to not yet ticked).
    pub fn is_suspended(&self) -> bool {
        self.current.as_ref().is_some_and(|r| r.wait.is_some())
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|r| r.action.name())
    }

    /// Start `action`, cancelling and returning whatever was running before.
    ///
    /// The new action is not ticked here; the next [`poll`](Self::poll) runs it up to its first
    /// suspension point.
    pub fn start(
        &mut self,
        mut action: Box<dyn Action<W>>,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Option<Box<dyn Action<W>>> {
        let previous = self.cancel(ctx, agent, world, blackboard);
        action.start(ctx, agent, world, blackboard);
        self.current = Some(RunningAction { action, wait: None });
        previous
    }

    pub fn poll(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> RuntimeStep<W> {
        let Some(running) = self.current.as_mut() else {
            return RuntimeStep::Idle;
        };

        let ready = match running.wait.as_mut() {
            None | Some(Wait::NextTick) => true,
            Some(Wait::Seconds(remaining)) => {
                *remaining -= ctx.dt_seconds.max(0.0);
                *remaining <= WAIT_EPSILON
            }
            Some(Wait::Until(predicate)) => predicate(&*world, agent),
        };
        if !ready {
            return RuntimeStep::Pending;
        }

        running.wait = None;
        let outcome = match running.action.tick(ctx, agent, world, blackboard) {
            ActionStatus::Running(wait) => {
                running.wait = Some(wait);
                return RuntimeStep::Pending;
            }
            ActionStatus::Success => ActionOutcome::Success,
            ActionStatus::Failure => ActionOutcome::Failure,
        };

        match self.current.take() {
            Some(finished) => RuntimeStep::Finished {
                action: finished.action,
                outcome,
            },
            None => RuntimeStep::Idle,
        }
    }

    /// Cancel the running action (if any) and hand it back.
    pub fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Option<Box<dyn Action<W>>> {
        let mut running = self.current.take()?;
        running.action.cancel(ctx, agent, world, blackboard);
        Some(running.action)
    }
}

impl<W> Default for ActionRuntime<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self { current: None }
    }
}
