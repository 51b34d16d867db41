use ai_core::{Blackboard, TickContext, WorldMut};

use crate::StateMachine;

/// One simulated character's decision state: its id, blackboard and machine.
pub struct Agent<W>
where
    W: WorldMut + 'static,
{
    pub id: W::Agent,
    pub blackboard: Blackboard,
    pub fsm: StateMachine<W>,
}

impl<W> Agent<W>
where
    W: WorldMut + 'static,
{
    pub fn new(id: W::Agent, fsm: StateMachine<W>) -> Self {
        Self {
            id,
            blackboard: Blackboard::new(),
            fsm,
        }
    }

    /// Start the machine on the first call, tick it on every later one.
    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        if self.fsm.is_started() {
            self.fsm.tick(ctx, self.id, world, &mut self.blackboard);
        } else {
            self.fsm.start(ctx, self.id, world, &mut self.blackboard);
        }
    }
}

/// Tick every agent in ascending id order, whatever order the slice is in.
pub fn tick_agents<W>(agents: &mut [Agent<W>], ctx: &TickContext, world: &mut W)
where
    W: WorldMut + 'static,
{
    let mut order: Vec<usize> = (0..agents.len()).collect();
    order.sort_by_key(|&idx| agents[idx].id);
    for idx in order {
        agents[idx].tick(ctx, world);
    }
}
