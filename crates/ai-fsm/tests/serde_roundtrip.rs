#![cfg(feature = "serde")]

use ai_core::{Action, ActionStatus, Blackboard, TickContext, WorldMut, WorldView};
use ai_fsm::{condition, FsmBuilder, FsmTraceLog, State, FSM_TRACE};

struct Flag(bool);

impl WorldView for Flag {
    type Agent = u32;
}

impl WorldMut for Flag {}

struct Hold;

impl Action<Flag> for Hold {
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: u32,
        _world: &mut Flag,
        _bb: &mut Blackboard,
    ) -> ActionStatus<Flag> {
        ActionStatus::next_tick()
    }
}

#[test]
fn trace_log_roundtrips_via_serde() {
    let mut b = FsmBuilder::<Flag>::new("serde");
    let a = b.add_state(State::new("A").on_execute(Hold));
    let c = b.add_state(State::new("C").on_execute(Hold));
    b.add_transition(a, c, condition(|w: &Flag, _| w.0))
        .expect("transition");
    let mut fsm = b.build(a).expect("fsm");

    let mut world = Flag(false);
    let mut bb = Blackboard::new();
    bb.set(FSM_TRACE, FsmTraceLog::default());
    let ctx = TickContext::new(0, 0.1, 3);
    fsm.start(&ctx, 9, &mut world, &mut bb);
    world.0 = true;
    fsm.tick(&ctx.next(), 9, &mut world, &mut bb);

    let log = bb.get(FSM_TRACE).expect("trace");
    assert!(log.events.len() >= 5);

    let json = serde_json::to_string(log).expect("serialize trace");
    let back: FsmTraceLog = serde_json::from_str(&json).expect("deserialize trace");
    assert_eq!(&back, log);
}
