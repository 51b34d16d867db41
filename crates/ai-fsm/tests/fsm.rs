use ai_core::{Action, ActionStatus, Blackboard, TickContext, WorldMut, WorldView};
use ai_fsm::{
    and, condition, not, tick_agents, Agent, FsmBuilder, FsmError, FsmEventKind, FsmTraceLog,
    State, StateMachine, FSM_TRACE,
};

#[derive(Default)]
struct Log {
    lines: Vec<String>,
    go: bool,
    tired: bool,
    rested: bool,
}

impl WorldView for Log {
    type Agent = u64;
}

impl WorldMut for Log {}

/// Logs its label on every tick. Finishes after `ticks` ticks, or never when `ticks` is zero.
struct Script {
    label: &'static str,
    ticks: u32,
    done: u32,
}

fn script(label: &'static str, ticks: u32) -> Script {
    Script {
        label,
        ticks,
        done: 0,
    }
}

impl Action<Log> for Script {
    fn start(&mut self, _ctx: &TickContext, _agent: u64, _world: &mut Log, _bb: &mut Blackboard) {
        self.done = 0;
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        agent: u64,
        world: &mut Log,
        _bb: &mut Blackboard,
    ) -> ActionStatus<Log> {
        world.lines.push(format!("{}#{agent}", self.label));
        self.done += 1;
        if self.ticks == 0 {
            ActionStatus::until(|_: &Log, _| false)
        } else if self.done < self.ticks {
            ActionStatus::next_tick()
        } else {
            ActionStatus::Success
        }
    }

    fn cancel(&mut self, _ctx: &TickContext, agent: u64, world: &mut Log, _bb: &mut Blackboard) {
        world.lines.push(format!("{}#{agent}!cancel", self.label));
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.1, 7)
}

struct Harness {
    fsm: StateMachine<Log>,
    world: Log,
    bb: Blackboard,
    tick: u64,
}

impl Harness {
    fn started(fsm: StateMachine<Log>) -> Self {
        let mut harness = Self {
            fsm,
            world: Log::default(),
            bb: Blackboard::new(),
            tick: 0,
        };
        harness.bb.set(FSM_TRACE, FsmTraceLog::default());
        harness
            .fsm
            .start(&ctx(0), 1, &mut harness.world, &mut harness.bb);
        harness
    }

    fn tick(&mut self) {
        self.tick += 1;
        self.fsm
            .tick(&ctx(self.tick), 1, &mut self.world, &mut self.bb);
    }

    fn lines(&self) -> Vec<&str> {
        self.world.lines.iter().map(String::as_str).collect()
    }

    fn trace(&self) -> Vec<FsmEventKind> {
        self.bb
            .get(FSM_TRACE)
            .map(|log| log.kinds().cloned().collect())
            .unwrap_or_default()
    }
}

#[test]
fn exit_completes_before_entry_and_entry_before_execute() {
    let mut b = FsmBuilder::<Log>::new("ordering");
    let a = b.add_state(
        State::new("A")
            .on_execute(script("a.exec", 0))
            .on_exit(script("a.exit", 2)),
    );
    let bb = b.add_state(
        State::new("B")
            .on_entry(script("b.entry", 1))
            .on_execute(script("b.exec", 0)),
    );
    b.add_transition(a, bb, condition(|w: &Log, _| w.go))
        .expect("transition");
    let mut h = Harness::started(b.build(a).expect("fsm"));

    assert_eq!(h.lines(), vec!["a.exec#1"]);
    assert!(!h.fsm.in_transition());

    h.world.go = true;
    h.tick();
    assert_eq!(h.fsm.current_state(), a);
    assert!(h.fsm.in_transition());

    h.tick();
    assert_eq!(h.fsm.current_state(), bb);
    assert!(!h.fsm.in_transition());
    assert_eq!(
        h.lines(),
        vec![
            "a.exec#1",
            "a.exec#1!cancel",
            "a.exit#1",
            "a.exit#1",
            "b.entry#1",
            "b.exec#1"
        ]
    );
    assert_eq!(h.fsm.running_action_name(), Some("b.exec"));
}

#[test]
fn preempted_execute_is_cancelled_exactly_once() {
    let mut b = FsmBuilder::<Log>::new("preempt");
    let a = b.add_state(State::new("A").on_execute(script("a.exec", 0)));
    let c = b.add_state(State::new("C").on_execute(script("c.exec", 0)));
    b.add_transition(a, c, condition(|w: &Log, _| w.go))
        .expect("a->c");
    b.add_transition(c, a, condition(|w: &Log, _| !w.go))
        .expect("c->a");
    let mut h = Harness::started(b.build(a).expect("fsm"));

    h.world.go = true;
    h.tick();
    h.tick();
    h.tick();

    let cancels = h
        .lines()
        .iter()
        .filter(|l| l.ends_with("!cancel"))
        .count();
    assert_eq!(cancels, 1);
    assert_eq!(h.fsm.current_state_name(), "C");

    // A finished execute has nothing to cancel.
    let mut b = FsmBuilder::<Log>::new("finished");
    let a = b.add_state(State::new("A").on_execute(script("a.exec", 1)));
    let c = b.add_state(State::new("C").on_entry(script("c.entry", 1)));
    b.add_transition(a, c, condition(|w: &Log, _| w.go))
        .expect("a->c");
    let mut h = Harness::started(b.build(a).expect("fsm"));
    h.world.go = true;
    h.tick();
    assert_eq!(h.lines(), vec!["a.exec#1", "c.entry#1"]);
}

#[test]
fn global_transition_does_not_fire_twice_in_a_row() {
    let mut b = FsmBuilder::<Log>::new("globals");
    let idle = b.add_state(State::new("Idle").on_execute(script("idle", 0)));
    let sleep = b.add_state(State::new("Sleep").on_execute(script("sleep", 0)));
    let tired = b
        .add_global_transition(sleep, condition(|w: &Log, _| w.tired))
        .expect("global");
    let wake = b
        .add_transition(sleep, idle, condition(|w: &Log, _| w.rested))
        .expect("local");
    let mut h = Harness::started(b.build(idle).expect("fsm"));

    h.world.tired = true;
    h.tick();
    assert_eq!(h.fsm.current_state(), sleep);
    assert_eq!(h.fsm.last_transition(), Some(tired));

    h.tick();
    h.tick();
    assert_eq!(h.fsm.current_state(), sleep);
    assert_eq!(h.lines().iter().filter(|l| **l == "sleep#1").count(), 1);

    // The global is skipped, so the local transition gets its turn.
    h.world.rested = true;
    h.tick();
    assert_eq!(h.fsm.current_state(), idle);
    assert_eq!(h.fsm.last_transition(), Some(wake));

    h.world.rested = false;
    h.tick();
    assert_eq!(h.fsm.current_state(), sleep);
    assert!(h.trace().contains(&FsmEventKind::Transition {
        from: idle,
        to: sleep,
        global: true
    }));
}

#[test]
fn first_matching_local_transition_wins() {
    let mut b = FsmBuilder::<Log>::new("locals");
    let a = b.add_state(State::new("A").on_execute(script("a", 0)));
    let first = b.add_state(State::new("First").on_execute(script("first", 0)));
    let second = b.add_state(State::new("Second").on_execute(script("second", 0)));
    b.add_transition(a, first, condition(|w: &Log, _| w.go))
        .expect("first");
    b.add_transition(a, second, and(condition(|w: &Log, _| w.go), not(condition(|w: &Log, _| w.tired))))
        .expect("second");
    let mut h = Harness::started(b.build(a).expect("fsm"));

    h.world.go = true;
    h.tick();
    assert_eq!(h.fsm.current_state(), first);
    assert_eq!(h.fsm.current_state_name(), "First");
}

#[test]
fn transitions_wait_for_a_suspended_entry() {
    let mut b = FsmBuilder::<Log>::new("entry");
    let a = b.add_state(State::new("A").on_execute(script("a", 0)));
    let slow = b.add_state(State::new("Slow").on_entry(script("slow.entry", 3)));
    let c = b.add_state(State::new("C").on_execute(script("c", 0)));
    b.add_transition(a, slow, condition(|w: &Log, _| w.go))
        .expect("a->slow");
    b.add_transition(slow, c, condition(|w: &Log, _| w.go))
        .expect("slow->c");
    let mut h = Harness::started(b.build(a).expect("fsm"));

    h.world.go = true;
    h.tick();
    assert_eq!(h.fsm.current_state(), slow);
    assert!(h.fsm.in_transition());

    h.tick();
    h.tick();
    assert_eq!(h.fsm.current_state(), slow);
    assert!(!h.fsm.in_transition());

    h.tick();
    assert_eq!(h.fsm.current_state(), c);
}

#[test]
fn exactly_one_state_is_current_at_every_tick() {
    let mut b = FsmBuilder::<Log>::new("flip");
    let a = b.add_state(State::new("A").on_exit(script("a.exit", 2)));
    let c = b.add_state(State::new("C").on_entry(script("c.entry", 2)));
    b.add_transition(a, c, condition(|w: &Log, _| w.go))
        .expect("a->c");
    b.add_transition(c, a, condition(|w: &Log, _| !w.go))
        .expect("c->a");
    let mut h = Harness::started(b.build(a).expect("fsm"));

    for step in 0..40u64 {
        h.world.go = step % 3 != 0;
        h.tick();
        let current = h.fsm.current_state();
        assert!(current == a || current == c);
        assert!(h.fsm.state_name(current).is_some());
    }
}

#[test]
fn unknown_states_are_rejected() {
    let mut other = FsmBuilder::<Log>::new("other");
    other.add_state(State::new("X").on_execute(script("x", 0)));
    let foreign = other.add_state(State::new("Y").on_execute(script("y", 0)));

    let mut b = FsmBuilder::<Log>::new("small");
    let a = b.add_state(State::new("A").on_execute(script("a", 0)));
    assert_eq!(
        b.add_transition(a, foreign, condition(|_: &Log, _| true)).err(),
        Some(FsmError::UnknownState(foreign))
    );
    assert_eq!(
        b.add_global_transition(foreign, condition(|_: &Log, _| true)).err(),
        Some(FsmError::UnknownState(foreign))
    );
    assert_eq!(b.build(foreign).err(), Some(FsmError::UnknownState(foreign)));
}

#[test]
fn trace_records_the_state_change_sequence() {
    let mut b = FsmBuilder::<Log>::new("trace");
    let a = b.add_state(State::new("A").on_execute(script("a", 0)));
    let c = b.add_state(
        State::new("C")
            .on_entry(script("c.entry", 1))
            .on_execute(script("c", 0)),
    );
    b.add_transition(a, c, condition(|w: &Log, _| w.go))
        .expect("a->c");
    let mut h = Harness::started(b.build(a).expect("fsm"));

    h.world.go = true;
    h.tick();
    h.fsm.stop(&ctx(2), 1, &mut h.world, &mut h.bb);

    assert_eq!(
        h.trace(),
        vec![
            FsmEventKind::Started { state: a },
            FsmEventKind::Entered { state: a },
            FsmEventKind::Executing { state: a },
            FsmEventKind::Cancelled {
                state: a,
                action: "a".into()
            },
            FsmEventKind::Transition {
                from: a,
                to: c,
                global: false
            },
            FsmEventKind::Entered { state: c },
            FsmEventKind::Executing { state: c },
            FsmEventKind::Stopped { state: c },
        ]
    );
    assert_eq!(h.lines().last().copied(), Some("c#1!cancel"));
    assert_eq!(h.fsm.running_action_name(), None);
}

#[test]
fn stop_is_a_no_op_when_nothing_runs() {
    let mut b = FsmBuilder::<Log>::new("stop");
    let a = b.add_state(State::new("A").on_execute(script("a", 0)));
    let mut h = Harness::started(b.build(a).expect("fsm"));

    h.fsm.stop(&ctx(1), 1, &mut h.world, &mut h.bb);
    h.fsm.stop(&ctx(2), 1, &mut h.world, &mut h.bb);
    let cancels = h.lines().iter().filter(|l| l.ends_with("!cancel")).count();
    assert_eq!(cancels, 1);
    assert!(h.fsm.is_started());
}

#[test]
fn agents_start_lazily_and_tick_in_id_order() {
    let build = || {
        let mut b = FsmBuilder::<Log>::new("agent");
        let a = b.add_state(State::new("A").on_execute(script("run", 0)));
        b.build(a).expect("fsm")
    };
    let mut agents: Vec<Agent<Log>> = [3u64, 1, 2]
        .into_iter()
        .map(|id| Agent::new(id, build()))
        .collect();
    let mut world = Log::default();

    tick_agents(&mut agents, &ctx(0), &mut world);
    assert_eq!(world.lines, vec!["run#1", "run#2", "run#3"]);
    assert!(agents.iter().all(|agent| agent.fsm.is_started()));

    tick_agents(&mut agents, &ctx(1), &mut world);
    assert_eq!(world.lines.len(), 3);
}

#[test]
fn global_transition_preempts_a_suspended_execute() {
    let mut b = FsmBuilder::<Log>::new("global-preempt");
    let idle = b.add_state(State::new("Idle").on_execute(script("idle", 0)));
    let sleep = b.add_state(State::new("Sleep").on_execute(script("sleep", 0)));
    b.add_global_transition(sleep, condition(|w: &Log, _| w.tired))
        .expect("global");
    let mut h = Harness::started(b.build(idle).expect("fsm"));
    assert_eq!(h.fsm.running_action_name(), Some("idle"));

    h.world.tired = true;
    h.tick();

    assert_eq!(h.fsm.current_state(), sleep);
    assert_eq!(h.lines(), vec!["idle#1", "idle#1!cancel", "sleep#1"]);
    let trace = h.trace();
    let cancelled = trace
        .iter()
        .position(|k| {
            *k == FsmEventKind::Cancelled {
                state: idle,
                action: "idle".into(),
            }
        })
        .expect("cancel recorded");
    let moved = trace
        .iter()
        .position(|k| {
            *k == FsmEventKind::Transition {
                from: idle,
                to: sleep,
                global: true,
            }
        })
        .expect("transition recorded");
    assert!(cancelled < moved);
    assert_eq!(h.fsm.running_action_name(), Some("sleep"));
}
