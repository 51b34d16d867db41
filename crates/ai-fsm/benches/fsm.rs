use ai_core::{Action, ActionStatus, Blackboard, TickContext, WorldMut, WorldView};
use ai_fsm::{condition, not, tick_agents, Agent, FsmBuilder, State};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

struct Clock {
    tick: u64,
}

impl WorldView for Clock {
    type Agent = u64;
}

impl WorldMut for Clock {}

struct Busy;

impl Action<Clock> for Busy {
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        _world: &mut Clock,
        _bb: &mut Blackboard,
    ) -> ActionStatus<Clock> {
        ActionStatus::seconds(0.3)
    }
}

fn agents(n: u64) -> Vec<Agent<Clock>> {
    (0..n)
        .map(|id| {
            let mut b = FsmBuilder::<Clock>::new("bench");
            let work = b.add_state(State::new("Work").on_execute(Busy));
            let rest = b.add_state(State::new("Rest").on_entry(Busy).on_execute(Busy));
            let flip = condition(move |w: &Clock, agent: u64| (w.tick + agent) % 8 < 4);
            let _ = b.add_transition(work, rest, flip.clone());
            let _ = b.add_transition(rest, work, not(flip));
            let fsm = b.build(work).expect("fsm");
            Agent::new(id, fsm)
        })
        .collect()
}

fn bench_fsm(c: &mut Criterion) {
    let mut group = c.benchmark_group("ai-fsm/tick");

    for n in [256u64, 4096] {
        let mut population = agents(n);
        let mut world = Clock { tick: 0 };
        let mut ctx = TickContext::new(0, 0.1, 1);
        group.bench_function(format!("agents_{n}"), |b| {
            b.iter(|| {
                ctx = ctx.next();
                world.tick = ctx.tick;
                tick_agents(black_box(&mut population), &ctx, &mut world);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fsm);
criterion_main!(benches);
