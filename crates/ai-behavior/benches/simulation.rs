use ai_behavior::{Archetype, Scenario, Simulation};
use ai_nav::Vec2;
use ai_steering::MovementVars;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// The sample town with `extra` more miners spread across the mine.
fn crowded(extra: u64) -> Simulation {
    let mut sim = Scenario::sample().build().expect("sample");
    for i in 0..extra {
        let position = Vec2::new(1.5 + (i % 8) as f32, 1.5 + (i / 8 % 8) as f32);
        sim.spawn(100 + i, Archetype::Miner, position, MovementVars::default())
            .expect("miner");
    }
    sim
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ai-behavior/step");

    for extra in [0u64, 64] {
        let mut sim = crowded(extra);
        group.bench_function(format!("agents_{}", extra + 3), |b| {
            b.iter(|| sim.step(black_box(0.05)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simulation);
criterion_main!(benches);
