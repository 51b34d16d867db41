use ai_nav::Vec2;
use ai_steering::{BodyId, BodySnapshot, DynamicBehaviour, Kinematic, MovementController, MovementVars, Target};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn crowd(n: usize) -> Vec<MovementController> {
    let side = (n as f32).sqrt().ceil() as usize;
    (0..n)
        .map(|i| {
            let position = Vec2::new((i % side) as f32 * 0.8, (i / side) as f32 * 0.8);
            let mut c = MovementController::new(
                BodyId(i as u64),
                Kinematic::at(position),
                MovementVars::default(),
            )
            .expect("controller");
            c.enable_dynamic(DynamicBehaviour::Arrive(Target::Point(Vec2::new(50.0, 50.0))));
            c.toggle_separation();
            c.toggle_agent_avoidance();
            c.toggle_look_velocity();
            c
        })
        .collect()
}

fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("ai-steering/controller");

    for n in [64usize, 512] {
        let mut controllers = crowd(n);
        let mut snapshot = BodySnapshot::new(2.0);
        group.bench_function(format!("blend_{n}"), |b| {
            b.iter(|| {
                snapshot.rebuild(controllers.iter().map(|c| (c.id(), *c.kinematic())));
                for controller in controllers.iter_mut() {
                    controller.update(1.0 / 60.0, &snapshot);
                }
                black_box(controllers[0].position());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_controller);
criterion_main!(benches);
