//! Collision resolver and tick benchmarks.
//!
//! Run with: cargo bench --bench resolver_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spheresim::config::BruteForceConfig;
use spheresim::domains::collision::{Body, PairState};
use spheresim::engine::build_resolver;
use spheresim::prelude::*;

fn head_on_pair() -> PairState {
    PairState {
        a: Body {
            mass: 1.0,
            position: Vec3::new(-0.3, 0.0, 0.0),
            velocity: Vec3::new(-1.0, 0.0, 0.0),
        },
        b: Body {
            mass: 2.0,
            position: Vec3::new(0.3, 0.1, 0.0),
            velocity: Vec3::new(1.0, 0.0, 0.5),
        },
    }
}

/// Single pair resolution for every resolver kind.
fn bench_resolve_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_pair");
    let pair = head_on_pair();
    let brute = BruteForceConfig::default();

    for kind in ResolverKind::ALL {
        let resolver = build_resolver(kind, &brute);
        group.bench_with_input(BenchmarkId::from_parameter(resolver.name()), &pair, |b, pair| {
            b.iter(|| black_box(resolver.resolve(black_box(pair))));
        });
    }

    group.finish();
}

/// Full engine tick over a random cloud of sensors.
fn bench_engine_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_tick");
    group.sample_size(50);

    for n in [16_usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("sensors", n), &n, |b, &n| {
            let mut rng = SimRng::new(42);
            let cloud = SensorSphere::with_random_sensors("cloud", Vec3::zero(), 20.0, n, &mut rng);
            let Ok(cloud) = cloud else { return };
            let Ok(world) = SimState::from_parts(vec![], vec![cloud]) else { return };
            let config = SimConfig::builder().seed(42).delta_time(0.01).build();
            let Ok(mut engine) = SimEngine::new(config, world, Box::new(NoopSink)) else {
                return;
            };
            engine.randomize();
            engine.start();

            b.iter(|| black_box(engine.update()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve_pair, bench_engine_tick);
criterion_main!(benches);
