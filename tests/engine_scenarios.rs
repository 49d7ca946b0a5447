//! End-to-end engine scenarios.
//!
//! Each test drives a `SimEngine` through its public API only.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use spheresim::constants::GRAVITATIONAL_CONSTANT;
use spheresim::prelude::*;

fn unit_sensor(id: &str, x: f64, vx: f64) -> Sensor {
    Sensor::new(id, Vec3::new(x, 0.0, 0.0), Vec3::new(vx, 0.0, 0.0), 1.0, 0.0).unwrap()
}

fn engine(world: SimState, resolver: ResolverKind) -> SimEngine {
    let config = SimConfig::builder()
        .seed(42)
        .delta_time(0.1)
        .resolver(resolver)
        .build();
    SimEngine::new(config, world, Box::new(NoopSink)).unwrap()
}

// Head-on equal-mass pair swaps velocities under every closed-form resolver
#[test]
fn head_on_pair_swaps_velocities() {
    for kind in [
        ResolverKind::Impulse,
        ResolverKind::CenterOfMass,
        ResolverKind::PenaltyForce,
    ] {
        let world = SimState::from_parts(
            vec![unit_sensor("a", -0.3, -1.0), unit_sensor("b", 0.3, 1.0)],
            vec![],
        )
        .unwrap();
        let mut engine = engine(world, kind);

        engine.start();
        engine.update().unwrap();

        let sensors = engine.sensors();
        assert!((sensors[0].velocity().x - 1.0).abs() < 1e-5, "{kind:?}");
        assert!((sensors[1].velocity().x - (-1.0)).abs() < 1e-5, "{kind:?}");
    }
}

// Brute-force relaxation approaches the same swap
#[test]
fn brute_force_pair_conserves_momentum() {
    let world = SimState::from_parts(
        vec![unit_sensor("a", -0.3, -1.0), unit_sensor("b", 0.3, 1.0)],
        vec![],
    )
    .unwrap();
    let mut engine = engine(world, ResolverKind::BruteForce);
    let before = engine.total_momentum();

    engine.start();
    engine.update().unwrap();

    let after = engine.total_momentum();
    assert!((after - before).magnitude() < 1e-6);
    assert!(engine.sensors()[0].velocity().x > 0.0);
}

#[test]
fn gravity_between_two_sensors() {
    let a = Sensor::new("a", Vec3::zero(), Vec3::zero(), 5.0, 0.0).unwrap();
    let b = Sensor::new("b", Vec3::new(0.0, 10.0, 0.0), Vec3::zero(), 10.0, 0.0).unwrap();

    let force = GravityField::default().force(&a, &b).unwrap();
    let expected = GRAVITATIONAL_CONSTANT * 5.0 * 10.0 / 100.0;

    assert!((force.y - expected).abs() < expected * 1e-9);
    assert!(force.x.abs() < f64::EPSILON);
    assert!(force.z.abs() < f64::EPSILON);
}

#[test]
fn container_reflects_escaped_sensor() {
    let container = SensorSphere::new("box", Vec3::zero(), 5.0).unwrap();
    let world = SimState::from_parts(vec![unit_sensor("out", 6.0, 1.0)], vec![container]).unwrap();
    let mut engine = engine(world, ResolverKind::Impulse);

    engine.start();
    engine.update().unwrap();

    let s = &engine.sensors()[0];
    assert!(s.position().magnitude() <= 5.0 + 1e-9);
    assert!(s.velocity().x < 0.0);
}

#[test]
fn stopped_engine_does_not_move() {
    let world = SimState::from_parts(vec![unit_sensor("a", 0.0, 1.0)], vec![]).unwrap();
    let mut engine = engine(world, ResolverKind::Impulse);

    engine.run_for(10).unwrap();

    assert_eq!(engine.step_count(), 0);
    assert!(engine.sensors()[0].position().x.abs() < f64::EPSILON);
}

#[test]
fn reset_restores_world_and_time() {
    let sphere = SensorSphere::new("box", Vec3::zero(), 20.0)
        .unwrap()
        .with_sensors([unit_sensor("m", 1.0, 0.5)])
        .unwrap();
    let world = SimState::from_parts(vec![unit_sensor("a", 0.0, 1.0)], vec![sphere]).unwrap();
    let mut engine = engine(world, ResolverKind::Impulse);
    let initial = serde_json::to_string(engine.state()).unwrap();

    engine.start();
    engine.run_for(25).unwrap();
    engine.randomize();
    engine.reset(false);

    assert!(!engine.is_running());
    assert!(engine.global_time().abs() < f64::EPSILON);
    assert_eq!(serde_json::to_string(engine.state()).unwrap(), initial);
}

#[test]
fn time_reversal_retraces_free_flight() {
    let world = SimState::from_parts(vec![unit_sensor("a", 0.0, 1.0)], vec![]).unwrap();
    let mut engine = engine(world, ResolverKind::Impulse);

    engine.start();
    engine.run_for(10).unwrap();
    engine.toggle_time_reversal();
    engine.run_for(10).unwrap();

    // Velocity negated and time running backward both undo the flight
    assert!(engine.global_time().abs() < 1e-9);
    assert!(engine.is_time_reversed());
    assert!(engine.sensors()[0].position().x.abs() < 1e-9);
    assert!((engine.sensors()[0].velocity().x - (-1.0)).abs() < f64::EPSILON);
}

// Same seed, same world: bitwise-identical trajectories
#[test]
fn same_seed_is_deterministic() {
    let run = |seed: u64| {
        let config = SimConfig::builder().seed(seed).delta_time(0.05).build();
        let sphere = SensorSphere::with_random_sensors(
            "cloud",
            Vec3::zero(),
            10.0,
            12,
            &mut SimRng::new(seed),
        )
        .unwrap();
        let world = SimState::from_parts(vec![], vec![sphere]).unwrap();
        let mut engine = SimEngine::new(config, world, Box::new(NoopSink)).unwrap();
        engine.randomize();
        engine.start();
        engine.run_for(50).unwrap();
        serde_json::to_string(engine.state()).unwrap()
    };

    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
}

#[test]
fn state_survives_json_round_trip() {
    let sphere = SensorSphere::new("box", Vec3::new(1.0, 2.0, 3.0), 4.0)
        .unwrap()
        .with_sensors([unit_sensor("m", 1.5, 0.0)])
        .unwrap();
    let state = SimState::from_parts(vec![unit_sensor("a", 0.0, 1.0)], vec![sphere]).unwrap();

    let json = serde_json::to_string(&state).unwrap();
    let back: SimState = serde_json::from_str(&json).unwrap();

    assert_eq!(back.sensors(), state.sensors());
    assert_eq!(back.spheres(), state.spheres());
}

#[test]
fn invalid_delta_time_reports_and_keeps_running() {
    let world = SimState::from_parts(vec![unit_sensor("a", 0.0, 1.0)], vec![]).unwrap();
    let mut engine = engine(world, ResolverKind::Impulse);
    engine.start();

    engine.set_delta_time(-0.5);
    assert!(engine.update().unwrap_err().is_validation());
    assert!(engine.is_running());

    engine.set_delta_time(0.1);
    engine.update().unwrap();
    assert_eq!(engine.step_count(), 1);
}

#[test]
fn collision_events_reach_the_sink() {
    let sink = RecordingSink::new();
    let world = SimState::from_parts(
        vec![unit_sensor("a", -0.3, -1.0), unit_sensor("b", 0.3, 1.0)],
        vec![],
    )
    .unwrap();
    let config = SimConfig::builder().delta_time(0.1).build();
    let mut engine = SimEngine::new(config, world, Box::new(sink.clone())).unwrap();

    engine.start();
    engine.update().unwrap();

    assert_eq!(sink.count(EventKind::Collision), 1);
}

#[test]
fn config_from_yaml_drives_engine() {
    let yaml = r"
seed: 9
delta_time: 0.05
resolver: center-of-mass
";
    let config = SimConfig::from_yaml(yaml).unwrap();
    let engine = SimEngine::from_config(config).unwrap();

    assert_eq!(engine.resolver_kind(), ResolverKind::CenterOfMass);
    assert!((engine.delta_time() - 0.05).abs() < f64::EPSILON);
}
