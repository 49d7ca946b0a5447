//! Core simulation engine.
//!
//! Implements the fixed-step tick loop with:
//! - Run state machine (Stopped ⇄ Running) and cooperative scheduling
//! - Pairwise collision detection with a configurable resolver
//! - Sphere-to-sphere gravity and container enforcement
//! - Snapshot/restore for reset
//! - Jidoka guards for stop-on-error
//!
//! # Tick order
//!
//! 1. advance the clock by `±delta_time`
//! 2. integrate spheres, then free sensors
//! 3. resolve sensor collisions
//! 4. accumulate sphere gravity
//! 5. reflect escaped sensors back into the container
//! 6. Jidoka inspection

pub mod clock;
pub mod jidoka;
pub mod rng;
pub mod scheduler;
pub mod sink;
pub mod state;

pub use clock::SimClock;
pub use jidoka::{JidokaConfig, JidokaGuard};
pub use rng::SimRng;
pub use scheduler::{PollResult, TickScheduler};
pub use sink::{EventKind, EventSink, LogLevel, NoopSink, PhysicsEvent, RecordingSink, TracingSink};
pub use state::{SimState, Vec3};

use crate::config::{BruteForceConfig, ResolverKind, SimConfig};
use crate::constants::{DEFAULT_RANDOMIZE_RANGE, DEFAULT_RANDOMIZE_SPEED};
use crate::domains::collision::{
    resolve_collisions, BruteForceResolver, CenterOfMassResolver, CollisionReport,
    CollisionResolver, ImpulseResolver, PenaltyForceResolver,
};
use crate::domains::sensor::Sensor;
use crate::domains::sphere::{reflect_into, SensorSphere};
use crate::error::{SimError, SimResult};

/// Build the resolver selected by `kind`.
#[must_use]
pub fn build_resolver(kind: ResolverKind, brute_force: &BruteForceConfig) -> Box<dyn CollisionResolver> {
    match kind {
        ResolverKind::Impulse => Box::new(ImpulseResolver),
        ResolverKind::CenterOfMass => Box::new(CenterOfMassResolver),
        ResolverKind::BruteForce => Box::new(BruteForceResolver::new(
            brute_force.step_fraction,
            brute_force.max_iterations,
            brute_force.tolerance,
        )),
        ResolverKind::PenaltyForce => Box::new(PenaltyForceResolver),
    }
}

/// Main simulation engine.
///
/// Owns the authoritative world state. Readers may inspect it between ticks;
/// all mutation goes through the engine.
pub struct SimEngine {
    /// Current world state.
    state: SimState,
    /// World state captured at construction, restored by `reset`.
    snapshot: SimState,
    /// Simulation clock.
    clock: SimClock,
    /// Cooperative tick scheduler.
    scheduler: TickScheduler,
    /// Jidoka guard for anomaly detection.
    jidoka: JidokaGuard,
    /// Random number generator.
    rng: SimRng,
    /// Active collision resolver.
    resolver: Box<dyn CollisionResolver>,
    /// Log and event destination.
    sink: Box<dyn EventSink>,
    /// Whether ticks currently advance the world.
    running: bool,
    /// Collision statistics of the last tick.
    last_report: CollisionReport,
    /// Configuration.
    config: SimConfig,
}

impl std::fmt::Debug for SimEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEngine")
            .field("global_time", &self.clock.global_time())
            .field("running", &self.running)
            .field("resolver", &self.resolver.name())
            .field("sensors", &self.state.num_sensors())
            .field("spheres", &self.state.num_spheres())
            .finish_non_exhaustive()
    }
}

impl SimEngine {
    /// Create an engine over `world`, reporting to `sink`.
    ///
    /// The world as passed in becomes the reset snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if configuration validation fails.
    pub fn new(config: SimConfig, mut world: SimState, sink: Box<dyn EventSink>) -> SimResult<Self> {
        config.check()?;

        world
            .network_mut()
            .set_gravitational_constant(config.gravitational_constant);

        Ok(Self {
            snapshot: world.clone(),
            state: world,
            clock: SimClock::new(config.delta_time),
            scheduler: TickScheduler::new(config.delta_time),
            jidoka: JidokaGuard::from_config(&config),
            rng: SimRng::new(config.seed),
            resolver: build_resolver(config.resolver, &config.brute_force),
            sink,
            running: false,
            last_report: CollisionReport::default(),
            config,
        })
    }

    /// Create an empty engine that logs through `tracing`.
    ///
    /// # Errors
    ///
    /// Returns error if configuration validation fails.
    pub fn from_config(config: SimConfig) -> SimResult<Self> {
        Self::new(config, SimState::new(), Box::new(TracingSink))
    }

    // ===== Accessors =====

    /// Get current simulation time.
    #[must_use]
    pub const fn global_time(&self) -> f64 {
        self.clock.global_time()
    }

    /// Get tick length.
    #[must_use]
    pub const fn delta_time(&self) -> f64 {
        self.clock.delta_time()
    }

    /// Set tick length. Validated at the next tick.
    pub fn set_delta_time(&mut self, delta_time: f64) {
        self.clock.set_delta_time(delta_time);
        self.scheduler.set_period(delta_time);
    }

    /// Whether the engine is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether time runs backward.
    #[must_use]
    pub const fn is_time_reversed(&self) -> bool {
        self.clock.is_reversed()
    }

    /// Ticks taken since construction or the last reset.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.clock.step_count()
    }

    /// Get current world state.
    #[must_use]
    pub const fn state(&self) -> &SimState {
        &self.state
    }

    /// Independent copy of the current world state.
    #[must_use]
    pub fn snapshot(&self) -> SimState {
        self.state.clone()
    }

    /// Get free sensors.
    #[must_use]
    pub fn sensors(&self) -> &[Sensor] {
        self.state.sensors()
    }

    /// Get sensor spheres.
    #[must_use]
    pub fn sensor_spheres(&self) -> &[SensorSphere] {
        self.state.spheres()
    }

    /// The container sphere (first sphere), if any.
    #[must_use]
    pub fn container(&self) -> Option<&SensorSphere> {
        self.state.container()
    }

    /// Get configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Active resolver kind.
    #[must_use]
    pub const fn resolver_kind(&self) -> ResolverKind {
        self.config.resolver
    }

    /// Collision statistics of the last tick.
    #[must_use]
    pub const fn last_collision_report(&self) -> CollisionReport {
        self.last_report
    }

    /// Get mutable reference to RNG.
    #[must_use]
    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Total kinetic energy: sensors plus sphere translation.
    #[must_use]
    pub fn total_kinetic_energy(&self) -> f64 {
        self.state.kinetic_energy()
            + self
                .state
                .spheres()
                .iter()
                .map(SensorSphere::kinetic_energy)
                .sum::<f64>()
    }

    /// Total linear momentum: sensors plus sphere translation.
    #[must_use]
    pub fn total_momentum(&self) -> Vec3 {
        self.state
            .spheres()
            .iter()
            .fold(self.state.momentum(), |acc, s| acc + s.momentum())
    }

    // ===== Run state =====

    /// Enter Running and arm the scheduler.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.sink.log(LogLevel::Info, "engine started", None);
        }
        self.scheduler.start();
    }

    /// Enter Stopped and cancel any scheduled tick.
    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            self.sink.log(LogLevel::Info, "engine paused", None);
        }
        self.scheduler.pause();
    }

    /// Run one tick. A no-op while stopped.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `delta_time` is not positive
    /// - Jidoka violations detected after the tick
    ///
    /// The running flag is never changed by a failing tick.
    pub fn update(&mut self) -> SimResult<()> {
        if !self.running {
            return Ok(());
        }
        self.step()
    }

    /// Synchronous tick entry point for host loops; same as [`Self::update`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`].
    pub fn tick(&mut self) -> SimResult<()> {
        self.update()
    }

    /// Drive the engine from a host clock.
    ///
    /// Polls the scheduler at host time `now` (seconds) and runs every tick
    /// that fell due. A pending restart from [`Self::reset`] re-enters
    /// Running here. Returns the number of ticks run.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` while Running if `delta_time` is not positive
    /// - otherwise stops at and returns the first failing tick
    ///
    /// The running flag is never changed by an error.
    pub fn advance(&mut self, now: f64) -> SimResult<u32> {
        self.scheduler.set_period(self.clock.delta_time());
        let poll = self.scheduler.poll(now);

        if poll.restarted {
            self.running = true;
            self.sink.log(LogLevel::Info, "engine restarted", None);
        }
        if self.running {
            self.clock.check_delta_time()?;
        }

        let mut ticks = 0;
        for _ in 0..poll.due {
            if !self.running {
                break;
            }
            self.step()?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Run `n` ticks (each a no-op while stopped).
    ///
    /// # Errors
    ///
    /// Returns error if any tick fails.
    pub fn run_for(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.update()?;
        }
        Ok(())
    }

    /// Run ticks until `predicate` holds, at most `max_ticks` of them.
    ///
    /// Returns whether the predicate was satisfied.
    ///
    /// # Errors
    ///
    /// Returns error if any tick fails.
    pub fn run_until<F>(&mut self, predicate: F, max_ticks: u64) -> SimResult<bool>
    where
        F: Fn(&SimState) -> bool,
    {
        for _ in 0..max_ticks {
            if predicate(&self.state) {
                return Ok(true);
            }
            self.update()?;
        }
        Ok(predicate(&self.state))
    }

    fn step(&mut self) -> SimResult<()> {
        let dt = self.clock.tick()?;

        self.state.network_mut().update(dt)?;
        for sensor in self.state.sensors_mut() {
            sensor.update(dt)?;
        }

        self.resolve_collisions()?;

        let skipped = self.state.network_mut().calculate_interactions();
        if skipped > 0 {
            self.sink.log(
                LogLevel::Debug,
                "skipped coincident sphere pairs",
                Some(&format!("{skipped} pairs")),
            );
        }

        self.enforce_container();

        self.jidoka.check(&self.state)
    }

    fn resolve_collisions(&mut self) -> SimResult<()> {
        let timestamp = self.clock.global_time();
        let sink = &mut self.sink;
        let mut bodies = self.state.collision_bodies_mut();

        let report = resolve_collisions(&mut bodies, self.resolver.as_ref(), |outcome| {
            let event = PhysicsEvent::new(
                timestamp,
                EventKind::Collision,
                outcome.participant_ids.to_vec(),
            )
            .with_momentum(outcome.pre_momentum, outcome.post_momentum)
            .with_energy(outcome.pre_energy, outcome.post_energy);
            sink.record_event(event);
        })?;

        if report.skipped_degenerate > 0 {
            self.sink.log(
                LogLevel::Debug,
                "skipped coincident sensor pairs",
                Some(&format!("{} pairs", report.skipped_degenerate)),
            );
        }
        self.last_report = report;
        Ok(())
    }

    fn enforce_container(&mut self) {
        let Some((center, radius)) = self.state.container().map(|c| (c.center(), c.radius())) else {
            return;
        };
        self.state.for_each_sensor_mut(|sensor| {
            reflect_into(center, radius, sensor);
        });
    }

    // ===== World operations =====

    /// Restore the construction-time world.
    ///
    /// Stops the engine, cancels any scheduled tick, restores every sensor
    /// and sphere from the snapshot, zeroes the clock and reseeds the RNG.
    /// With `restart`, the engine re-enters Running at the next
    /// [`Self::advance`].
    pub fn reset(&mut self, restart: bool) {
        self.running = false;
        self.scheduler.reset(restart);
        self.state = self.snapshot.clone();
        self.clock.reset();
        self.rng.reseed();
        self.last_report = CollisionReport::default();
        self.sink.log(
            LogLevel::Info,
            "engine reset",
            restart.then_some("restart pending"),
        );
    }

    /// Redraw every sensor's position and velocity.
    ///
    /// Positions are uniform in `±randomize_range` per axis, velocities in
    /// `±randomize_range / 10`. Mass, charge and state are kept.
    pub fn randomize(&mut self) {
        let range = self.config.randomize_range;
        let speed = DEFAULT_RANDOMIZE_SPEED * range / DEFAULT_RANDOMIZE_RANGE;
        let rng = &mut self.rng;

        self.state.for_each_sensor_mut(|sensor| {
            sensor.set_position(rng.gen_vec3_symmetric(range));
            sensor.set_velocity(rng.gen_vec3_symmetric(speed));
        });
        self.sink.log(LogLevel::Info, "sensors randomized", None);
    }

    /// Flip time direction and negate every sensor and sphere velocity.
    pub fn toggle_time_reversal(&mut self) {
        let reversed = self.clock.toggle_reversal();
        self.state.negate_velocities();
        self.sink.log(
            LogLevel::Info,
            "time reversal toggled",
            Some(if reversed { "reversed" } else { "forward" }),
        );
    }

    /// Add a free sensor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a free sensor with the same id exists.
    pub fn add_sensor(&mut self, sensor: Sensor) -> SimResult<()> {
        self.state.add_sensor(sensor)
    }

    /// Remove a free sensor by id.
    pub fn remove_sensor(&mut self, id: &str) -> Option<Sensor> {
        self.state.remove_sensor(id)
    }

    /// Add a sensor sphere. The first sphere added is the container.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a sphere with the same id exists.
    pub fn add_sensor_sphere(&mut self, sphere: SensorSphere) -> SimResult<()> {
        self.state.add_sphere(sphere)
    }

    /// Apply an impulse to the sphere `id` and record an `Impulse` event.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if no sphere has that id
    /// - `StateError` if the sphere has no mass
    pub fn apply_impulse_to_sphere(&mut self, id: &str, impulse: Vec3) -> SimResult<()> {
        let sphere = self
            .state
            .network_mut()
            .sphere_mut(id)
            .ok_or_else(|| SimError::invalid_argument(format!("no sphere with id '{id}'")))?;

        let pre_momentum = sphere.momentum();
        let pre_energy = sphere.kinetic_energy();
        sphere.apply_impulse(impulse)?;

        let event = PhysicsEvent::new(self.clock.global_time(), EventKind::Impulse, vec![id.to_string()])
            .with_momentum(pre_momentum, sphere.momentum())
            .with_energy(pre_energy, sphere.kinetic_energy());
        self.sink.record_event(event);
        Ok(())
    }

    /// Switch the collision resolver.
    pub fn set_resolver(&mut self, kind: ResolverKind) {
        self.resolver = build_resolver(kind, &self.config.brute_force);
        self.config.resolver = kind;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn world(sensor_velocity: Vec3, sphere_velocity: Vec3) -> SimResult<SimState> {
        let free = Sensor::new("free", Vec3::zero(), sensor_velocity, 1.0, 0.0)?;
        let member = Sensor::new("member", Vec3::unit_x(), sensor_velocity * 0.5, 2.0, 0.0)?;
        let sphere = SensorSphere::new("box", Vec3::zero(), 10.0)?
            .with_velocity(sphere_velocity)
            .with_sensors([member])?;
        SimState::from_parts(vec![free], vec![sphere])
    }

    proptest! {
        /// Falsification: toggling time reversal twice is the identity.
        #[test]
        fn prop_double_toggle_is_identity(
            vx in -100.0f64..100.0, vy in -100.0f64..100.0, vz in -100.0f64..100.0,
            sx in -10.0f64..10.0, sy in -10.0f64..10.0, sz in -10.0f64..10.0,
            ticks in 0u64..5,
        ) {
            let config = SimConfig::builder().delta_time(0.01).build();
            let engine = world(Vec3::new(vx, vy, vz), Vec3::new(sx, sy, sz))
                .and_then(|w| SimEngine::new(config, w, Box::new(NoopSink)));
            prop_assert!(engine.is_ok());

            if let Ok(mut engine) = engine {
                engine.start();
                prop_assert!(engine.run_for(ticks).is_ok());
                let before = engine.snapshot();
                let time = engine.global_time();

                engine.toggle_time_reversal();
                engine.toggle_time_reversal();

                prop_assert!(!engine.is_time_reversed());
                prop_assert_eq!(engine.global_time().to_bits(), time.to_bits());
                prop_assert_eq!(engine.sensors(), before.sensors());
                prop_assert_eq!(engine.sensor_spheres(), before.spheres());
            }
        }
    }
}
