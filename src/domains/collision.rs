//! Pairwise elastic collision detection and response.
//!
//! Four interchangeable resolvers share one contract: given an approaching,
//! non-degenerate pair, return post-collision velocities that leave total
//! momentum unchanged.
//!
//! | Resolver      | Cost       | Energy exact | Notes                               |
//! |---------------|------------|--------------|-------------------------------------|
//! | Impulse       | O(1)       | yes          | canonical closed form               |
//! | CenterOfMass  | O(1)       | yes          | COM-frame cross-check of Impulse    |
//! | BruteForce    | O(k)       | to tolerance | iterative relaxation toward Impulse |
//! | PenaltyForce  | O(1)       | yes          | currently identical to Impulse      |
//!
//! # Sign convention
//!
//! For a pair `(i, j)` the normal points from `i` to `j` and the relative
//! velocity is `vᵢ − vⱼ`. A response happens only when `speed = rel·n < 0`.

use crate::domains::sensor::{OperationalState, Sensor};
use crate::engine::state::Vec3;
use crate::error::{SimError, SimResult};

/// Kinematic snapshot of one body in a colliding pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Mass.
    pub mass: f64,
    /// Position.
    pub position: Vec3,
    /// Velocity.
    pub velocity: Vec3,
}

impl Body {
    /// Create a body snapshot.
    #[must_use]
    pub const fn new(mass: f64, position: Vec3, velocity: Vec3) -> Self {
        Self {
            mass,
            position,
            velocity,
        }
    }
}

impl From<&Sensor> for Body {
    fn from(sensor: &Sensor) -> Self {
        Self::new(sensor.mass(), sensor.position(), sensor.velocity())
    }
}

/// Input to a resolver: the two bodies of a candidate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairState {
    /// First body (`i`).
    pub a: Body,
    /// Second body (`j`).
    pub b: Body,
}

impl PairState {
    /// Create a pair.
    #[must_use]
    pub const fn new(a: Body, b: Body) -> Self {
        Self { a, b }
    }

    /// Unit normal from `a` to `b`.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the bodies coincide.
    pub fn normal(&self) -> SimResult<Vec3> {
        (self.b.position - self.a.position).normalize()
    }

    /// Relative velocity `vₐ − v_b` projected on `normal`.
    #[must_use]
    pub fn approach_speed(&self, normal: &Vec3) -> f64 {
        (self.a.velocity - self.b.velocity).dot(normal)
    }

    /// Total linear momentum.
    #[must_use]
    pub fn momentum(&self) -> Vec3 {
        self.a.velocity * self.a.mass + self.b.velocity * self.b.mass
    }

    /// Total kinetic energy.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.a.mass * self.a.velocity.magnitude_squared()
            + 0.5 * self.b.mass * self.b.velocity.magnitude_squared()
    }

    /// Copy of this pair with new velocities.
    #[must_use]
    pub const fn with_velocities(&self, va: Vec3, vb: Vec3) -> Self {
        Self {
            a: Body::new(self.a.mass, self.a.position, va),
            b: Body::new(self.b.mass, self.b.position, vb),
        }
    }

    fn total_mass(&self) -> SimResult<f64> {
        let total = self.a.mass + self.b.mass;
        if total > 0.0 {
            Ok(total)
        } else {
            Err(SimError::invalid_argument("colliding pair has no mass"))
        }
    }
}

/// Collision response strategy.
pub trait CollisionResolver {
    /// Post-collision velocities `(v_a', v_b')`.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the bodies coincide.
    fn resolve(&self, pair: &PairState) -> SimResult<(Vec3, Vec3)>;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}

/// Closed-form elastic impulse exchange along the contact normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpulseResolver;

impl CollisionResolver for ImpulseResolver {
    fn resolve(&self, pair: &PairState) -> SimResult<(Vec3, Vec3)> {
        let normal = pair.normal()?;
        let speed = pair.approach_speed(&normal);
        let impulse = 2.0 * speed / pair.total_mass()?;

        let va = pair.a.velocity - normal * (impulse * pair.b.mass);
        let vb = pair.b.velocity + normal * (impulse * pair.a.mass);
        Ok((va, vb))
    }

    fn name(&self) -> &'static str {
        "impulse"
    }
}

/// Elastic response computed in the center-of-mass frame.
///
/// Each body's velocity relative to the COM has its normal component
/// reversed. For head-on pairs that is the full reversal `u' = −u`; in
/// general the result matches [`ImpulseResolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterOfMassResolver;

impl CollisionResolver for CenterOfMassResolver {
    fn resolve(&self, pair: &PairState) -> SimResult<(Vec3, Vec3)> {
        let normal = pair.normal()?;
        let v_com = pair.momentum() / pair.total_mass()?;

        let reflect = |u: Vec3| u - normal * (2.0 * u.dot(&normal));
        let ua = reflect(pair.a.velocity - v_com);
        let ub = reflect(pair.b.velocity - v_com);

        Ok((v_com + ua, v_com + ub))
    }

    fn name(&self) -> &'static str {
        "center-of-mass"
    }
}

/// Iterative relaxation toward the impulse solution.
///
/// Each iteration moves both velocities a fraction `step_fraction` of the
/// remaining distance to the [`ImpulseResolver`] target, stopping once both
/// are within `tolerance` or after `max_iterations`. Only useful for
/// benchmarking convergence against the closed forms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BruteForceResolver {
    /// Relaxation step α.
    pub step_fraction: f64,
    /// Iteration cap.
    pub max_iterations: u32,
    /// Convergence tolerance on each velocity.
    pub tolerance: f64,
}

impl Default for BruteForceResolver {
    fn default() -> Self {
        Self {
            step_fraction: 0.001,
            max_iterations: 100_000,
            tolerance: 1e-4,
        }
    }
}

impl BruteForceResolver {
    /// Create a brute-force resolver.
    #[must_use]
    pub const fn new(step_fraction: f64, max_iterations: u32, tolerance: f64) -> Self {
        Self {
            step_fraction,
            max_iterations,
            tolerance,
        }
    }
}

impl CollisionResolver for BruteForceResolver {
    fn resolve(&self, pair: &PairState) -> SimResult<(Vec3, Vec3)> {
        let (target_a, target_b) = ImpulseResolver.resolve(pair)?;
        let mut va = pair.a.velocity;
        let mut vb = pair.b.velocity;

        let converged = |va: Vec3, vb: Vec3| {
            va.distance_to(&target_a) < self.tolerance && vb.distance_to(&target_b) < self.tolerance
        };

        let mut iterations = 0;
        while !converged(va, vb) && iterations < self.max_iterations {
            va += (target_a - va) * self.step_fraction;
            vb += (target_b - vb) * self.step_fraction;
            iterations += 1;
        }

        if !converged(va, vb) {
            tracing::warn!(iterations, "brute-force resolver hit iteration cap");
        }

        Ok((va, vb))
    }

    fn name(&self) -> &'static str {
        "brute-force"
    }
}

/// Placeholder for a spring/damper penetration model.
///
/// Presently delegates to [`ImpulseResolver`] and is behaviorally identical
/// to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PenaltyForceResolver;

impl CollisionResolver for PenaltyForceResolver {
    fn resolve(&self, pair: &PairState) -> SimResult<(Vec3, Vec3)> {
        ImpulseResolver.resolve(pair)
    }

    fn name(&self) -> &'static str {
        "penalty-force"
    }
}

/// One resolved collision, as seen by observers.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionOutcome {
    /// Ids of the two sensors.
    pub participant_ids: [String; 2],
    /// Pair momentum before response.
    pub pre_momentum: Vec3,
    /// Pair momentum after response.
    pub post_momentum: Vec3,
    /// Pair kinetic energy before response.
    pub pre_energy: f64,
    /// Pair kinetic energy after response.
    pub post_energy: f64,
}

/// Result of a detection/resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Pairs that collided and were resolved.
    pub resolved: usize,
    /// Overlapping pairs skipped for lack of a contact normal.
    pub skipped_degenerate: usize,
}

fn participates(sensor: &Sensor) -> bool {
    sensor.state() == OperationalState::Active
}

/// Detect and resolve collisions among every unordered pair of `bodies`.
///
/// A pair is a candidate when both sensors are active and their centers are
/// within the sum of their radii. Coincident candidates are skipped. Each
/// resolved pair is reported to `on_resolved`.
///
/// # Errors
///
/// Propagates resolver errors other than `DegenerateGeometry`.
pub fn resolve_collisions(
    bodies: &mut [&mut Sensor],
    resolver: &dyn CollisionResolver,
    mut on_resolved: impl FnMut(CollisionOutcome),
) -> SimResult<CollisionReport> {
    let mut report = CollisionReport::default();
    let n = bodies.len();

    for j in 1..n {
        let (head, tail) = bodies.split_at_mut(j);
        let b: &mut Sensor = &mut *tail[0];

        for slot in head.iter_mut() {
            let a: &mut Sensor = &mut **slot;
            if !participates(a) || !participates(b) {
                continue;
            }
            if a.position().distance_to(&b.position()) > a.radius() + b.radius() {
                continue;
            }

            let pair = PairState::new(Body::from(&*a), Body::from(&*b));
            let normal = match pair.normal() {
                Ok(n) => n,
                Err(e) if e.is_degenerate_geometry() => {
                    tracing::debug!(a = a.id(), b = b.id(), "skipping coincident pair");
                    report.skipped_degenerate += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if pair.approach_speed(&normal) >= 0.0 {
                continue;
            }

            let (va, vb) = resolver.resolve(&pair)?;
            a.set_velocity(va);
            b.set_velocity(vb);
            report.resolved += 1;

            let after = pair.with_velocities(va, vb);
            on_resolved(CollisionOutcome {
                participant_ids: [a.id().to_string(), b.id().to_string()],
                pre_momentum: pair.momentum(),
                post_momentum: after.momentum(),
                pre_energy: pair.kinetic_energy(),
                post_energy: after.kinetic_energy(),
            });
        }
    }

    Ok(report)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn vec3() -> impl Strategy<Value = Vec3> {
        (-10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    fn pair() -> impl Strategy<Value = PairState> {
        (0.1f64..10.0, 0.1f64..10.0, vec3(), vec3(), vec3(), vec3())
            .prop_filter("non-degenerate", |(_, _, pa, pb, _, _)| pa.distance_to(pb) > 1e-3)
            .prop_map(|(ma, mb, pa, pb, va, vb)| {
                PairState::new(Body::new(ma, pa, va), Body::new(mb, pb, vb))
            })
    }

    proptest! {
        /// Falsification: closed-form resolvers conserve momentum.
        #[test]
        fn prop_momentum_conserved(pair in pair()) {
            for resolver in [&ImpulseResolver as &dyn CollisionResolver, &CenterOfMassResolver] {
                let (va, vb) = resolver.resolve(&pair).map_err(|e| TestCaseError::fail(e.to_string()))?;
                let after = pair.with_velocities(va, vb);
                prop_assert!(pair.momentum().distance_to(&after.momentum()) < 1e-5);
            }
        }

        /// Falsification: closed-form resolvers conserve kinetic energy.
        #[test]
        fn prop_energy_conserved(pair in pair()) {
            for resolver in [&ImpulseResolver as &dyn CollisionResolver, &CenterOfMassResolver] {
                let (va, vb) = resolver.resolve(&pair).map_err(|e| TestCaseError::fail(e.to_string()))?;
                let after = pair.with_velocities(va, vb);
                prop_assert!((pair.kinetic_energy() - after.kinetic_energy()).abs() < 1e-5);
            }
        }

        /// Falsification: relaxation never changes total momentum.
        #[test]
        fn prop_brute_force_conserves_momentum(pair in pair()) {
            let (va, vb) = BruteForceResolver::new(0.01, 5_000, 1e-4)
                .resolve(&pair)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let after = pair.with_velocities(va, vb);
            prop_assert!(pair.momentum().distance_to(&after.momentum()) < 1e-5);
        }
    }
}
