//! Sensor spheres: rigid aggregates of sensors.
//!
//! A sphere owns its member sensors and moves them along with its own center.
//! Its mass is the sum of member masses and is recomputed whenever membership
//! changes.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::domains::fields::gravitational_acceleration;
use crate::domains::sensor::{validate_dt, OperationalState, Sensor};
use crate::engine::rng::SimRng;
use crate::engine::state::Vec3;
use crate::error::{SimError, SimResult};

/// Aggregate of sensors sharing a center, velocity and bounding radius.
///
/// Deserialization rebuilds the sphere through [`SensorSphere::new`] and
/// recomputes its mass from the decoded members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SphereRecord")]
pub struct SensorSphere {
    id: String,
    center: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    radius: f64,
    mass: f64,
    sensors: Vec<Sensor>,
    state: OperationalState,
}

/// Serialized form of a [`SensorSphere`]; any stored mass is ignored.
#[derive(Deserialize)]
struct SphereRecord {
    id: String,
    center: Vec3,
    #[serde(default)]
    velocity: Vec3,
    #[serde(default)]
    acceleration: Vec3,
    radius: f64,
    #[serde(default)]
    sensors: Vec<Sensor>,
    #[serde(default)]
    state: OperationalState,
}

impl TryFrom<SphereRecord> for SensorSphere {
    type Error = SimError;

    fn try_from(record: SphereRecord) -> SimResult<Self> {
        if !(record.velocity.is_finite() && record.acceleration.is_finite()) {
            return Err(SimError::invalid_argument(format!(
                "sphere '{}' kinematics must be finite",
                record.id
            )));
        }
        let mut sphere = Self::new(record.id, record.center, record.radius)?
            .with_velocity(record.velocity)
            .with_sensors(record.sensors)?;
        sphere.acceleration = record.acceleration;
        sphere.state = record.state;
        Ok(sphere)
    }
}

impl SensorSphere {
    /// Create an empty sphere.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the id is empty, the radius is not
    /// positive, or the center is non-finite.
    pub fn new(id: impl Into<String>, center: Vec3, radius: f64) -> SimResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(SimError::invalid_argument("sphere id must not be empty"));
        }
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(SimError::invalid_argument(format!(
                "sphere '{id}' radius must be positive and finite, got {radius}"
            )));
        }
        if !center.is_finite() {
            return Err(SimError::invalid_argument(format!(
                "sphere '{id}' center must be finite"
            )));
        }

        Ok(Self {
            id,
            center,
            velocity: Vec3::zero(),
            acceleration: Vec3::zero(),
            radius,
            mass: 0.0,
            sensors: Vec::new(),
            state: OperationalState::Active,
        })
    }

    /// Create a sphere populated with `count` unit-mass sensors drawn
    /// uniformly from its volume.
    ///
    /// Positions come from a stream forked off `rng`, so the number of
    /// members never shifts the draws `rng` produces afterwards.
    ///
    /// Member ids are `"{id}-sensor-{i}"`.
    ///
    /// # Errors
    ///
    /// Same as [`SensorSphere::new`].
    pub fn with_random_sensors(
        id: impl Into<String>,
        center: Vec3,
        radius: f64,
        count: usize,
        rng: &mut SimRng,
    ) -> SimResult<Self> {
        let mut sphere = Self::new(id, center, radius)?;
        let mut layout = rng.fork();
        for i in 0..count {
            let position = center + sample_in_ball(&mut layout, radius);
            let sensor = Sensor::new(
                format!("{}-sensor-{i}", sphere.id),
                position,
                Vec3::zero(),
                1.0,
                0.0,
            )?;
            sphere.sensors.push(sensor);
        }
        sphere.recompute_mass();
        Ok(sphere)
    }

    /// Builder: set the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: add members.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` on duplicate member ids.
    pub fn with_sensors(mut self, sensors: impl IntoIterator<Item = Sensor>) -> SimResult<Self> {
        for sensor in sensors {
            self.add_sensor(sensor)?;
        }
        Ok(self)
    }

    /// Get sphere id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get center.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Get velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Get pending acceleration.
    #[must_use]
    pub const fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Get radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Total mass of the members.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Get operational state.
    #[must_use]
    pub const fn state(&self) -> OperationalState {
        self.state
    }

    /// Get members.
    #[must_use]
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    /// Get mutable members.
    ///
    /// Slices cannot change membership, so the cached mass stays valid.
    #[must_use]
    pub fn sensors_mut(&mut self) -> &mut [Sensor] {
        &mut self.sensors
    }

    /// Look up a member by id.
    #[must_use]
    pub fn sensor(&self, id: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.id() == id)
    }

    /// Set velocity.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Add a member.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a member with the same id exists.
    pub fn add_sensor(&mut self, sensor: Sensor) -> SimResult<()> {
        if self.sensor(sensor.id()).is_some() {
            return Err(SimError::invalid_argument(format!(
                "sphere '{}' already has sensor '{}'",
                self.id,
                sensor.id()
            )));
        }
        self.sensors.push(sensor);
        self.recompute_mass();
        Ok(())
    }

    /// Remove a member by id.
    pub fn remove_sensor(&mut self, id: &str) -> Option<Sensor> {
        let index = self.sensors.iter().position(|s| s.id() == id)?;
        let removed = self.sensors.remove(index);
        self.recompute_mass();
        Some(removed)
    }

    fn recompute_mass(&mut self) {
        self.mass = self.sensors.iter().map(Sensor::mass).sum();
    }

    /// Advance the sphere and carry its members along.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `dt` is not positive.
    pub fn update(&mut self, dt: f64) -> SimResult<()> {
        validate_dt(dt)?;

        self.velocity += self.acceleration * dt;
        self.center += self.velocity * dt;
        self.acceleration = Vec3::zero();

        let transport = self.velocity * dt;
        for sensor in &mut self.sensors {
            sensor.set_position(sensor.position() + transport);
            sensor.update(dt)?;
        }

        Ok(())
    }

    /// Net gravitational acceleration on this sphere from `spheres`.
    ///
    /// `spheres` may contain this sphere; it is skipped by identity. Pairs at
    /// zero separation are skipped and counted.
    #[must_use]
    pub fn gravitational_acceleration_from(&self, spheres: &[Self], g: f64) -> (Vec3, usize) {
        let mut total = Vec3::zero();
        let mut skipped = 0;

        for other in spheres {
            if std::ptr::eq(self, other) {
                continue;
            }
            match gravitational_acceleration(g, self.center, other.mass, other.center) {
                Ok(a) => total += a,
                Err(_) => skipped += 1,
            }
        }

        (total, skipped)
    }

    /// Accumulate gravitational acceleration from `others`.
    ///
    /// Returns the number of zero-separation pairs skipped.
    pub fn calculate_forces(&mut self, others: &[Self], g: f64) -> usize {
        let (a, skipped) = self.gravitational_acceleration_from(others, g);
        self.acceleration += a;
        skipped
    }

    pub(crate) fn accelerate(&mut self, a: Vec3) {
        self.acceleration += a;
    }

    /// Apply a force to the whole sphere.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the sphere has no mass.
    pub fn apply_force(&mut self, force: Vec3) -> SimResult<()> {
        if self.mass <= 0.0 {
            return Err(SimError::state(format!(
                "cannot apply force to massless sphere '{}'",
                self.id
            )));
        }
        self.acceleration += force / self.mass;
        Ok(())
    }

    /// Apply an instantaneous impulse: `velocity += impulse / mass`.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the sphere has no mass.
    pub fn apply_impulse(&mut self, impulse: Vec3) -> SimResult<()> {
        if self.mass <= 0.0 {
            return Err(SimError::state(format!(
                "cannot apply impulse to massless sphere '{}'",
                self.id
            )));
        }
        self.velocity += impulse / self.mass;
        Ok(())
    }

    /// Rotate every member about the center.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` for a zero axis.
    pub fn rotate(&mut self, axis: Vec3, angle: f64) -> SimResult<()> {
        let k = axis.normalize()?;
        for sensor in &mut self.sensors {
            let offset = sensor.position() - self.center;
            sensor.set_position(self.center + offset.rotate_around_axis(&k, angle));
        }
        Ok(())
    }

    /// Push every member radially by `amplitude·sin(2π·frequency·dt)`.
    ///
    /// Members sitting exactly on the center have no radial direction and
    /// stay put.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `dt` is not positive.
    pub fn vibrate(&mut self, amplitude: f64, frequency: f64, dt: f64) -> SimResult<()> {
        validate_dt(dt)?;
        let offset = amplitude * (TAU * frequency * dt).sin();
        for sensor in &mut self.sensors {
            if let Ok(radial) = (sensor.position() - self.center).normalize() {
                sensor.set_position(sensor.position() + radial * offset);
            }
        }
        Ok(())
    }

    /// Set the operational state, optionally on every member too.
    pub fn set_state(&mut self, state: OperationalState, propagate: bool) {
        self.state = state;
        if propagate {
            for sensor in &mut self.sensors {
                sensor.set_state(state);
            }
        }
    }

    /// Reflect a sensor that escaped this sphere back onto its surface.
    ///
    /// Returns `true` if the sensor was outside.
    pub fn contain(&self, sensor: &mut Sensor) -> bool {
        reflect_into(self.center, self.radius, sensor)
    }

    /// Translational kinetic energy of the aggregate.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Linear momentum of the aggregate.
    #[must_use]
    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }
}

/// Keep `sensor` inside the ball `(center, radius)`.
///
/// A sensor farther than `radius` has its velocity mirrored about the
/// outward normal and is clamped onto the surface. Returns `true` if it was
/// outside.
pub fn reflect_into(center: Vec3, radius: f64, sensor: &mut Sensor) -> bool {
    let offset = sensor.position() - center;
    if offset.magnitude() <= radius {
        return false;
    }
    // Outside a positive radius implies a non-zero offset.
    let Ok(normal) = offset.normalize() else {
        return false;
    };

    let v = sensor.velocity();
    sensor.set_velocity(v - normal * (2.0 * v.dot(&normal)));
    sensor.set_position(center + normal * radius);
    true
}

/// Uniform point in a ball of `radius` around the origin.
fn sample_in_ball(rng: &mut SimRng, radius: f64) -> Vec3 {
    let u = rng.gen_f64();
    let v = rng.gen_f64();
    let w = rng.gen_f64();

    let theta = (2.0 * v - 1.0).acos();
    let phi = TAU * u;
    let r = radius * w.cbrt();

    Vec3::new(
        r * theta.sin() * phi.cos(),
        r * theta.sin() * phi.sin(),
        r * theta.cos(),
    )
}
