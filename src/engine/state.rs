//! Simulation state management.
//!
//! Implements the world state with:
//! - `Vec3` value type for positions, velocities and forces
//! - Free sensors and the sensor-sphere network
//! - Aggregate energy and momentum
//! - Finite-value inspection for Jidoka

use serde::{Deserialize, Serialize};

use crate::domains::network::SensorSphereNetwork;
use crate::domains::sensor::Sensor;
use crate::domains::sphere::SensorSphere;
use crate::error::{SimError, SimResult};

/// 3D vector for positions, velocities and forces.
///
/// A plain value: every operation returns a new vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Unit vector along +x.
    #[must_use]
    pub const fn unit_x() -> Self {
        Self { x: 1.0, y: 0.0, z: 0.0 }
    }

    /// Unit vector along +y.
    #[must_use]
    pub const fn unit_y() -> Self {
        Self { x: 0.0, y: 1.0, z: 0.0 }
    }

    /// Unit vector along +z.
    #[must_use]
    pub const fn unit_z() -> Self {
        Self { x: 0.0, y: 0.0, z: 1.0 }
    }

    /// Magnitude squared.
    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Magnitude (length).
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (*other - *self).magnitude()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Normalize to unit vector.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the magnitude is zero.
    pub fn normalize(&self) -> SimResult<Self> {
        let mag = self.magnitude();
        if mag == 0.0 || !mag.is_finite() {
            return Err(SimError::degenerate(format!(
                "cannot normalize vector ({}, {}, {}) with magnitude {mag}",
                self.x, self.y, self.z
            )));
        }
        Ok(Self {
            x: self.x / mag,
            y: self.y / mag,
            z: self.z / mag,
        })
    }

    /// Scale by scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Rotate around a unit `axis` by `angle` radians (Rodrigues' formula).
    ///
    /// ```text
    /// v' = v·cosθ + (k × v)·sinθ + k·(k·v)·(1 − cosθ)
    /// ```
    ///
    /// The axis is expected to be normalized by the caller.
    #[must_use]
    pub fn rotate_around_axis(&self, axis: &Self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        *self * cos + axis.cross(self) * sin + *axis * (axis.dot(self) * (1.0 - cos))
    }

    /// Linear interpolation toward `other` by fraction `t`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }

    /// Check if all components are finite.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // is_finite not const
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::ops::SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Div<f64> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        self.scale(1.0 / rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}

/// Simulation state.
///
/// Owns the free sensors and the sensor-sphere network. The first sphere of
/// the network is the container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "StateRecord")]
pub struct SimState {
    /// Sensors not owned by any sphere.
    sensors: Vec<Sensor>,
    /// Sensor spheres; index 0 is the container.
    network: SensorSphereNetwork,
}

#[derive(Deserialize)]
struct StateRecord {
    #[serde(default)]
    sensors: Vec<Sensor>,
    #[serde(default)]
    network: SensorSphereNetwork,
}

impl TryFrom<StateRecord> for SimState {
    type Error = SimError;

    fn try_from(record: StateRecord) -> SimResult<Self> {
        let mut state = Self {
            sensors: Vec::new(),
            network: record.network,
        };
        for sensor in record.sensors {
            state.add_sensor(sensor)?;
        }
        Ok(state)
    }
}

impl SimState {
    /// Create a new empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state from free sensors and spheres.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if two sensors or two spheres share an id.
    pub fn from_parts(sensors: Vec<Sensor>, spheres: Vec<SensorSphere>) -> SimResult<Self> {
        let mut state = Self::new();
        for sensor in sensors {
            state.add_sensor(sensor)?;
        }
        for sphere in spheres {
            state.add_sphere(sphere)?;
        }
        Ok(state)
    }

    /// Get number of free sensors.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len not const in older Rust
    pub fn num_sensors(&self) -> usize {
        self.sensors.len()
    }

    /// Get number of spheres.
    #[must_use]
    pub fn num_spheres(&self) -> usize {
        self.network.len()
    }

    /// Add a free sensor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a free sensor with the same id exists.
    pub fn add_sensor(&mut self, sensor: Sensor) -> SimResult<()> {
        if self.sensors.iter().any(|s| s.id() == sensor.id()) {
            return Err(SimError::invalid_argument(format!(
                "sensor id '{}' already present",
                sensor.id()
            )));
        }
        self.sensors.push(sensor);
        Ok(())
    }

    /// Remove a free sensor by id.
    pub fn remove_sensor(&mut self, id: &str) -> Option<Sensor> {
        let index = self.sensors.iter().position(|s| s.id() == id)?;
        Some(self.sensors.remove(index))
    }

    /// Add a sphere to the network.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a sphere with the same id exists.
    pub fn add_sphere(&mut self, sphere: SensorSphere) -> SimResult<()> {
        self.network.add_sphere(sphere)
    }

    /// Get free sensors.
    #[must_use]
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    /// Get mutable free sensors.
    #[must_use]
    pub fn sensors_mut(&mut self) -> &mut [Sensor] {
        &mut self.sensors
    }

    /// Get spheres.
    #[must_use]
    pub fn spheres(&self) -> &[SensorSphere] {
        self.network.spheres()
    }

    /// Get the sphere network.
    #[must_use]
    pub const fn network(&self) -> &SensorSphereNetwork {
        &self.network
    }

    /// Get the mutable sphere network.
    #[must_use]
    pub fn network_mut(&mut self) -> &mut SensorSphereNetwork {
        &mut self.network
    }

    /// The container sphere (first sphere), if any.
    #[must_use]
    pub fn container(&self) -> Option<&SensorSphere> {
        self.network.spheres().first()
    }

    /// Visit every sensor: free sensors first, then sphere members in order.
    pub fn for_each_sensor_mut(&mut self, mut f: impl FnMut(&mut Sensor)) {
        for sensor in &mut self.sensors {
            f(sensor);
        }
        for sphere in self.network.spheres_mut() {
            for sensor in sphere.sensors_mut() {
                f(sensor);
            }
        }
    }

    /// Iterate every sensor: free sensors first, then sphere members in order.
    pub fn all_sensors(&self) -> impl Iterator<Item = &Sensor> + '_ {
        self.sensors
            .iter()
            .chain(self.network.spheres().iter().flat_map(SensorSphere::sensors))
    }

    /// Sensors taking part in collision detection: free sensors, then the
    /// container's members.
    #[must_use]
    pub fn collision_bodies_mut(&mut self) -> Vec<&mut Sensor> {
        let mut bodies: Vec<&mut Sensor> = self.sensors.iter_mut().collect();
        if let Some(container) = self.network.spheres_mut().first_mut() {
            bodies.extend(container.sensors_mut().iter_mut());
        }
        bodies
    }

    /// Negate every sensor and sphere velocity.
    pub fn negate_velocities(&mut self) {
        for sphere in self.network.spheres_mut() {
            sphere.set_velocity(-sphere.velocity());
        }
        self.for_each_sensor_mut(|s| s.set_velocity(-s.velocity()));
    }

    /// Get total kinetic energy of all sensors.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        self.all_sensors().map(Sensor::kinetic_energy).sum()
    }

    /// Get total linear momentum of all sensors.
    #[must_use]
    pub fn momentum(&self) -> Vec3 {
        self.all_sensors()
            .fold(Vec3::zero(), |acc, s| acc + s.momentum())
    }

    /// Check if all kinematic values are finite.
    #[must_use]
    pub fn all_finite(&self) -> bool {
        self.all_sensors()
            .all(|s| s.position().is_finite() && s.velocity().is_finite())
            && self
                .spheres()
                .iter()
                .all(|s| s.center().is_finite() && s.velocity().is_finite())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sensor(id: &str, mass: f64, position: Vec3, velocity: Vec3) -> Sensor {
        Sensor::new(id, position, velocity, mass, 0.0).unwrap()
    }

    #[test]
    fn test_vec3_operations() {
        let v1 = Vec3::new(1.0, 2.0, 3.0);
        let v2 = Vec3::new(4.0, 5.0, 6.0);

        // Addition
        let sum = v1 + v2;
        assert!((sum.x - 5.0).abs() < f64::EPSILON);
        assert!((sum.y - 7.0).abs() < f64::EPSILON);
        assert!((sum.z - 9.0).abs() < f64::EPSILON);

        // Subtraction
        let diff = v2 - v1;
        assert!((diff.x - 3.0).abs() < f64::EPSILON);

        // Dot product
        let dot = v1.dot(&v2);
        assert!((dot - 32.0).abs() < f64::EPSILON); // 1*4 + 2*5 + 3*6 = 32

        // Cross product
        let cross = v1.cross(&v2);
        assert!((cross.x - (-3.0)).abs() < f64::EPSILON);
        assert!((cross.y - 6.0).abs() < f64::EPSILON);
        assert!((cross.z - (-3.0)).abs() < f64::EPSILON);

        // Magnitude
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert!((v.magnitude() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vec3_operations_do_not_alias() {
        let a = Vec3::new(1.0, 1.0, 1.0);
        let mut b = a;
        b += Vec3::new(1.0, 0.0, 0.0);
        assert!((a.x - 1.0).abs() < f64::EPSILON);
        assert!((b.x - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vec3_normalize() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let n = v.normalize().unwrap();

        assert!((n.magnitude() - 1.0).abs() < f64::EPSILON);
        assert!((n.x - 0.6).abs() < f64::EPSILON);
        assert!((n.y - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vec3_normalize_zero_is_degenerate() {
        let err = Vec3::zero().normalize().unwrap_err();
        assert!(err.is_degenerate_geometry());
    }

    #[test]
    fn test_vec3_div_and_distance() {
        let v = Vec3::new(2.0, 4.0, 6.0) / 2.0;
        assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));

        let d = Vec3::zero().distance_to(&Vec3::new(0.0, 3.0, 4.0));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vec3_rotate_around_axis() {
        // Quarter turn of +x around +z lands on +y
        let r = Vec3::unit_x().rotate_around_axis(&Vec3::unit_z(), std::f64::consts::FRAC_PI_2);
        assert!(r.x.abs() < 1e-12);
        assert!((r.y - 1.0).abs() < 1e-12);
        assert!(r.z.abs() < 1e-12);

        // Vectors on the axis are fixed
        let on_axis = Vec3::new(0.0, 0.0, 2.0).rotate_around_axis(&Vec3::unit_z(), 1.234);
        assert!((on_axis.z - 2.0).abs() < 1e-12);
        assert!(on_axis.x.abs() < 1e-12);
    }

    #[test]
    fn test_vec3_lerp() {
        let a = Vec3::zero();
        let b = Vec3::new(10.0, 0.0, 0.0);
        assert!((a.lerp(&b, 0.25).x - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vec3_neg() {
        let v = Vec3::new(1.0, -2.0, 3.0);
        let neg = -v;
        assert!((neg.x - (-1.0)).abs() < f64::EPSILON);
        assert!((neg.y - 2.0).abs() < f64::EPSILON);
        assert!((neg.z - (-3.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vec3_is_finite() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f64::INFINITY, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, 0.0, f64::NAN).is_finite());
    }

    #[test]
    fn test_state_add_sensor_rejects_duplicate_id() {
        let mut state = SimState::new();
        state
            .add_sensor(sensor("a", 1.0, Vec3::zero(), Vec3::zero()))
            .unwrap();
        let err = state
            .add_sensor(sensor("a", 2.0, Vec3::zero(), Vec3::zero()))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(state.num_sensors(), 1);
    }

    #[test]
    fn test_state_remove_sensor() {
        let mut state = SimState::new();
        state
            .add_sensor(sensor("a", 1.0, Vec3::zero(), Vec3::zero()))
            .unwrap();
        assert!(state.remove_sensor("missing").is_none());
        assert_eq!(state.remove_sensor("a").unwrap().id(), "a");
        assert_eq!(state.num_sensors(), 0);
    }

    #[test]
    fn test_state_energy_and_momentum() {
        let mut state = SimState::new();

        // Body with mass 2, velocity (3, 0, 0) -> KE = 0.5 * 2 * 9 = 9
        state
            .add_sensor(sensor("a", 2.0, Vec3::zero(), Vec3::new(3.0, 0.0, 0.0)))
            .unwrap();
        state
            .add_sensor(sensor("b", 1.0, Vec3::zero(), Vec3::new(-6.0, 0.0, 0.0)))
            .unwrap();

        assert!((state.kinetic_energy() - 27.0).abs() < 1e-12);
        assert!(state.momentum().magnitude() < 1e-12);
    }

    #[test]
    fn test_state_container_is_first_sphere() {
        let mut state = SimState::new();
        assert!(state.container().is_none());

        state
            .add_sphere(SensorSphere::new("box", Vec3::zero(), 5.0).unwrap())
            .unwrap();
        state
            .add_sphere(SensorSphere::new("other", Vec3::unit_x(), 1.0).unwrap())
            .unwrap();

        assert_eq!(state.container().unwrap().id(), "box");
    }

    #[test]
    fn test_state_negate_velocities() {
        let mut state = SimState::new();
        state
            .add_sensor(sensor("a", 1.0, Vec3::zero(), Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        state.negate_velocities();
        assert_eq!(state.sensors()[0].velocity(), Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_state_all_finite() {
        let mut state = SimState::new();
        state
            .add_sensor(sensor("a", 1.0, Vec3::new(1.0, 2.0, 3.0), Vec3::zero()))
            .unwrap();
        assert!(state.all_finite());

        state.sensors_mut()[0].set_position(Vec3::new(f64::NAN, 0.0, 0.0));
        assert!(!state.all_finite());
    }

    #[test]
    fn test_state_clone_is_independent() {
        let mut state = SimState::new();
        state
            .add_sensor(sensor("a", 1.0, Vec3::zero(), Vec3::zero()))
            .unwrap();

        let snapshot = state.clone();
        state.sensors_mut()[0].set_position(Vec3::new(9.0, 9.0, 9.0));

        assert_eq!(snapshot.sensors()[0].position(), Vec3::zero());
    }

    #[test]
    fn test_state_deserialize_enforces_unique_ids() {
        let mut state = SimState::new();
        state
            .add_sensor(sensor("a", 1.0, Vec3::zero(), Vec3::zero()))
            .unwrap();
        state
            .add_sphere(SensorSphere::new("box", Vec3::zero(), 5.0).unwrap())
            .unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let back: SimState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sensors(), state.sensors());
        assert_eq!(back.spheres(), state.spheres());

        let sensor_json = serde_json::to_string(&state.sensors()[0]).unwrap();
        let doubled = format!(r#"{{"sensors":[{sensor_json},{sensor_json}]}}"#);
        assert!(serde_json::from_str::<SimState>(&doubled).is_err());

        let sphere_json = serde_json::to_string(&state.spheres()[0]).unwrap();
        let doubled = format!(r#"{{"network":{{"spheres":[{sphere_json},{sphere_json}]}}}}"#);
        assert!(serde_json::from_str::<SimState>(&doubled).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Falsification: dot product is commutative.
        #[test]
        fn prop_dot_commutative(
            x1 in -1e6f64..1e6, y1 in -1e6f64..1e6, z1 in -1e6f64..1e6,
            x2 in -1e6f64..1e6, y2 in -1e6f64..1e6, z2 in -1e6f64..1e6,
        ) {
            let v1 = Vec3::new(x1, y1, z1);
            let v2 = Vec3::new(x2, y2, z2);

            let d1 = v1.dot(&v2);
            let d2 = v2.dot(&v1);

            prop_assert!((d1 - d2).abs() < 1e-9 * d1.abs().max(1.0));
        }

        /// Falsification: normalized vectors have unit length.
        #[test]
        fn prop_normalize_unit_length(
            x in -1e6f64..1e6, y in -1e6f64..1e6, z in -1e6f64..1e6,
        ) {
            let v = Vec3::new(x, y, z);

            // Skip zero vectors
            if v.magnitude() < f64::EPSILON {
                return Ok(());
            }

            let n = v.normalize();
            prop_assert!(n.is_ok());
            if let Ok(n) = n {
                prop_assert!((n.magnitude() - 1.0).abs() < 1e-9);
            }
        }

        /// Falsification: rotation preserves length.
        #[test]
        fn prop_rotation_preserves_length(
            x in -1e3f64..1e3, y in -1e3f64..1e3, z in -1e3f64..1e3,
            angle in -10.0f64..10.0,
        ) {
            let v = Vec3::new(x, y, z);
            let axis = Vec3::new(1.0, 1.0, 0.0).normalize();
            prop_assert!(axis.is_ok());
            if let Ok(axis) = axis {
                let r = v.rotate_around_axis(&axis, angle);
                prop_assert!((r.magnitude() - v.magnitude()).abs() < 1e-9 * v.magnitude().max(1.0));
            }
        }
    }
}
