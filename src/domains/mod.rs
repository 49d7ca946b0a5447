//! Physical entities and their interactions.
//!
//! - Sensor: a point mass with charge, radius, color and motion modifiers
//! - Sphere: a rigid group of sensors with aggregate mass
//! - Network: the set of spheres and their mutual gravity
//! - Fields: gravity, electric and magnetic pair forces
//! - Collision: pairwise resolvers and the collision pass

pub mod collision;
pub mod fields;
pub mod network;
pub mod sensor;
pub mod sphere;

pub use collision::{
    resolve_collisions, BruteForceResolver, CenterOfMassResolver, CollisionOutcome,
    CollisionReport, CollisionResolver, ImpulseResolver, PairState, PenaltyForceResolver,
};
pub use fields::{ElectricField, ForceField, GravityField, MagneticField};
pub use network::SensorSphereNetwork;
pub use sensor::{Color, OperationalState, Sensor};
pub use sphere::SensorSphere;
