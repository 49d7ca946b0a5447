//! # spheresim
//!
//! Discrete-time physics core for sensors and sensor spheres.
//!
//! A deterministic, fixed-step engine implementing:
//! - Point-mass sensors grouped into rigid spheres
//! - Pairwise gravity, electric and magnetic fields
//! - Four interchangeable collision resolvers
//! - Jidoka stop-on-error inspection after every tick
//!
//! ## Example
//!
//! ```rust
//! use spheresim::prelude::*;
//!
//! let config = SimConfig::builder()
//!     .seed(42)
//!     .delta_time(0.1)
//!     .build();
//!
//! let mut engine = SimEngine::from_config(config).unwrap();
//! engine
//!     .add_sensor(Sensor::new("probe", Vec3::zero(), Vec3::unit_x(), 1.0, 0.0).unwrap())
//!     .unwrap();
//!
//! engine.start();
//! engine.update().unwrap();
//! assert!((engine.sensors()[0].position().x - 0.1).abs() < 1e-12);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
)]

pub mod config;
pub mod constants;
pub mod domains;
pub mod engine;
pub mod error;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ResolverKind, SimConfig, SimConfigBuilder};
    pub use crate::domains::collision::{
        BruteForceResolver, CenterOfMassResolver, CollisionResolver, ImpulseResolver,
        PenaltyForceResolver,
    };
    pub use crate::domains::fields::{ElectricField, ForceField, GravityField, MagneticField};
    pub use crate::domains::{OperationalState, Sensor, SensorSphere, SensorSphereNetwork};
    pub use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
    pub use crate::engine::rng::SimRng;
    pub use crate::engine::sink::{EventKind, EventSink, NoopSink, PhysicsEvent, RecordingSink, TracingSink};
    pub use crate::engine::{SimEngine, SimState, Vec3};
    pub use crate::error::{SimError, SimResult};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
