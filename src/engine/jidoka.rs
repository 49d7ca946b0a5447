//! Jidoka (自働化) - Autonomous anomaly detection.
//!
//! Runs after every tick and stops the line when the world state can no
//! longer be trusted.
//!
//! # Anomaly Types
//!
//! 1. **Non-finite values**: NaN or Inf in any sensor or sphere kinematics
//! 2. **Speed limit**: a sensor moving faster than the configured bound

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::engine::state::{SimState, Vec3};
use crate::error::{SimError, SimResult};

/// Jidoka guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JidokaConfig {
    /// NaN/Inf detection enabled.
    #[serde(default = "default_true")]
    pub check_finite: bool,
    /// Maximum allowed sensor speed, if any.
    #[serde(default)]
    pub max_speed: Option<f64>,
}

const fn default_true() -> bool {
    true
}

impl Default for JidokaConfig {
    fn default() -> Self {
        Self {
            check_finite: true,
            max_speed: None,
        }
    }
}

/// Jidoka guard for autonomous anomaly detection.
///
/// # Example
///
/// ```rust
/// use spheresim::engine::jidoka::{JidokaConfig, JidokaGuard};
/// use spheresim::engine::state::SimState;
///
/// let guard = JidokaGuard::new(JidokaConfig::default());
/// assert!(guard.check(&SimState::default()).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct JidokaGuard {
    /// Configuration.
    config: JidokaConfig,
}

impl JidokaGuard {
    /// Create a new Jidoka guard with given configuration.
    #[must_use]
    pub const fn new(config: JidokaConfig) -> Self {
        Self { config }
    }

    /// Create from simulation configuration.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.jidoka.clone())
    }

    /// Get current configuration.
    #[must_use]
    pub const fn config(&self) -> &JidokaConfig {
        &self.config
    }

    /// Check state for anomalies (Jidoka inspection).
    ///
    /// # Errors
    ///
    /// - `NonFiniteValue`: NaN or Inf found
    /// - `ConstraintViolation`: speed limit exceeded
    pub fn check(&self, state: &SimState) -> SimResult<()> {
        if self.config.check_finite {
            Self::check_finite(state)?;
        }
        if let Some(limit) = self.config.max_speed {
            Self::check_speed(state, limit)?;
        }
        Ok(())
    }

    fn check_finite(state: &SimState) -> SimResult<()> {
        let check = |kind: &str, id: &str, field: &str, v: Vec3| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(SimError::NonFiniteValue {
                    location: format!("{kind} '{id}'.{field}"),
                })
            }
        };

        for sensor in state.all_sensors() {
            check("sensor", sensor.id(), "position", sensor.position())?;
            check("sensor", sensor.id(), "velocity", sensor.velocity())?;
        }
        for sphere in state.spheres() {
            check("sphere", sphere.id(), "center", sphere.center())?;
            check("sphere", sphere.id(), "velocity", sphere.velocity())?;
        }
        Ok(())
    }

    fn check_speed(state: &SimState, limit: f64) -> SimResult<()> {
        for sensor in state.all_sensors() {
            let speed = sensor.velocity().magnitude();
            if speed > limit {
                return Err(SimError::ConstraintViolation {
                    name: format!("speed_limit[{}]", sensor.id()),
                    violation: speed - limit,
                    tolerance: limit,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::domains::sensor::Sensor;
    use crate::domains::sphere::SensorSphere;

    fn state_with_velocity(v: Vec3) -> SimState {
        let mut state = SimState::new();
        let mut sensor = Sensor::new("s", Vec3::zero(), Vec3::zero(), 1.0, 0.0).unwrap();
        sensor.set_velocity(v);
        state.add_sensor(sensor).unwrap();
        state
    }

    #[test]
    fn test_jidoka_passes_valid_state() {
        let guard = JidokaGuard::new(JidokaConfig::default());
        assert!(guard.check(&state_with_velocity(Vec3::unit_x())).is_ok());
    }

    #[test]
    fn test_jidoka_detects_nan() {
        let guard = JidokaGuard::new(JidokaConfig::default());
        let err = guard
            .check(&state_with_velocity(Vec3::new(f64::NAN, 0.0, 0.0)))
            .unwrap_err();

        assert!(err.is_jidoka_violation());
        match err {
            SimError::NonFiniteValue { location } => {
                assert_eq!(location, "sensor 's'.velocity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_jidoka_reports_sphere_location() {
        let guard = JidokaGuard::new(JidokaConfig::default());
        let mut state = SimState::new();
        state
            .add_sphere(
                SensorSphere::new("box", Vec3::zero(), 1.0)
                    .unwrap()
                    .with_velocity(Vec3::new(0.0, f64::INFINITY, 0.0)),
            )
            .unwrap();

        match guard.check(&state).unwrap_err() {
            SimError::NonFiniteValue { location } => {
                assert_eq!(location, "sphere 'box'.velocity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_jidoka_finite_check_can_be_disabled() {
        let guard = JidokaGuard::new(JidokaConfig {
            check_finite: false,
            max_speed: None,
        });
        assert!(guard
            .check(&state_with_velocity(Vec3::new(f64::INFINITY, 0.0, 0.0)))
            .is_ok());
    }

    #[test]
    fn test_jidoka_speed_limit() {
        let guard = JidokaGuard::new(JidokaConfig {
            check_finite: true,
            max_speed: Some(2.0),
        });

        assert!(guard.check(&state_with_velocity(Vec3::new(1.5, 0.0, 0.0))).is_ok());

        let err = guard
            .check(&state_with_velocity(Vec3::new(3.0, 0.0, 0.0)))
            .unwrap_err();
        match err {
            SimError::ConstraintViolation {
                violation, tolerance, ..
            } => {
                assert!((violation - 1.0).abs() < 1e-12);
                assert!((tolerance - 2.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_jidoka_config_yaml_defaults() {
        let config: JidokaConfig = serde_yaml::from_str("max_speed: 10.0").unwrap();
        assert!(config.check_finite);
        assert_eq!(config.max_speed, Some(10.0));
    }
}
