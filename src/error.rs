//! Error types for spheresim.
//!
//! All fallible operations return `Result<T, SimError>` instead of panicking.
//!
//! # Taxonomy
//!
//! 1. **Validation**: bad arguments rejected at the violating call
//! 2. **Degenerate geometry**: zero-length normals, coincident bodies
//! 3. **State**: operation illegal for the current entity state
//! 4. **Jidoka**: post-tick anomaly detection (NaN/Inf, constraints)
//! 5. **Configuration**: YAML parsing and schema validation

use thiserror::Error;

/// Result type alias for spheresim operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all spheresim operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Validation =====
    /// Argument rejected at the call site (non-positive dt or mass, duplicate id, ...).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    // ===== Geometry =====
    /// Geometry without a defined direction (zero-length vector, zero separation).
    #[error("Degenerate geometry: {context}")]
    DegenerateGeometry {
        /// Where the degeneracy was hit.
        context: String,
    },

    // ===== State =====
    /// Operation not allowed in the current state (e.g. impulse on a massless body).
    #[error("State error: {message}")]
    StateError {
        /// Description of the illegal state.
        message: String,
    },

    // ===== Jidoka Violations =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Constraint violation detected.
    #[error("Jidoka: constraint '{name}' violated by {violation:.6e} (tolerance: {tolerance:.6e})")]
    ConstraintViolation {
        /// Name of the violated constraint.
        name: String,
        /// Amount of violation.
        violation: f64,
        /// Configured tolerance.
        tolerance: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Create an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a degenerate-geometry error.
    #[must_use]
    pub fn degenerate(context: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            context: context.into(),
        }
    }

    /// Create a state error.
    #[must_use]
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error is a validation failure at the call site.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Check if this error is a recoverable geometry degeneracy.
    ///
    /// Pairwise loops skip the offending pair on these and keep going.
    #[must_use]
    pub const fn is_degenerate_geometry(&self) -> bool {
        matches!(self, Self::DegenerateGeometry { .. })
    }

    /// Check if this error is a Jidoka violation (requires immediate stop).
    #[must_use]
    pub const fn is_jidoka_violation(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteValue { .. } | Self::ConstraintViolation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(SimError::invalid_argument("dt").is_validation());
        assert!(!SimError::invalid_argument("dt").is_degenerate_geometry());

        assert!(SimError::degenerate("normalize").is_degenerate_geometry());
        assert!(!SimError::degenerate("normalize").is_validation());

        assert!(!SimError::state("massless").is_validation());
        assert!(!SimError::state("massless").is_jidoka_violation());
    }

    #[test]
    fn test_jidoka_violation_detection() {
        let non_finite = SimError::NonFiniteValue {
            location: "sensors[0].position.x".to_string(),
        };
        assert!(non_finite.is_jidoka_violation());

        let constraint = SimError::ConstraintViolation {
            name: "speed_limit".to_string(),
            violation: 3.0,
            tolerance: 0.0,
        };
        assert!(constraint.is_jidoka_violation());

        assert!(!SimError::config("invalid").is_jidoka_violation());
    }

    #[test]
    fn test_error_display() {
        let msg = SimError::invalid_argument("delta_time must be positive").to_string();
        assert!(msg.contains("Invalid argument"));
        assert!(msg.contains("delta_time"));

        let msg = SimError::degenerate("zero-length vector").to_string();
        assert!(msg.contains("Degenerate geometry"));

        let msg = SimError::state("sphere has no mass").to_string();
        assert!(msg.contains("State error"));

        let msg = SimError::config("bad").to_string();
        assert!(msg.contains("Configuration error"));
    }

    #[test]
    fn test_error_constraint_violation_display() {
        let err = SimError::ConstraintViolation {
            name: "speed_limit".to_string(),
            violation: 5.0,
            tolerance: 0.001,
        };
        let msg = err.to_string();
        assert!(msg.contains("speed_limit"));
        assert!(msg.contains("violated"));
    }

    #[test]
    fn test_error_io_from() {
        let err: SimError = std::io::Error::other("file not found").into();
        assert!(err.to_string().contains("I/O error"));
    }
}
