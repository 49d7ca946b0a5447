//! Configuration system with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs
//! - Unknown keys rejected at parse time
//! - Schema validation via `validator`
//! - Runtime semantic validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::constants::{
    DEFAULT_RANDOMIZE_RANGE, DEFAULT_TIME_STEP, GRAVITATIONAL_CONSTANT,
};
use crate::engine::jidoka::JidokaConfig;
use crate::error::{SimError, SimResult};

/// Top-level simulation configuration.
///
/// Loaded from YAML files with full schema validation.
///
/// ```yaml
/// seed: 7
/// delta_time: 0.01
/// resolver: center-of-mass
/// brute_force:
///   step_fraction: 0.001
/// jidoka:
///   max_speed: 100.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Master seed for every random draw.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Tick length in seconds.
    #[validate(range(min = 0.000_001, max = 1.0))]
    #[serde(default = "default_delta_time")]
    pub delta_time: f64,

    /// Collision resolver.
    #[serde(default)]
    pub resolver: ResolverKind,

    /// Gravitational constant used between spheres.
    #[serde(default = "default_gravitational_constant")]
    pub gravitational_constant: f64,

    /// Half-width of the cube `randomize` draws positions from.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_randomize_range")]
    pub randomize_range: f64,

    /// Brute-force resolver tuning.
    #[validate(nested)]
    #[serde(default)]
    pub brute_force: BruteForceConfig,

    /// Jidoka (stop-on-error) configuration.
    #[serde(default)]
    pub jidoka: JidokaConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

const fn default_seed() -> u64 {
    42
}

const fn default_delta_time() -> f64 {
    DEFAULT_TIME_STEP
}

const fn default_gravitational_constant() -> f64 {
    GRAVITATIONAL_CONSTANT
}

const fn default_randomize_range() -> f64 {
    DEFAULT_RANDOMIZE_RANGE
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Run schema and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for schema violations and `Config` for
    /// semantic ones.
    pub fn check(&self) -> SimResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        let g = self.gravitational_constant;
        if !(g >= 0.0 && g.is_finite()) {
            return Err(SimError::config(format!(
                "gravitational_constant must be non-negative and finite, got {g}"
            )));
        }

        if !self.randomize_range.is_finite() {
            return Err(SimError::config("randomize_range must be finite"));
        }

        let tol = self.brute_force.tolerance;
        if !(tol > 0.0 && tol.is_finite()) {
            return Err(SimError::config(format!(
                "brute_force.tolerance must be positive, got {tol}"
            )));
        }

        if let Some(limit) = self.jidoka.max_speed {
            if !(limit > 0.0) {
                return Err(SimError::config(format!(
                    "jidoka.max_speed must be positive, got {limit}"
                )));
            }
        }

        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            seed: default_seed(),
            delta_time: default_delta_time(),
            resolver: ResolverKind::default(),
            gravitational_constant: default_gravitational_constant(),
            randomize_range: default_randomize_range(),
            brute_force: BruteForceConfig::default(),
            jidoka: JidokaConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    seed: Option<u64>,
    delta_time: Option<f64>,
    resolver: Option<ResolverKind>,
    gravitational_constant: Option<f64>,
    randomize_range: Option<f64>,
    jidoka: Option<JidokaConfig>,
}

impl SimConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the tick length in seconds.
    #[must_use]
    pub const fn delta_time(mut self, dt: f64) -> Self {
        self.delta_time = Some(dt);
        self
    }

    /// Set the collision resolver.
    #[must_use]
    pub const fn resolver(mut self, kind: ResolverKind) -> Self {
        self.resolver = Some(kind);
        self
    }

    /// Set the gravitational constant.
    #[must_use]
    pub const fn gravitational_constant(mut self, g: f64) -> Self {
        self.gravitational_constant = Some(g);
        self
    }

    /// Set the randomize half-width.
    #[must_use]
    pub const fn randomize_range(mut self, range: f64) -> Self {
        self.randomize_range = Some(range);
        self
    }

    /// Set Jidoka configuration.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JidokaConfig doesn't impl Copy
    pub fn jidoka(mut self, config: JidokaConfig) -> Self {
        self.jidoka = Some(config);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(dt) = self.delta_time {
            config.delta_time = dt;
        }
        if let Some(kind) = self.resolver {
            config.resolver = kind;
        }
        if let Some(g) = self.gravitational_constant {
            config.gravitational_constant = g;
        }
        if let Some(range) = self.randomize_range {
            config.randomize_range = range;
        }
        if let Some(jidoka) = self.jidoka {
            config.jidoka = jidoka;
        }

        config
    }
}

/// Collision resolver selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverKind {
    /// Closed-form impulse exchange.
    #[default]
    Impulse,
    /// Center-of-mass frame reflection.
    CenterOfMass,
    /// Iterative relaxation (benchmarking only).
    BruteForce,
    /// Penalty-force placeholder (currently impulse).
    PenaltyForce,
}

impl ResolverKind {
    /// Every resolver, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Impulse,
        Self::CenterOfMass,
        Self::BruteForce,
        Self::PenaltyForce,
    ];
}

/// Brute-force resolver tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BruteForceConfig {
    /// Relaxation step α.
    #[validate(range(min = 0.000_001, max = 1.0))]
    #[serde(default = "default_step_fraction")]
    pub step_fraction: f64,
    /// Iteration cap.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Convergence tolerance.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

const fn default_step_fraction() -> f64 {
    0.001
}

const fn default_max_iterations() -> u32 {
    100_000
}

const fn default_tolerance() -> f64 {
    1e-4
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            step_fraction: default_step_fraction(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}
