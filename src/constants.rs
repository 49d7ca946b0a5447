//! Physical and numeric defaults.
//!
//! Values are SI unless noted. Simulation scenes usually run far from SI
//! magnitudes, so the engine reads the gravitational constant from here and
//! callers wanting a scaled universe build their fields with their own value.

use std::f64::consts::PI;

/// Newtonian gravitational constant (m³/(kg·s²)).
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;

/// Coulomb constant k = 1/(4πε₀) (N·m²/C²).
pub const COULOMB_CONSTANT: f64 = 8.987_551_792_3e9;

/// Vacuum permeability μ₀ (N/A²).
pub const VACUUM_PERMEABILITY: f64 = 4.0 * PI * 1e-7;

/// Stefan–Boltzmann constant σ (W/(m²·K⁴)).
pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;

/// Default sensor mass (kg).
pub const DEFAULT_MASS: f64 = 1.0;

/// Default sensor charge (C).
pub const DEFAULT_CHARGE: f64 = 0.0;

/// Default collision radius of a sensor (m).
pub const DEFAULT_RADIUS: f64 = 0.5;

/// Default emissivity for the radiation accumulator.
pub const DEFAULT_EMISSIVITY: f64 = 0.9;

/// Density used to estimate a sensor's surface area from its mass (kg/m³).
pub const ASSUMED_DENSITY: f64 = 1000.0;

/// Smallest accepted tick length (s).
pub const MIN_TIME_STEP: f64 = 1e-6;

/// Largest accepted tick length (s).
pub const MAX_TIME_STEP: f64 = 1.0;

/// Default tick length, ~60 Hz (s).
pub const DEFAULT_TIME_STEP: f64 = 0.016;

/// Charge mapped to the coldest color.
pub const MIN_CHARGE: f64 = -1.0;

/// Charge mapped to the hottest color.
pub const MAX_CHARGE: f64 = 1.0;

/// Half-width of the cube `randomize` draws positions from (m).
pub const DEFAULT_RANDOMIZE_RANGE: f64 = 10.0;

/// Half-width of the cube `randomize` draws velocities from (m/s).
pub const DEFAULT_RANDOMIZE_SPEED: f64 = 1.0;
