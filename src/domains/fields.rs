//! Pairwise force fields over sensors.
//!
//! Stateless calculators:
//! - Gravity: Newtonian attraction `F = G·m₁·m₂/r²`
//! - Electric: Coulomb interaction `F = k·q₁·q₂/r²` (like charges repel)
//! - Magnetic: field of a moving point charge and the Lorentz force on another
//!
//! Every calculator fails with `DegenerateGeometry` at zero separation; the
//! pairwise driver skips those pairs and keeps going.

use std::f64::consts::PI;

use crate::constants::{COULOMB_CONSTANT, GRAVITATIONAL_CONSTANT, VACUUM_PERMEABILITY};
use crate::domains::sensor::Sensor;
use crate::engine::state::Vec3;
use crate::error::{SimError, SimResult};

/// Force field trait for pairwise interactions.
pub trait ForceField {
    /// Force exerted on `target` by `source`.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the two sensors coincide.
    fn force(&self, target: &Sensor, source: &Sensor) -> SimResult<Vec3>;

    /// Potential energy of the pair.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the two sensors coincide.
    fn potential_energy(&self, a: &Sensor, b: &Sensor) -> SimResult<f64>;
}

/// Unit direction and distance from `from` to `to`.
fn separation(from: Vec3, to: Vec3) -> SimResult<(Vec3, f64)> {
    let delta = to - from;
    let distance = delta.magnitude();
    let direction = delta
        .normalize()
        .map_err(|_| SimError::degenerate(format!("zero separation at {from}")))?;
    Ok((direction, distance))
}

/// Newtonian force on a body at `position` exerted by a body at `source_position`.
///
/// # Errors
///
/// Returns `DegenerateGeometry` at zero separation.
pub fn gravitational_force(
    g: f64,
    mass: f64,
    position: Vec3,
    source_mass: f64,
    source_position: Vec3,
) -> SimResult<Vec3> {
    let (direction, r) = separation(position, source_position)?;
    Ok(direction * (g * mass * source_mass / (r * r)))
}

/// Gravitational acceleration at `position` due to a source mass.
///
/// Equal to `gravitational_force / mass` but defined for massless bodies too.
///
/// # Errors
///
/// Returns `DegenerateGeometry` at zero separation.
pub fn gravitational_acceleration(
    g: f64,
    position: Vec3,
    source_mass: f64,
    source_position: Vec3,
) -> SimResult<Vec3> {
    let (direction, r) = separation(position, source_position)?;
    Ok(direction * (g * source_mass / (r * r)))
}

/// Newtonian gravity between sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityField {
    /// Gravitational constant.
    pub g: f64,
}

impl Default for GravityField {
    fn default() -> Self {
        Self {
            g: GRAVITATIONAL_CONSTANT,
        }
    }
}

impl GravityField {
    /// Create a gravity field with a custom constant (scaled universes).
    #[must_use]
    pub const fn new(g: f64) -> Self {
        Self { g }
    }
}

impl ForceField for GravityField {
    fn force(&self, target: &Sensor, source: &Sensor) -> SimResult<Vec3> {
        gravitational_force(
            self.g,
            target.mass(),
            target.position(),
            source.mass(),
            source.position(),
        )
    }

    fn potential_energy(&self, a: &Sensor, b: &Sensor) -> SimResult<f64> {
        let (_, r) = separation(a.position(), b.position())?;
        // PE = -G*m1*m2/r
        Ok(-self.g * a.mass() * b.mass() / r)
    }
}

/// Coulomb interaction between charged sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectricField {
    /// Coulomb constant.
    pub k: f64,
}

impl Default for ElectricField {
    fn default() -> Self {
        Self {
            k: COULOMB_CONSTANT,
        }
    }
}

impl ElectricField {
    /// Create an electric field with a custom constant.
    #[must_use]
    pub const fn new(k: f64) -> Self {
        Self { k }
    }

    /// Electric field at `point` due to `source`: `E = k·q/r² · r̂`.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if `point` coincides with the source.
    pub fn field_at(&self, point: Vec3, source: &Sensor) -> SimResult<Vec3> {
        let (direction, r) = separation(source.position(), point)?;
        Ok(direction * (self.k * source.charge() / (r * r)))
    }
}

impl ForceField for ElectricField {
    fn force(&self, target: &Sensor, source: &Sensor) -> SimResult<Vec3> {
        Ok(self.field_at(target.position(), source)? * target.charge())
    }

    fn potential_energy(&self, a: &Sensor, b: &Sensor) -> SimResult<f64> {
        let (_, r) = separation(a.position(), b.position())?;
        Ok(self.k * a.charge() * b.charge() / r)
    }
}

/// Magnetic interaction between moving charged sensors.
///
/// Uses the low-velocity field of a moving point charge:
///
/// ```text
/// B = μ₀/(4π) · q·(v × r̂)/r²
/// F = q'·(v' × B)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticField {
    /// Vacuum permeability.
    pub mu0: f64,
}

impl Default for MagneticField {
    fn default() -> Self {
        Self {
            mu0: VACUUM_PERMEABILITY,
        }
    }
}

impl MagneticField {
    /// Create a magnetic field with a custom permeability.
    #[must_use]
    pub const fn new(mu0: f64) -> Self {
        Self { mu0 }
    }

    /// Magnetic field at `point` due to a moving `source` charge.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if `point` coincides with the source.
    pub fn field_at(&self, point: Vec3, source: &Sensor) -> SimResult<Vec3> {
        let (direction, r) = separation(source.position(), point)?;
        let scale = self.mu0 / (4.0 * PI) * source.charge() / (r * r);
        Ok(source.velocity().cross(&direction) * scale)
    }

    /// Lorentz force `q·(v × B)` on a sensor in field `b`.
    #[must_use]
    pub fn lorentz_force(sensor: &Sensor, b: Vec3) -> Vec3 {
        sensor.velocity().cross(&b) * sensor.charge()
    }
}

impl ForceField for MagneticField {
    fn force(&self, target: &Sensor, source: &Sensor) -> SimResult<Vec3> {
        let b = self.field_at(target.position(), source)?;
        Ok(Self::lorentz_force(target, b))
    }

    /// Magnetic forces do no work, so the pair has no potential energy.
    fn potential_energy(&self, a: &Sensor, b: &Sensor) -> SimResult<f64> {
        separation(a.position(), b.position())?;
        Ok(0.0)
    }
}

/// Apply a field between every unordered pair of `sensors`.
///
/// Forces for all pairs are computed against the same positions, then
/// accumulated. Coincident pairs are skipped.
///
/// Returns the number of skipped pairs.
///
/// # Errors
///
/// Propagates any error other than `DegenerateGeometry`.
pub fn apply_pairwise<F: ForceField + ?Sized>(field: &F, sensors: &mut [Sensor]) -> SimResult<usize> {
    let n = sensors.len();
    let mut forces = vec![Vec3::zero(); n];
    let mut skipped = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            let pair = field
                .force(&sensors[i], &sensors[j])
                .and_then(|on_i| Ok((on_i, field.force(&sensors[j], &sensors[i])?)));
            match pair {
                Ok((on_i, on_j)) => {
                    forces[i] += on_i;
                    forces[j] += on_j;
                }
                Err(e) if e.is_degenerate_geometry() => skipped += 1,
                Err(e) => return Err(e),
            }
        }
    }

    for (sensor, force) in sensors.iter_mut().zip(forces) {
        sensor.apply_force(force);
    }

    Ok(skipped)
}
