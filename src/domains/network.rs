//! Network of sensor spheres with mutual gravity.

use serde::{Deserialize, Serialize};

use crate::constants::GRAVITATIONAL_CONSTANT;
use crate::domains::sphere::SensorSphere;
use crate::error::{SimError, SimResult};

/// Ordered collection of spheres interacting through gravity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkRecord")]
pub struct SensorSphereNetwork {
    spheres: Vec<SensorSphere>,
    gravitational_constant: f64,
}

#[derive(Deserialize)]
struct NetworkRecord {
    #[serde(default)]
    spheres: Vec<SensorSphere>,
    #[serde(default = "default_gravitational_constant")]
    gravitational_constant: f64,
}

const fn default_gravitational_constant() -> f64 {
    GRAVITATIONAL_CONSTANT
}

impl TryFrom<NetworkRecord> for SensorSphereNetwork {
    type Error = SimError;

    fn try_from(record: NetworkRecord) -> SimResult<Self> {
        let mut network = Self::with_gravitational_constant(record.gravitational_constant);
        for sphere in record.spheres {
            network.add_sphere(sphere)?;
        }
        Ok(network)
    }
}

impl Default for SensorSphereNetwork {
    fn default() -> Self {
        Self {
            spheres: Vec::new(),
            gravitational_constant: GRAVITATIONAL_CONSTANT,
        }
    }
}

impl SensorSphereNetwork {
    /// Create an empty network with the SI gravitational constant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty network with a custom gravitational constant.
    #[must_use]
    pub fn with_gravitational_constant(g: f64) -> Self {
        Self {
            spheres: Vec::new(),
            gravitational_constant: g,
        }
    }

    /// Get the gravitational constant.
    #[must_use]
    pub const fn gravitational_constant(&self) -> f64 {
        self.gravitational_constant
    }

    /// Set the gravitational constant.
    pub fn set_gravitational_constant(&mut self, g: f64) {
        self.gravitational_constant = g;
    }

    /// Add a sphere.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a sphere with the same id exists.
    pub fn add_sphere(&mut self, sphere: SensorSphere) -> SimResult<()> {
        if self.sphere(sphere.id()).is_some() {
            return Err(SimError::invalid_argument(format!(
                "sphere id '{}' already present",
                sphere.id()
            )));
        }
        self.spheres.push(sphere);
        Ok(())
    }

    /// Remove a sphere by id.
    pub fn remove_sphere(&mut self, id: &str) -> Option<SensorSphere> {
        let index = self.spheres.iter().position(|s| s.id() == id)?;
        Some(self.spheres.remove(index))
    }

    /// Look up a sphere by id.
    #[must_use]
    pub fn sphere(&self, id: &str) -> Option<&SensorSphere> {
        self.spheres.iter().find(|s| s.id() == id)
    }

    /// Look up a mutable sphere by id.
    pub fn sphere_mut(&mut self, id: &str) -> Option<&mut SensorSphere> {
        self.spheres.iter_mut().find(|s| s.id() == id)
    }

    /// Get spheres.
    #[must_use]
    pub fn spheres(&self) -> &[SensorSphere] {
        &self.spheres
    }

    /// Get mutable spheres.
    #[must_use]
    pub fn spheres_mut(&mut self) -> &mut [SensorSphere] {
        &mut self.spheres
    }

    /// Iterate spheres in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, SensorSphere> {
        self.spheres.iter()
    }

    /// Number of spheres.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Whether the network has no spheres.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Sum of sphere masses.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.spheres.iter().map(SensorSphere::mass).sum()
    }

    /// Accumulate mutual gravitational acceleration on every sphere.
    ///
    /// All accelerations are computed from the same snapshot of centers
    /// before any is applied. Returns the number of zero-separation pairs
    /// skipped (each unordered pair counted from both sides).
    pub fn calculate_interactions(&mut self) -> usize {
        let g = self.gravitational_constant;
        let (accelerations, skipped): (Vec<_>, Vec<_>) = self
            .spheres
            .iter()
            .map(|sphere| sphere.gravitational_acceleration_from(&self.spheres, g))
            .unzip();

        for (sphere, a) in self.spheres.iter_mut().zip(accelerations) {
            sphere.accelerate(a);
        }

        let skipped: usize = skipped.into_iter().sum();
        if skipped > 0 {
            tracing::debug!(skipped, "skipped coincident sphere pairs");
        }
        skipped
    }

    /// Advance every sphere.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `dt` is not positive.
    pub fn update(&mut self, dt: f64) -> SimResult<()> {
        for sphere in &mut self.spheres {
            sphere.update(dt)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SensorSphereNetwork {
    type Item = &'a SensorSphere;
    type IntoIter = std::slice::Iter<'a, SensorSphere>;

    fn into_iter(self) -> Self::IntoIter {
        self.spheres.iter()
    }
}
