//! Point-mass sensor entity.
//!
//! A sensor carries:
//! - Translational kinematics (semi-implicit Euler)
//! - Oscillatory attributes: per-axis vibration, rotation, wobble
//! - A black-body radiation accumulator (Stefan–Boltzmann)
//! - A display color derived from its charge
//!
//! # Integration Order
//!
//! ```text
//! v += a·dt
//! x += v·dt
//! a  = 0
//! x += A ⊙ sin(2π·f·dt + φ)          (vibration, per axis)
//! θ  = wrap(θ + ω·dt)                 (rotation)
//! θ  = wrap(θ + Aw·sin(2π·fw·dt))     (wobble)
//! E += ε·σ·A(m)·T⁴·dt                 (radiation, T > 0 and ε > 0 only)
//! ```
//!
//! The vibration term does not accumulate phase across ticks: the offset is a
//! function of `dt` only.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::constants::{
    ASSUMED_DENSITY, DEFAULT_EMISSIVITY, DEFAULT_RADIUS, MAX_CHARGE, MIN_CHARGE,
    STEFAN_BOLTZMANN,
};
use crate::engine::state::Vec3;
use crate::error::{SimError, SimResult};

/// Operational state shared by sensors and spheres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationalState {
    /// Participating in collisions.
    #[default]
    Active,
    /// Switched off.
    Inactive,
    /// Faulted.
    Malfunction,
    /// Powered but idle.
    Idle,
    /// Under maintenance.
    Maintenance,
    /// Changing between states.
    Transition,
}

/// 8-bit RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Create a color from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert a fully saturated, full-value hue (degrees) to RGB.
    #[must_use]
    pub fn from_hue(hue_degrees: f64) -> Self {
        let h = hue_degrees.rem_euclid(360.0) / 60.0;
        let x = 1.0 - ((h % 2.0) - 1.0).abs();
        let (r, g, b) = match h {
            h if h < 1.0 => (1.0, x, 0.0),
            h if h < 2.0 => (x, 1.0, 0.0),
            h if h < 3.0 => (0.0, 1.0, x),
            h if h < 4.0 => (0.0, x, 1.0),
            h if h < 5.0 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }
}

fn channel(c: f64) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Map a charge to a display color.
///
/// Continuous hue interpolation: the charge is clamped to
/// `[MIN_CHARGE, MAX_CHARGE]`, normalized to `t ∈ [0, 1]` and mapped to
/// hue `240°·(1 − t)`. Most negative is blue, neutral is green, most
/// positive is red. Non-finite charges map to neutral.
#[must_use]
pub fn charge_to_color(charge: f64) -> Color {
    let charge = if charge.is_finite() { charge } else { 0.0 };
    let t = (charge.clamp(MIN_CHARGE, MAX_CHARGE) - MIN_CHARGE) / (MAX_CHARGE - MIN_CHARGE);
    Color::from_hue(240.0 * (1.0 - t))
}

/// Per-axis harmonic vibration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vibration {
    /// Amplitude per axis (m).
    pub amplitude: Vec3,
    /// Frequency per axis (Hz).
    pub frequency: Vec3,
    /// Phase per axis (rad).
    pub phase: Vec3,
}

impl Vibration {
    /// Positional offset for a tick of length `dt`.
    #[must_use]
    pub fn offset(&self, dt: f64) -> Vec3 {
        let axis = |a: f64, f: f64, p: f64| a * (TAU * f * dt + p).sin();
        Vec3::new(
            axis(self.amplitude.x, self.frequency.x, self.phase.x),
            axis(self.amplitude.y, self.frequency.y, self.phase.y),
            axis(self.amplitude.z, self.frequency.z, self.phase.z),
        )
    }
}

/// Spin about an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Unit rotation axis.
    pub axis: Vec3,
    /// Current angle in `[0, 2π)`.
    pub angle: f64,
    /// Angular speed (rad/s).
    pub speed: f64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            axis: Vec3::unit_z(),
            angle: 0.0,
            speed: 0.0,
        }
    }
}

/// Sinusoidal perturbation of the rotation angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wobble {
    /// Amplitude (rad).
    pub amplitude: f64,
    /// Frequency (Hz).
    pub frequency: f64,
}

/// Wrap an angle into `[0, 2π)`.
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

pub(crate) fn validate_dt(dt: f64) -> SimResult<()> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(SimError::invalid_argument(format!(
            "time step must be positive and finite, got {dt}"
        )))
    }
}

/// Point-mass sensor.
///
/// Deserialization goes through [`Sensor::new`], so a decoded sensor obeys
/// the same invariants as a constructed one. `color` is re-derived from the
/// charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SensorRecord")]
pub struct Sensor {
    id: String,
    position: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    mass: f64,
    charge: f64,
    state: OperationalState,
    radius: f64,
    vibration: Vibration,
    rotation: Rotation,
    wobble: Wobble,
    temperature: f64,
    emissivity: f64,
    radiated_energy: f64,
    color: Color,
}

/// Serialized form of a [`Sensor`].
#[derive(Deserialize)]
struct SensorRecord {
    id: String,
    position: Vec3,
    velocity: Vec3,
    #[serde(default)]
    acceleration: Vec3,
    mass: f64,
    #[serde(default)]
    charge: f64,
    #[serde(default)]
    state: OperationalState,
    #[serde(default = "default_radius")]
    radius: f64,
    #[serde(default)]
    vibration: Vibration,
    #[serde(default)]
    rotation: Rotation,
    #[serde(default)]
    wobble: Wobble,
    #[serde(default)]
    temperature: f64,
    #[serde(default = "default_emissivity")]
    emissivity: f64,
    #[serde(default)]
    radiated_energy: f64,
}

const fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

const fn default_emissivity() -> f64 {
    DEFAULT_EMISSIVITY
}

impl TryFrom<SensorRecord> for Sensor {
    type Error = SimError;

    fn try_from(record: SensorRecord) -> SimResult<Self> {
        let mut sensor = Self::new(
            record.id,
            record.position,
            record.velocity,
            record.mass,
            record.charge,
        )?
        .with_radius(record.radius)?
        .with_state(record.state)
        .with_radiation(record.temperature, record.emissivity);

        if !record.acceleration.is_finite() {
            return Err(SimError::invalid_argument(format!(
                "sensor '{}' acceleration must be finite",
                sensor.id
            )));
        }
        if !(record.radiated_energy >= 0.0 && record.radiated_energy.is_finite()) {
            return Err(SimError::invalid_argument(format!(
                "sensor '{}' radiated energy must be non-negative, got {}",
                sensor.id, record.radiated_energy
            )));
        }

        sensor.acceleration = record.acceleration;
        sensor.vibration = record.vibration;
        sensor.rotation = record.rotation;
        sensor.wobble = record.wobble;
        sensor.radiated_energy = record.radiated_energy;
        Ok(sensor)
    }
}

impl Sensor {
    /// Create a new sensor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the id is empty, the mass is not
    /// positive, or any input is non-finite.
    pub fn new(
        id: impl Into<String>,
        position: Vec3,
        velocity: Vec3,
        mass: f64,
        charge: f64,
    ) -> SimResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(SimError::invalid_argument("sensor id must not be empty"));
        }
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(SimError::invalid_argument(format!(
                "sensor '{id}' mass must be positive and finite, got {mass}"
            )));
        }
        if !charge.is_finite() || !position.is_finite() || !velocity.is_finite() {
            return Err(SimError::invalid_argument(format!(
                "sensor '{id}' has non-finite initial state"
            )));
        }

        Ok(Self {
            id,
            position,
            velocity,
            acceleration: Vec3::zero(),
            mass,
            charge,
            state: OperationalState::Active,
            radius: DEFAULT_RADIUS,
            vibration: Vibration::default(),
            rotation: Rotation::default(),
            wobble: Wobble::default(),
            temperature: 0.0,
            emissivity: DEFAULT_EMISSIVITY,
            radiated_energy: 0.0,
            color: charge_to_color(charge),
        })
    }

    /// Set the collision radius.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the radius is negative or non-finite.
    pub fn with_radius(mut self, radius: f64) -> SimResult<Self> {
        if !(radius >= 0.0 && radius.is_finite()) {
            return Err(SimError::invalid_argument(format!(
                "sensor '{}' radius must be non-negative, got {radius}",
                self.id
            )));
        }
        self.radius = radius;
        Ok(self)
    }

    /// Set the operational state.
    #[must_use]
    pub fn with_state(mut self, state: OperationalState) -> Self {
        self.state = state;
        self
    }

    /// Set temperature (K) and emissivity.
    #[must_use]
    pub fn with_radiation(mut self, temperature: f64, emissivity: f64) -> Self {
        self.temperature = temperature;
        self.emissivity = emissivity;
        self
    }

    /// Identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Accumulated acceleration for the current tick.
    #[must_use]
    pub const fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Mass (always positive).
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Charge.
    #[must_use]
    pub const fn charge(&self) -> f64 {
        self.charge
    }

    /// Operational state.
    #[must_use]
    pub const fn state(&self) -> OperationalState {
        self.state
    }

    /// Collision radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Display color derived from charge.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Vibration parameters.
    #[must_use]
    pub const fn vibration(&self) -> &Vibration {
        &self.vibration
    }

    /// Rotation parameters.
    #[must_use]
    pub const fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Wobble parameters.
    #[must_use]
    pub const fn wobble(&self) -> &Wobble {
        &self.wobble
    }

    /// Temperature (K).
    #[must_use]
    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Emissivity.
    #[must_use]
    pub const fn emissivity(&self) -> f64 {
        self.emissivity
    }

    /// Total radiated energy (J).
    #[must_use]
    pub const fn radiated_energy(&self) -> f64 {
        self.radiated_energy
    }

    /// Set position.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set velocity.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Set charge and recompute the color.
    pub fn set_charge(&mut self, charge: f64) {
        self.charge = charge;
        self.color = charge_to_color(charge);
    }

    /// Set operational state.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_state(&mut self, state: OperationalState) {
        self.state = state;
    }

    /// Set temperature (K).
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    /// Set per-axis vibration.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_vibration(&mut self, vibration: Vibration) {
        self.vibration = vibration;
    }

    /// Set rotation axis and angular speed.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the axis is the zero vector.
    pub fn set_rotation(&mut self, axis: Vec3, speed: f64) -> SimResult<()> {
        self.rotation.axis = axis.normalize()?;
        self.rotation.speed = speed;
        Ok(())
    }

    /// Set wobble amplitude and frequency.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_wobble(&mut self, amplitude: f64, frequency: f64) {
        self.wobble = Wobble {
            amplitude,
            frequency,
        };
    }

    /// Accumulate a force: `a += F / m`.
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force / self.mass;
    }

    /// Kinetic energy ½mv².
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Linear momentum mv.
    #[must_use]
    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }

    /// Surface area estimated from mass at uniform `ASSUMED_DENSITY`.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        let r = (3.0 * self.mass / (4.0 * PI * ASSUMED_DENSITY)).cbrt();
        4.0 * PI * r * r
    }

    /// Advance the sensor by one tick.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `dt` is not positive.
    pub fn update(&mut self, dt: f64) -> SimResult<()> {
        validate_dt(dt)?;

        // Semi-implicit Euler
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.acceleration = Vec3::zero();

        self.position += self.vibration.offset(dt);

        self.rotation.angle = wrap_angle(self.rotation.angle + self.rotation.speed * dt);
        self.rotation.angle = wrap_angle(
            self.rotation.angle + self.wobble.amplitude * (TAU * self.wobble.frequency * dt).sin(),
        );

        if self.temperature > 0.0 && self.emissivity > 0.0 {
            self.radiated_energy += self.emissivity
                * STEFAN_BOLTZMANN
                * self.surface_area()
                * self.temperature.powi(4)
                * dt;
        }

        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Falsification: radiated energy never decreases.
        #[test]
        fn prop_radiation_monotonic(
            temperature in -100.0f64..5000.0,
            emissivity in 0.0f64..1.0,
            mass in 0.01f64..100.0,
            steps in 1usize..20,
        ) {
            let sensor = Sensor::new("s", Vec3::zero(), Vec3::zero(), mass, 0.0);
            prop_assert!(sensor.is_ok());
            if let Ok(sensor) = sensor {
                let mut sensor = sensor.with_radiation(temperature, emissivity);
                let mut previous = sensor.radiated_energy();
                for _ in 0..steps {
                    prop_assert!(sensor.update(0.01).is_ok());
                    prop_assert!(sensor.radiated_energy() >= previous);
                    previous = sensor.radiated_energy();
                }
            }
        }

        /// Falsification: color mapping is deterministic.
        #[test]
        fn prop_color_deterministic(charge in -10.0f64..10.0) {
            prop_assert_eq!(charge_to_color(charge), charge_to_color(charge));
        }
    }
}
