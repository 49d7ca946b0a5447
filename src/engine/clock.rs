//! Simulation clock management.
//!
//! Handles time progression with support for:
//! - Fixed timestep mode with a mutable tick length
//! - Time reversal (global time runs backward, tick magnitude unchanged)

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TIME_STEP;
use crate::error::{SimError, SimResult};

/// Simulation clock.
///
/// Global time is signed: while reversed, each tick subtracts `delta_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Current simulation time (s).
    global_time: f64,
    /// Tick length (s). Validated when a tick is taken, not when set.
    delta_time: f64,
    /// Whether time currently runs backward.
    reversed: bool,
    /// Number of ticks taken since the last reset.
    step_count: u64,
}

impl SimClock {
    /// Create a new clock with the given tick length in seconds.
    #[must_use]
    pub const fn new(delta_time: f64) -> Self {
        Self {
            global_time: 0.0,
            delta_time,
            reversed: false,
            step_count: 0,
        }
    }

    /// Get current simulation time.
    #[must_use]
    pub const fn global_time(&self) -> f64 {
        self.global_time
    }

    /// Get tick length.
    #[must_use]
    pub const fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Set tick length.
    #[allow(clippy::missing_const_for_fn)] // Mutable const not stable
    pub fn set_delta_time(&mut self, delta_time: f64) {
        self.delta_time = delta_time;
    }

    /// Whether time runs backward.
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Get number of ticks taken.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Flip the direction of time. Returns the new reversed flag.
    #[allow(clippy::missing_const_for_fn)] // Mutable const not stable
    pub fn toggle_reversal(&mut self) -> bool {
        self.reversed = !self.reversed;
        self.reversed
    }

    /// Check that `delta_time` is usable for a tick.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `delta_time` is not positive and finite.
    pub fn check_delta_time(&self) -> SimResult<()> {
        let dt = self.delta_time;
        if dt > 0.0 && dt.is_finite() {
            Ok(())
        } else {
            Err(SimError::invalid_argument(format!(
                "delta_time must be positive and finite, got {dt}"
            )))
        }
    }

    /// Advance the clock by one tick.
    ///
    /// Returns the tick magnitude `|delta_time|` to integrate with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `delta_time` is not positive and finite;
    /// the clock is left untouched.
    pub fn tick(&mut self) -> SimResult<f64> {
        self.check_delta_time()?;
        let dt = self.delta_time;

        if self.reversed {
            self.global_time -= dt;
        } else {
            self.global_time += dt;
        }
        self.step_count += 1;
        Ok(dt.abs())
    }

    /// Reset clock to initial state.
    ///
    /// Keeps `delta_time`; clears time, step count and reversal.
    #[allow(clippy::missing_const_for_fn)] // Mutable const not stable
    pub fn reset(&mut self) {
        self.global_time = 0.0;
        self.step_count = 0;
        self.reversed = false;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}
