//! Cooperative tick scheduler.
//!
//! The engine never spawns timers. A host loop polls the scheduler with its
//! own notion of "now" (seconds, monotonic) and receives the number of ticks
//! that fell due since the last poll. This keeps every tick synchronous and
//! makes scheduling fully deterministic under test.
//!
//! ```text
//!  start() ──► Arming ──poll──► Armed{deadline} ──poll──► due ticks
//!                 ▲                  │
//!  reset(true) ─► Restarting ─poll─┘ │ pause() / reset(false)
//!                                    ▼
//!                                  Idle
//! ```

use serde::{Deserialize, Serialize};

/// Upper bound on ticks reported by one poll.
///
/// A host that stalls for a long time resumes at the current time instead
/// of replaying an unbounded backlog.
pub const MAX_CATCH_UP_TICKS: u32 = 8;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduleState {
    /// Nothing scheduled.
    Idle,
    /// Started; the first deadline is armed at the next poll.
    Arming,
    /// Reset with restart; the engine resumes at the next poll.
    Restarting,
    /// Next tick due at `deadline`.
    Armed {
        /// Host time of the next tick.
        deadline: f64,
    },
}

/// Outcome of one [`TickScheduler::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollResult {
    /// Ticks due now.
    pub due: u32,
    /// A pending restart fired during this poll.
    pub restarted: bool,
}

/// Fixed-period cooperative scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickScheduler {
    /// Tick period in host seconds.
    period: f64,
    /// Current schedule.
    state: ScheduleState,
}

impl TickScheduler {
    /// Create an idle scheduler with the given period.
    #[must_use]
    pub const fn new(period: f64) -> Self {
        Self {
            period,
            state: ScheduleState::Idle,
        }
    }

    /// Get the period.
    #[must_use]
    pub const fn period(&self) -> f64 {
        self.period
    }

    /// Set the period; takes effect from the next armed deadline.
    #[allow(clippy::missing_const_for_fn)] // Mutable const not stable
    pub fn set_period(&mut self, period: f64) {
        self.period = period;
    }

    /// Get the current schedule state.
    #[must_use]
    pub const fn state(&self) -> ScheduleState {
        self.state
    }

    /// Whether a tick or restart is pending.
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        !matches!(self.state, ScheduleState::Idle)
    }

    /// Begin ticking. Idempotent while already armed.
    pub fn start(&mut self) {
        if matches!(self.state, ScheduleState::Idle | ScheduleState::Restarting) {
            self.state = ScheduleState::Arming;
        }
    }

    /// Cancel any pending tick or restart.
    pub fn pause(&mut self) {
        self.state = ScheduleState::Idle;
    }

    /// Cancel the pending tick; optionally arm a restart.
    pub fn reset(&mut self, restart: bool) {
        self.state = if restart {
            ScheduleState::Restarting
        } else {
            ScheduleState::Idle
        };
    }

    /// Report ticks due at host time `now` and re-arm.
    ///
    /// A non-positive or non-finite period never produces ticks.
    pub fn poll(&mut self, now: f64) -> PollResult {
        let period = self.period;
        let valid_period = period > 0.0 && period.is_finite();

        match self.state {
            ScheduleState::Idle => PollResult::default(),
            ScheduleState::Arming => {
                self.state = ScheduleState::Armed {
                    deadline: now + period,
                };
                PollResult::default()
            }
            ScheduleState::Restarting => {
                self.state = ScheduleState::Armed {
                    deadline: now + period,
                };
                PollResult {
                    due: 0,
                    restarted: true,
                }
            }
            ScheduleState::Armed { mut deadline } => {
                if !valid_period {
                    return PollResult::default();
                }
                let mut due = 0;
                while deadline <= now && due < MAX_CATCH_UP_TICKS {
                    deadline += period;
                    due += 1;
                }
                if deadline <= now {
                    deadline = now + period;
                }
                self.state = ScheduleState::Armed { deadline };
                PollResult {
                    due,
                    restarted: false,
                }
            }
        }
    }
}
