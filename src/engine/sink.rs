//! Logging and physics-event sink.
//!
//! The engine reports through an injected [`EventSink`] and never depends on
//! what the sink does with the records. Physics results are identical with
//! [`NoopSink`], [`TracingSink`] or [`RecordingSink`].

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::state::Vec3;

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Very verbose diagnostics.
    Trace,
    /// Diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Recoverable anomaly.
    Warn,
    /// Failure.
    Error,
}

/// Kind of physics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A resolved pairwise collision.
    Collision,
    /// An impulse applied to a body.
    Impulse,
    /// Energy moved between bodies.
    EnergyTransfer,
}

/// Structured physics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsEvent {
    /// Simulation time at which the event occurred.
    pub timestamp: f64,
    /// Event kind.
    pub kind: EventKind,
    /// Ids of the participating entities.
    pub participant_ids: Vec<String>,
    /// Momentum before the event.
    pub pre_momentum: Option<Vec3>,
    /// Momentum after the event.
    pub post_momentum: Option<Vec3>,
    /// Kinetic energy before the event.
    pub pre_energy: Option<f64>,
    /// Kinetic energy after the event.
    pub post_energy: Option<f64>,
}

impl PhysicsEvent {
    /// Create an event without momentum or energy data.
    #[must_use]
    pub fn new(timestamp: f64, kind: EventKind, participant_ids: Vec<String>) -> Self {
        Self {
            timestamp,
            kind,
            participant_ids,
            pre_momentum: None,
            post_momentum: None,
            pre_energy: None,
            post_energy: None,
        }
    }

    /// Attach before/after momentum.
    #[must_use]
    pub fn with_momentum(mut self, pre: Vec3, post: Vec3) -> Self {
        self.pre_momentum = Some(pre);
        self.post_momentum = Some(post);
        self
    }

    /// Attach before/after kinetic energy.
    #[must_use]
    pub fn with_energy(mut self, pre: f64, post: f64) -> Self {
        self.pre_energy = Some(pre);
        self.post_energy = Some(post);
        self
    }
}

/// Destination for engine log lines and physics events.
pub trait EventSink {
    /// Record a log line.
    fn log(&mut self, level: LogLevel, message: &str, context: Option<&str>);

    /// Record a physics event.
    fn record_event(&mut self, event: PhysicsEvent);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log(&mut self, _level: LogLevel, _message: &str, _context: Option<&str>) {}

    fn record_event(&mut self, _event: PhysicsEvent) {}
}

/// Sink that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log(&mut self, level: LogLevel, message: &str, context: Option<&str>) {
        let context = context.unwrap_or_default();
        match level {
            LogLevel::Trace => tracing::trace!(context, "{message}"),
            LogLevel::Debug => tracing::debug!(context, "{message}"),
            LogLevel::Info => tracing::info!(context, "{message}"),
            LogLevel::Warn => tracing::warn!(context, "{message}"),
            LogLevel::Error => tracing::error!(context, "{message}"),
        }
    }

    fn record_event(&mut self, event: PhysicsEvent) {
        tracing::debug!(
            timestamp = event.timestamp,
            kind = ?event.kind,
            participants = ?event.participant_ids,
            pre_energy = ?event.pre_energy,
            post_energy = ?event.post_energy,
            "physics event"
        );
    }
}

/// One captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Message.
    pub message: String,
    /// Optional context.
    pub context: Option<String>,
}

#[derive(Debug, Default)]
struct Recorded {
    logs: Vec<LogRecord>,
    events: Vec<PhysicsEvent>,
}

/// In-memory sink for tests and tooling.
///
/// Clones share one buffer, so a test can hand one clone to the engine and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<PhysicsEvent> {
        self.inner.borrow().events.clone()
    }

    /// Snapshot of recorded log lines.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.inner.borrow().logs.clone()
    }

    /// Number of recorded events of `kind`.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .events
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.logs.clear();
        inner.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn log(&mut self, level: LogLevel, message: &str, context: Option<&str>) {
        self.inner.borrow_mut().logs.push(LogRecord {
            level,
            message: message.to_string(),
            context: context.map(str::to_string),
        });
    }

    fn record_event(&mut self, event: PhysicsEvent) {
        self.inner.borrow_mut().events.push(event);
    }
}
