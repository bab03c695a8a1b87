//! Optional, injected telemetry.
//!
//! [`Telemetry`] is an explicitly constructed facade handed to the registry,
//! router and shell. There is no process-wide instance; the default value is a
//! disabled no-op, so wiring telemetry is never required.
//!
//! Recording is fire-and-forget. Sinks cannot report failures back to callers
//! and nothing in command dispatch depends on what a sink does.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::context::{StateMap, Value};
use crate::logging::targets;

/// Telemetry attributes.
pub type Attrs = StateMap;

/// Build an attribute map from key/value pairs.
pub fn attrs<const N: usize>(pairs: [(&str, Value); N]) -> Attrs {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// A named event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    /// Event name, e.g. `command.dispatched`.
    pub name: String,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Event attributes.
    pub attrs: Attrs,
}

/// A named numeric measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryMetric {
    /// Metric name, e.g. `key.pressed`.
    pub name: String,
    /// Measured value (counts, or milliseconds for timers).
    pub value: f64,
    /// Metric attributes.
    pub attrs: Attrs,
}

// =============================================================================
// Sinks
// =============================================================================

/// Destination for telemetry records.
pub trait TelemetrySink: Send + Sync {
    /// Record an event.
    fn record_event(&self, event: TelemetryEvent);

    /// Record a metric.
    fn record_metric(&self, metric: TelemetryMetric);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record_event(&self, _event: TelemetryEvent) {}

    fn record_metric(&self, _metric: TelemetryMetric) {}
}

/// Writes records to `tracing` under the telemetry target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn record_event(&self, event: TelemetryEvent) {
        tracing::info!(
            target: targets::TELEMETRY,
            name = %event.name,
            timestamp = %event.timestamp.to_rfc3339(),
            attrs = %serde_json::Value::Object(event.attrs),
            "event"
        );
    }

    fn record_metric(&self, metric: TelemetryMetric) {
        tracing::info!(
            target: targets::TELEMETRY,
            name = %metric.name,
            value = metric.value,
            attrs = %serde_json::Value::Object(metric.attrs),
            "metric"
        );
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TelemetryEvent>>,
    metrics: Mutex<Vec<TelemetryMetric>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    /// Recorded events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name == name)
            .cloned()
            .collect()
    }

    /// All recorded metrics.
    pub fn metrics(&self) -> Vec<TelemetryMetric> {
        self.metrics.lock().clone()
    }

    /// Recorded metrics with the given name.
    pub fn metrics_named(&self, name: &str) -> Vec<TelemetryMetric> {
        self.metrics
            .lock()
            .iter()
            .filter(|metric| metric.name == name)
            .cloned()
            .collect()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
        self.metrics.lock().clear();
    }
}

impl TelemetrySink for MemorySink {
    fn record_event(&self, event: TelemetryEvent) {
        self.events.lock().push(event);
    }

    fn record_metric(&self, metric: TelemetryMetric) {
        self.metrics.lock().push(metric);
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Which sink [`Telemetry::from_config`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// [`NullSink`].
    #[default]
    Null,
    /// [`LogSink`].
    Log,
    /// [`MemorySink`].
    Memory,
}

/// Telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Whether anything is recorded at all.
    pub enabled: bool,
    /// Destination of records.
    pub sink: SinkKind,
}

// =============================================================================
// Facade
// =============================================================================

/// Telemetry facade.
///
/// Cloning yields another handle to the same sink.
#[derive(Clone)]
pub struct Telemetry {
    enabled: bool,
    sink: Arc<dyn TelemetrySink>,
    memory: Option<Arc<MemorySink>>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Telemetry {
    /// Enabled telemetry writing to `sink`.
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            enabled: true,
            sink,
            memory: None,
        }
    }

    /// Disabled telemetry. Every call is a no-op.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            sink: Arc::new(NullSink),
            memory: None,
        }
    }

    /// Enabled telemetry backed by a [`MemorySink`], returned alongside.
    pub fn memory() -> (Self, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let telemetry = Self {
            enabled: true,
            sink: sink.clone(),
            memory: Some(sink.clone()),
        };
        (telemetry, sink)
    }

    /// Build telemetry from configuration.
    pub fn from_config(config: &TelemetryConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        match config.sink {
            SinkKind::Null => Self::new(Arc::new(NullSink)),
            SinkKind::Log => Self::new(Arc::new(LogSink)),
            SinkKind::Memory => Self::memory().0,
        }
    }

    /// Check whether records are forwarded to the sink.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The in-memory sink, if this facade was built with one.
    pub fn memory_sink(&self) -> Option<Arc<MemorySink>> {
        self.memory.clone()
    }

    /// Record an event.
    pub fn event(&self, name: &str, attrs: Attrs) {
        if !self.enabled {
            return;
        }
        self.sink.record_event(TelemetryEvent {
            name: name.to_string(),
            timestamp: Utc::now(),
            attrs,
        });
    }

    /// Record a counter increment.
    pub fn counter(&self, name: &str, value: f64, attrs: Attrs) {
        if !self.enabled {
            return;
        }
        self.sink.record_metric(TelemetryMetric {
            name: name.to_string(),
            value,
            attrs,
        });
    }

    /// Start a timer. The elapsed milliseconds are recorded as a metric when
    /// the returned guard is dropped.
    pub fn timer(&self, name: &str, attrs: Attrs) -> TimerGuard {
        TimerGuard {
            telemetry: self.clone(),
            name: name.to_string(),
            attrs: Some(attrs),
            start: Instant::now(),
        }
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("enabled", &self.enabled)
            .field("memory", &self.memory.is_some())
            .finish()
    }
}

/// Records elapsed time on drop. See [`Telemetry::timer`].
#[must_use = "the timer records when dropped"]
pub struct TimerGuard {
    telemetry: Telemetry,
    name: String,
    attrs: Option<Attrs>,
    start: Instant,
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        let attrs = self.attrs.take().unwrap_or_default();
        self.telemetry.counter(&self.name, elapsed_ms, attrs);
    }
}

static_assertions::assert_impl_all!(Telemetry: Send, Sync);
