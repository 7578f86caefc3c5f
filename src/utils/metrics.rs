//! Bridge Counters
//!
//! Conditions the core absorbs instead of failing (stale channel
//! notifications, unhandled messages, unknown device codes, dropped
//! dispatches) are counted here so they stay observable.
//!
//! A single [`MetricsCollector`] is shared by `Arc` between the channel
//! host, the input translator and the event dispatcher.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};

/// Counter and gauge store shared across the bridge components
#[derive(Debug)]
pub struct MetricsCollector {
    counters: RwLock<HashMap<&'static str, u64>>,
    gauges: RwLock<HashMap<&'static str, f64>>,
    start_time: Instant,
}

impl MetricsCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Add `value` to a counter, creating it at zero first
    pub fn increment_counter(&self, name: &'static str, value: u64) {
        *self.counters.write().entry(name).or_insert(0) += value;
    }

    /// Set a gauge to its current value
    pub fn set_gauge(&self, name: &'static str, value: f64) {
        self.gauges.write().insert(name, value);
    }

    /// Current counter value, `None` if never incremented
    pub fn get_counter(&self, name: &str) -> Option<u64> {
        self.counters.read().get(name).copied()
    }

    /// Counter value with zero for counters never touched
    pub fn counter(&self, name: &str) -> u64 {
        self.get_counter(name).unwrap_or(0)
    }

    /// Current gauge value
    pub fn get_gauge(&self, name: &str) -> Option<f64> {
        self.gauges.read().get(name).copied()
    }

    /// Point-in-time copy of everything collected so far
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: SystemTime::now(),
            uptime: self.start_time.elapsed(),
            counters: self
                .counters
                .read()
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
            gauges: self
                .gauges
                .read()
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
        }
    }

    /// Clear all counters and gauges
    pub fn reset(&self) {
        self.counters.write().clear();
        self.gauges.write().clear();
    }

    /// Export in Prometheus text format, names sorted for stable output
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        let counters = self.counters.read();
        let mut names: Vec<_> = counters.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, counters[name]));
        }

        let gauges = self.gauges.read();
        let mut names: Vec<_> = gauges.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            output.push_str(&format!("# TYPE {} gauge\n", name));
            output.push_str(&format!("{} {}\n", name, gauges[name]));
        }

        output
    }

    /// Export the snapshot as pretty JSON
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of all collected metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When this snapshot was taken
    pub timestamp: SystemTime,
    /// Time since the collector was created
    pub uptime: Duration,
    /// Counter values (monotonically increasing)
    pub counters: HashMap<String, u64>,
    /// Gauge values (current state)
    pub gauges: HashMap<String, f64>,
}

pub mod metric_names {
    //! Metric names shared by all components.

    /// Channels established
    pub const CHANNELS_ESTABLISHED: &str = "channel_established_total";
    /// Channels destroyed
    pub const CHANNELS_DESTROYED: &str = "channel_destroyed_total";
    /// Establish while connected, or duplicate establish
    pub const CHANNEL_PROTOCOL_VIOLATIONS: &str = "channel_protocol_violations_total";
    /// Destroy notifications for a channel that is not the current one
    pub const CHANNEL_STALE_DESTROYS: &str = "channel_stale_destroys_total";
    /// Inbound messages no handler claimed
    pub const CHANNEL_UNHANDLED_MESSAGES: &str = "channel_unhandled_messages_total";
    /// Inbound messages claimed by a handler
    pub const CHANNEL_ROUTED_MESSAGES: &str = "channel_routed_messages_total";
    /// Sends refused because no channel was connected
    pub const CHANNEL_SEND_FAILURES: &str = "channel_send_failures_total";
    /// Sends lost because the channel's bound context had stopped
    pub const CHANNEL_SEND_RUNNER_CLOSED: &str = "channel_send_runner_closed_total";
    /// Sends redirected onto the channel's bound context
    pub const CHANNEL_SENDS_POSTED: &str = "channel_sends_posted_total";
    /// Currently registered handlers
    pub const CHANNEL_HANDLERS: &str = "channel_handlers";

    /// Raw device callbacks processed
    pub const INPUT_CALLBACKS: &str = "input_callbacks_total";
    /// Portable events synthesized
    pub const INPUT_EVENTS: &str = "input_events_total";
    /// Button or axis codes with no mapping
    pub const INPUT_UNKNOWN_CODES: &str = "input_unknown_codes_total";
    /// Pointer capability binds
    pub const INPUT_POINTER_BINDS: &str = "input_pointer_binds_total";
    /// Cursor changes the seat rejected
    pub const INPUT_CURSOR_FAILURES: &str = "input_cursor_failures_total";

    /// Events handed to the UI task queue
    pub const DISPATCH_POSTED: &str = "dispatch_posted_total";
    /// Events dropped because the UI task queue was gone
    pub const DISPATCH_DROPPED: &str = "dispatch_dropped_total";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let metrics = MetricsCollector::new();

        metrics.increment_counter("test_counter", 1);
        assert_eq!(metrics.get_counter("test_counter"), Some(1));

        metrics.increment_counter("test_counter", 5);
        assert_eq!(metrics.counter("test_counter"), 6);
        assert_eq!(metrics.counter("never_touched"), 0);
    }

    #[test]
    fn test_gauge() {
        let metrics = MetricsCollector::new();

        metrics.set_gauge("test_gauge", 2.0);
        metrics.set_gauge("test_gauge", 3.0);
        assert_eq!(metrics.get_gauge("test_gauge"), Some(3.0));
    }

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter("counter1", 10);
        metrics.set_gauge("gauge1", 42.0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.counters.get("counter1"), Some(&10));
        assert_eq!(snapshot.gauges.get("gauge1"), Some(&42.0));

        metrics.reset();
        assert_eq!(metrics.get_counter("counter1"), None);
        assert_eq!(metrics.get_gauge("gauge1"), None);
    }

    #[test]
    fn test_prometheus_export_is_sorted() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter("b_total", 2);
        metrics.increment_counter("a_total", 1);

        let output = metrics.export_prometheus();
        let a = output.find("a_total 1").unwrap();
        let b = output.find("b_total 2").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_json_export() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter(metric_names::INPUT_EVENTS, 1);

        let json = metrics.export_json().unwrap();
        assert!(json.contains(metric_names::INPUT_EVENTS));
    }
}
