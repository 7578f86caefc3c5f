//! Utility Functions
//!
//! Counters for the conditions the bridge absorbs, and user-friendly error
//! formatting for the binary.
//!
//! ## Metrics
//!
//! ```rust
//! use ozone_bridge::utils::{metric_names, MetricsCollector};
//!
//! let metrics = MetricsCollector::new();
//! metrics.increment_counter(metric_names::CHANNEL_STALE_DESTROYS, 1);
//! assert_eq!(metrics.counter(metric_names::CHANNEL_STALE_DESTROYS), 1);
//! ```

pub mod errors;
pub mod metrics;

pub use errors::format_user_error;
pub use metrics::{metric_names, MetricsCollector, MetricsSnapshot};
