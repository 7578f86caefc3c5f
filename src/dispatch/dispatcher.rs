//! Event Dispatcher
//!
//! Hands synthesized pointer events to the UI-owning thread. `dispatch`
//! may be called from any thread and always goes through the UI runner's
//! queue, including when the caller already is the UI thread, so callers
//! see one delivery path and per-producer FIFO order holds.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::dispatch::error::Result;
use crate::dispatch::runner::TaskRunner;
use crate::input::event::PortableEvent;
use crate::utils::metrics::{metric_names, MetricsCollector};

/// Consumer of portable events, invoked on the UI thread
pub trait EventSink: Send + Sync {
    /// Handle one event; each event is delivered exactly once
    fn dispatch_event(&self, event: PortableEvent);
}

/// Delivers events onto the UI runner
#[derive(Clone)]
pub struct EventDispatcher {
    ui_runner: Arc<dyn TaskRunner>,
    sink: Arc<dyn EventSink>,
    metrics: Arc<MetricsCollector>,
}

impl EventDispatcher {
    /// Create a dispatcher posting to `ui_runner` and delivering to `sink`
    pub fn new(
        ui_runner: Arc<dyn TaskRunner>,
        sink: Arc<dyn EventSink>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            ui_runner,
            sink,
            metrics,
        }
    }

    /// Schedule delivery of `event` on the UI thread
    ///
    /// Never waits for the event to be consumed.
    ///
    /// # Errors
    ///
    /// Fails when the UI runner has shut down; the event is dropped and
    /// counted.
    pub fn dispatch(&self, event: PortableEvent) -> Result<()> {
        let sink = Arc::clone(&self.sink);
        match self
            .ui_runner
            .post_task(Box::new(move || sink.dispatch_event(event)))
        {
            Ok(()) => {
                trace!(kind = ?event.kind(), "Event posted to UI thread");
                self.metrics
                    .increment_counter(metric_names::DISPATCH_POSTED, 1);
                Ok(())
            }
            Err(e) => {
                warn!(kind = ?event.kind(), "Dropping event: {}", e);
                self.metrics
                    .increment_counter(metric_names::DISPATCH_DROPPED, 1);
                Err(e)
            }
        }
    }

    /// The runner events are delivered on
    pub fn ui_runner(&self) -> &Arc<dyn TaskRunner> {
        &self.ui_runner
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("ui_runner", &self.ui_runner.name())
            .finish()
    }
}
