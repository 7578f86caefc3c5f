//! Channel Support Host
//!
//! Owns the lifetime of the single channel to the peer process and keeps
//! every interested subsystem in step with it.
//!
//! # Channel state
//!
//! ```text
//!                 on_channel_established(id)
//!  Disconnected ───────────────────────────────> Connected(id)
//!       ^                                           │   │
//!       │        on_channel_destroyed(id)           │   │ established(other)
//!       └───────────────────────────────────────────┘   │ = destroyed(id) then
//!                                                       │   established(other)
//!                   on_channel_destroyed(stale) ignored ┘
//! ```
//!
//! Handlers see establish, destroy and inbound messages, and get the send
//! capability with every establish. Observers see establish and destroy
//! only. Both sets are non-owning; a listener dropped by its owner simply
//! stops being notified.
//!
//! All mutation happens through `&mut self`, so the host is driven from a
//! single context. Handlers that want to send keep the [`ChannelSender`]
//! they were given instead of calling back into the host. Teardown revokes
//! that sender before anyone is told, so a copy kept past the destroy
//! notification fails with [`ChannelError::NotConnected`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::channel::error::{ChannelError, Result};
use crate::channel::message::Message;
use crate::channel::registry::ListenerSet;
use crate::channel::sender::{ChannelSender, Delivery, SendFn};
use crate::dispatch::TaskRunner;
use crate::utils::metrics::{metric_names, MetricsCollector};

/// Identifier the transport assigns to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(pub i32);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subsystem that talks over the channel
pub trait ChannelHandler: Send + Sync {
    /// The channel `host_id` is up; `sender` stays valid until it is destroyed
    fn on_channel_established(&self, host_id: HostId, sender: ChannelSender);

    /// The channel `host_id` is gone; drop any sender kept for it
    fn on_channel_destroyed(&self, host_id: HostId);

    /// Inspect an inbound message; return `true` to consume it
    fn on_message_received(&self, message: &Message) -> bool;
}

/// Party interested only in whether the channel is up
pub trait ChannelObserver: Send + Sync {
    /// A channel was established
    fn on_channel_established(&self);

    /// The channel was destroyed
    fn on_channel_destroyed(&self);
}

#[derive(Debug)]
struct ActiveChannel {
    host_id: HostId,
    sender: ChannelSender,
}

/// Host-side multiplexer for the peer-process channel
pub struct ChannelSupportHost {
    channel: Option<ActiveChannel>,
    handlers: ListenerSet<dyn ChannelHandler>,
    observers: ListenerSet<dyn ChannelObserver>,
    metrics: Arc<MetricsCollector>,
}

impl ChannelSupportHost {
    /// Create a disconnected host
    pub fn new(metrics: Arc<MetricsCollector>) -> Self {
        Self {
            channel: None,
            handlers: ListenerSet::new(),
            observers: ListenerSet::new(),
            metrics,
        }
    }

    /// Register `handler`
    ///
    /// While connected the handler is told about the current channel before
    /// this returns. Returns `false` if it was already registered.
    pub fn register_handler(&mut self, handler: Arc<dyn ChannelHandler>) -> bool {
        if !self.handlers.add(&handler) {
            debug!("Handler already registered");
            return false;
        }
        self.update_handler_gauge();

        if let Some(channel) = &self.channel {
            debug!(host_id = %channel.host_id, "Replaying establish to late handler");
            handler.on_channel_established(channel.host_id, channel.sender.clone());
        }
        true
    }

    /// Unregister `handler`; returns `false` if it was not registered
    pub fn unregister_handler(&mut self, handler: &Arc<dyn ChannelHandler>) -> bool {
        let removed = self.handlers.remove(handler);
        if removed {
            self.update_handler_gauge();
        }
        removed
    }

    /// Add `observer`
    ///
    /// While connected the observer is told about the current channel
    /// before this returns. Returns `false` if it was already added.
    pub fn add_channel_observer(&mut self, observer: Arc<dyn ChannelObserver>) -> bool {
        if !self.observers.add(&observer) {
            debug!("Channel observer already added");
            return false;
        }
        if self.channel.is_some() {
            observer.on_channel_established();
        }
        true
    }

    /// Remove `observer`; returns `false` if it was not added
    pub fn remove_channel_observer(&mut self, observer: &Arc<dyn ChannelObserver>) -> bool {
        self.observers.remove(observer)
    }

    /// Record a new channel and tell every handler and observer
    ///
    /// `send_fn` may only run on `runner`'s context; [`send`](Self::send)
    /// and the senders handed to handlers take care of that.
    ///
    /// An establish for a different id while connected is treated as the
    /// old channel going away first.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::AlreadyEstablished`] when `host_id` is the
    /// channel already connected. Nobody is notified again.
    pub fn on_channel_established(
        &mut self,
        host_id: HostId,
        runner: Arc<dyn TaskRunner>,
        send_fn: SendFn,
    ) -> Result<()> {
        if let Some(current) = self.channel.as_ref().map(|c| c.host_id) {
            self.metrics
                .increment_counter(metric_names::CHANNEL_PROTOCOL_VIOLATIONS, 1);
            if current == host_id {
                warn!(%host_id, "Duplicate establish for connected channel");
                return Err(ChannelError::AlreadyEstablished(host_id));
            }
            warn!(
                old_host_id = %current,
                new_host_id = %host_id,
                "Channel established while connected, resetting previous channel"
            );
            self.teardown(current);
        }

        let sender = ChannelSender::new(host_id, runner, send_fn);
        self.channel = Some(ActiveChannel {
            host_id,
            sender: sender.clone(),
        });
        self.metrics
            .increment_counter(metric_names::CHANNELS_ESTABLISHED, 1);
        info!(%host_id, runner = sender.runner().name(), "Channel established");

        for handler in self.handlers.live() {
            handler.on_channel_established(host_id, sender.clone());
        }
        for observer in self.observers.live() {
            observer.on_channel_established();
        }
        Ok(())
    }

    /// Tear down the channel `host_id` if it is the current one
    ///
    /// Returns `false` for a stale id or when nothing is connected; such
    /// notifications are ignored apart from being counted.
    pub fn on_channel_destroyed(&mut self, host_id: HostId) -> bool {
        match self.channel.as_ref().map(|c| c.host_id) {
            Some(current) if current == host_id => {
                self.teardown(current);
                true
            }
            Some(current) => {
                warn!(%host_id, %current, "Ignoring destroy for stale channel");
                self.metrics
                    .increment_counter(metric_names::CHANNEL_STALE_DESTROYS, 1);
                false
            }
            None => {
                warn!(%host_id, "Ignoring destroy while disconnected");
                self.metrics
                    .increment_counter(metric_names::CHANNEL_STALE_DESTROYS, 1);
                false
            }
        }
    }

    fn teardown(&mut self, host_id: HostId) {
        if let Some(channel) = self.channel.take() {
            channel.sender.revoke();
        }
        self.metrics
            .increment_counter(metric_names::CHANNELS_DESTROYED, 1);
        info!(%host_id, "Channel destroyed");

        for handler in self.handlers.live() {
            handler.on_channel_destroyed(host_id);
        }
        for observer in self.observers.live() {
            observer.on_channel_destroyed();
        }
    }

    /// Offer `message` to each handler in registration order
    ///
    /// Stops at the first handler that consumes it. Returns `false` when
    /// none did; the message is then dropped.
    pub fn on_message_received(&self, message: &Message) -> bool {
        for handler in self.handlers.live() {
            if handler.on_message_received(message) {
                self.metrics
                    .increment_counter(metric_names::CHANNEL_ROUTED_MESSAGES, 1);
                return true;
            }
        }

        debug!(
            routing_id = message.routing_id,
            msg_type = message.msg_type,
            "Unhandled message dropped"
        );
        self.metrics
            .increment_counter(metric_names::CHANNEL_UNHANDLED_MESSAGES, 1);
        false
    }

    /// Send `message` to the peer process
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotConnected`] when no channel is up, and
    /// [`ChannelError::TaskRunnerClosed`] when the channel's context has
    /// stopped.
    pub fn send(&self, message: Message) -> Result<()> {
        let Some(channel) = &self.channel else {
            debug!(msg_type = message.msg_type, "Send while disconnected");
            self.metrics
                .increment_counter(metric_names::CHANNEL_SEND_FAILURES, 1);
            return Err(ChannelError::NotConnected);
        };

        match channel.sender.send(message) {
            Ok(Delivery::Posted) => {
                self.metrics
                    .increment_counter(metric_names::CHANNEL_SENDS_POSTED, 1);
                Ok(())
            }
            Ok(Delivery::Inline) => Ok(()),
            Err(e) => {
                warn!(host_id = %channel.host_id, "Send failed: {}", e);
                let counter = match e {
                    ChannelError::TaskRunnerClosed(_) => {
                        metric_names::CHANNEL_SEND_RUNNER_CLOSED
                    }
                    _ => metric_names::CHANNEL_SEND_FAILURES,
                };
                self.metrics.increment_counter(counter, 1);
                Err(e)
            }
        }
    }

    /// Whether a channel is connected
    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Id of the connected channel
    pub fn host_id(&self) -> Option<HostId> {
        self.channel.as_ref().map(|c| c.host_id)
    }

    /// Send capability of the connected channel
    pub fn sender(&self) -> Option<ChannelSender> {
        self.channel.as_ref().map(|c| c.sender.clone())
    }

    /// Number of live registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Number of live channel observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Metrics shared with the host
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    fn update_handler_gauge(&self) {
        self.metrics
            .set_gauge(metric_names::CHANNEL_HANDLERS, self.handlers.len() as f64);
    }
}

impl fmt::Debug for ChannelSupportHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSupportHost")
            .field("channel", &self.channel)
            .field("handlers", &self.handlers)
            .field("observers", &self.observers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ThreadTaskRunner;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Established(HostId),
        Destroyed(HostId),
        Message(u32),
    }

    struct RecordingHandler {
        name: &'static str,
        claims: Option<u32>,
        log: Arc<Mutex<Vec<(&'static str, Seen)>>>,
        sender: Mutex<Option<ChannelSender>>,
    }

    impl RecordingHandler {
        fn new(
            name: &'static str,
            claims: Option<u32>,
            log: &Arc<Mutex<Vec<(&'static str, Seen)>>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                claims,
                log: Arc::clone(log),
                sender: Mutex::new(None),
            })
        }
    }

    impl ChannelHandler for RecordingHandler {
        fn on_channel_established(&self, host_id: HostId, sender: ChannelSender) {
            self.log.lock().push((self.name, Seen::Established(host_id)));
            *self.sender.lock() = Some(sender);
        }

        fn on_channel_destroyed(&self, host_id: HostId) {
            self.log.lock().push((self.name, Seen::Destroyed(host_id)));
            *self.sender.lock() = None;
        }

        fn on_message_received(&self, message: &Message) -> bool {
            self.log.lock().push((self.name, Seen::Message(message.msg_type)));
            self.claims == Some(message.msg_type)
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        established: Mutex<u32>,
        destroyed: Mutex<u32>,
    }

    impl ChannelObserver for CountingObserver {
        fn on_channel_established(&self) {
            *self.established.lock() += 1;
        }

        fn on_channel_destroyed(&self) {
            *self.destroyed.lock() += 1;
        }
    }

    fn create_host() -> (ChannelSupportHost, Arc<ThreadTaskRunner>, Arc<Mutex<Vec<u32>>>) {
        let runner = ThreadTaskRunner::spawn("host-test-send").unwrap();
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            ChannelSupportHost::new(Arc::new(MetricsCollector::new())),
            runner,
            sent,
        )
    }

    fn send_fn(sent: &Arc<Mutex<Vec<u32>>>) -> SendFn {
        let sent = Arc::clone(sent);
        Arc::new(move |message: Message| sent.lock().push(message.msg_type))
    }

    #[test]
    fn test_establish_fans_out_in_registration_order() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = RecordingHandler::new("first", None, &log);
        let second = RecordingHandler::new("second", None, &log);
        host.register_handler(first.clone());
        host.register_handler(second.clone());

        host.on_channel_established(HostId(7), runner, send_fn(&sent))
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                ("first", Seen::Established(HostId(7))),
                ("second", Seen::Established(HostId(7))),
            ]
        );
        assert!(host.is_connected());
        assert_eq!(host.host_id(), Some(HostId(7)));
    }

    #[test]
    fn test_late_handler_gets_current_channel() {
        let (mut host, runner, sent) = create_host();
        host.on_channel_established(HostId(3), runner, send_fn(&sent))
            .unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let late = RecordingHandler::new("late", None, &log);
        assert!(host.register_handler(late.clone()));

        assert_eq!(*log.lock(), vec![("late", Seen::Established(HostId(3)))]);
        assert_eq!(late.sender.lock().as_ref().map(|s| s.host_id()), Some(HostId(3)));
    }

    #[test]
    fn test_duplicate_registration_single_notification() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler::new("h", None, &log);

        assert!(host.register_handler(handler.clone()));
        assert!(!host.register_handler(handler.clone()));
        assert_eq!(host.handler_count(), 1);

        host.on_channel_established(HostId(1), runner, send_fn(&sent))
            .unwrap();
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_duplicate_destroy_notifies_once() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler::new("h", None, &log);
        let observer = Arc::new(CountingObserver::default());
        host.register_handler(handler.clone());
        host.add_channel_observer(observer.clone());
        host.on_channel_established(HostId(5), runner, send_fn(&sent))
            .unwrap();

        assert!(host.on_channel_destroyed(HostId(5)));
        assert!(!host.on_channel_destroyed(HostId(5)));

        let destroyed = log
            .lock()
            .iter()
            .filter(|(_, seen)| matches!(seen, Seen::Destroyed(_)))
            .count();
        assert_eq!(destroyed, 1);
        assert_eq!(*observer.destroyed.lock(), 1);
        assert_eq!(
            host.metrics().counter(metric_names::CHANNEL_STALE_DESTROYS),
            1
        );
    }

    #[test]
    fn test_stale_destroy_is_ignored() {
        let (mut host, runner, sent) = create_host();
        let observer = Arc::new(CountingObserver::default());
        host.add_channel_observer(observer.clone());
        host.on_channel_established(HostId(2), runner, send_fn(&sent))
            .unwrap();

        assert!(!host.on_channel_destroyed(HostId(1)));
        assert!(host.is_connected());
        assert_eq!(*observer.destroyed.lock(), 0);
    }

    #[test]
    fn test_duplicate_establish_is_error() {
        let (mut host, runner, sent) = create_host();
        let observer = Arc::new(CountingObserver::default());
        host.add_channel_observer(observer.clone());
        host.on_channel_established(HostId(4), runner.clone(), send_fn(&sent))
            .unwrap();

        let result = host.on_channel_established(HostId(4), runner, send_fn(&sent));

        assert_eq!(result, Err(ChannelError::AlreadyEstablished(HostId(4))));
        assert_eq!(*observer.established.lock(), 1);
        assert_eq!(
            host.metrics()
                .counter(metric_names::CHANNEL_PROTOCOL_VIOLATIONS),
            1
        );
    }

    #[test]
    fn test_establish_while_connected_resets_previous() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler::new("h", None, &log);
        host.register_handler(handler.clone());
        host.on_channel_established(HostId(1), runner.clone(), send_fn(&sent))
            .unwrap();

        host.on_channel_established(HostId(2), runner, send_fn(&sent))
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                ("h", Seen::Established(HostId(1))),
                ("h", Seen::Destroyed(HostId(1))),
                ("h", Seen::Established(HostId(2))),
            ]
        );
        assert_eq!(host.host_id(), Some(HostId(2)));
    }

    #[test]
    fn test_first_claiming_handler_consumes_message() {
        let (mut host, _runner, _sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = RecordingHandler::new("a", Some(10), &log);
        let b = RecordingHandler::new("b", Some(20), &log);
        let c = RecordingHandler::new("c", Some(20), &log);
        host.register_handler(a.clone());
        host.register_handler(b.clone());
        host.register_handler(c.clone());

        assert!(host.on_message_received(&Message::new(0, 20, Vec::new())));
        assert_eq!(
            *log.lock(),
            vec![("a", Seen::Message(20)), ("b", Seen::Message(20))]
        );

        assert!(!host.on_message_received(&Message::new(0, 99, Vec::new())));
        assert_eq!(
            host.metrics()
                .counter(metric_names::CHANNEL_UNHANDLED_MESSAGES),
            1
        );
    }

    #[test]
    fn test_send_requires_connection() {
        let (mut host, runner, sent) = create_host();

        assert_eq!(
            host.send(Message::new(0, 1, Vec::new())),
            Err(ChannelError::NotConnected)
        );

        host.on_channel_established(HostId(1), runner.clone(), send_fn(&sent))
            .unwrap();
        host.send(Message::new(0, 2, Vec::new())).unwrap();
        runner.flush().unwrap();
        assert_eq!(*sent.lock(), vec![2]);

        host.on_channel_destroyed(HostId(1));
        assert_eq!(
            host.send(Message::new(0, 3, Vec::new())),
            Err(ChannelError::NotConnected)
        );
    }

    #[test]
    fn test_kept_sender_rejected_after_destroy() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler::new("h", None, &log);
        host.register_handler(handler.clone());
        host.on_channel_established(HostId(1), runner.clone(), send_fn(&sent))
            .unwrap();
        let kept = handler.sender.lock().clone().unwrap();

        host.on_channel_destroyed(HostId(1));

        assert!(!kept.is_live());
        assert_eq!(
            kept.send(Message::new(0, 77, Vec::new())),
            Err(ChannelError::NotConnected)
        );
        runner.flush().unwrap();
        assert!(sent.lock().is_empty());
    }

    #[test]
    fn test_reset_revokes_previous_sender() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler::new("h", None, &log);
        host.register_handler(handler.clone());
        host.on_channel_established(HostId(1), runner.clone(), send_fn(&sent))
            .unwrap();
        let old = handler.sender.lock().clone().unwrap();

        host.on_channel_established(HostId(2), runner.clone(), send_fn(&sent))
            .unwrap();
        let current = handler.sender.lock().clone().unwrap();

        assert_eq!(
            old.send(Message::new(0, 1, Vec::new())),
            Err(ChannelError::NotConnected)
        );
        current.send(Message::new(0, 2, Vec::new())).unwrap();
        runner.flush().unwrap();
        assert_eq!(*sent.lock(), vec![2]);
    }

    #[test]
    fn test_send_on_stopped_runner_counted_separately() {
        let (mut host, runner, sent) = create_host();
        host.on_channel_established(HostId(1), runner.clone(), send_fn(&sent))
            .unwrap();
        runner.shutdown().unwrap();

        assert_eq!(
            host.send(Message::new(0, 1, Vec::new())),
            Err(ChannelError::TaskRunnerClosed("host-test-send".to_string()))
        );
        assert_eq!(
            host.metrics()
                .counter(metric_names::CHANNEL_SEND_RUNNER_CLOSED),
            1
        );
        assert_eq!(
            host.metrics().counter(metric_names::CHANNEL_SEND_FAILURES),
            0
        );
    }

    #[test]
    fn test_dropped_handler_not_notified() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let kept = RecordingHandler::new("kept", None, &log);
        let dropped = RecordingHandler::new("dropped", None, &log);
        host.register_handler(kept.clone());
        host.register_handler(dropped.clone());
        drop(dropped);

        host.on_channel_established(HostId(1), runner, send_fn(&sent))
            .unwrap();

        assert_eq!(*log.lock(), vec![("kept", Seen::Established(HostId(1)))]);
        assert_eq!(host.handler_count(), 1);
    }

    #[test]
    fn test_unregistered_handler_misses_destroy() {
        let (mut host, runner, sent) = create_host();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler::new("h", None, &log);
        let as_dyn: Arc<dyn ChannelHandler> = handler.clone();
        host.register_handler(as_dyn.clone());
        host.on_channel_established(HostId(1), runner, send_fn(&sent))
            .unwrap();

        assert!(host.unregister_handler(&as_dyn));
        assert!(!host.unregister_handler(&as_dyn));
        host.on_channel_destroyed(HostId(1));

        assert_eq!(log.lock().len(), 1);
    }
}
