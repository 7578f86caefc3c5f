//! Send Capability
//!
//! The transport's send function together with the context it must run
//! on. [`ChannelSender::send`] calls it directly when already on that
//! context and posts it there otherwise, so the caller never blocks.
//!
//! Every clone shares one liveness flag. Once the host revokes it, sends
//! from any clone fail with [`ChannelError::NotConnected`], and sends that
//! were posted but had not yet run are dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::channel::error::{ChannelError, Result};
use crate::channel::host::HostId;
use crate::channel::message::Message;
use crate::dispatch::TaskRunner;

/// Transport send function handed over at establishment
pub type SendFn = Arc<dyn Fn(Message) + Send + Sync>;

/// How a send reached the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Called directly on the bound context
    Inline,
    /// Posted to the bound context
    Posted,
}

/// Context-bound send capability of one channel
#[derive(Clone)]
pub struct ChannelSender {
    host_id: HostId,
    runner: Arc<dyn TaskRunner>,
    send_fn: SendFn,
    live: Arc<AtomicBool>,
}

impl ChannelSender {
    /// Bind `send_fn` to `runner` for the channel `host_id`
    pub fn new(host_id: HostId, runner: Arc<dyn TaskRunner>, send_fn: SendFn) -> Self {
        Self {
            host_id,
            runner,
            send_fn,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Channel this capability belongs to
    pub fn host_id(&self) -> HostId {
        self.host_id
    }

    /// Context the send function is bound to
    pub fn runner(&self) -> &Arc<dyn TaskRunner> {
        &self.runner
    }

    /// Whether the channel this capability belongs to is still up
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Invalidate this capability and every clone of it
    pub(crate) fn revoke(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Forward `message` to the transport on the bound context
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotConnected`] once the channel has been
    /// destroyed, and [`ChannelError::TaskRunnerClosed`] if the message had
    /// to be posted and the bound context no longer accepts tasks.
    pub fn send(&self, message: Message) -> Result<Delivery> {
        if !self.is_live() {
            debug!(host_id = %self.host_id, "Send on destroyed channel");
            return Err(ChannelError::NotConnected);
        }

        if self.runner.runs_tasks_on_current_thread() {
            (self.send_fn)(message);
            return Ok(Delivery::Inline);
        }

        trace!(
            host_id = %self.host_id,
            runner = self.runner.name(),
            "Posting send to bound context"
        );
        let send_fn = Arc::clone(&self.send_fn);
        let live = Arc::clone(&self.live);
        self.runner
            .post_task(Box::new(move || {
                if live.load(Ordering::Acquire) {
                    send_fn(message);
                }
            }))
            .map_err(|_| ChannelError::TaskRunnerClosed(self.runner.name().to_string()))?;
        Ok(Delivery::Posted)
    }
}

impl fmt::Debug for ChannelSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSender")
            .field("host_id", &self.host_id)
            .field("runner", &self.runner.name())
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ThreadTaskRunner;
    use parking_lot::Mutex;
    use std::thread::{self, ThreadId};

    fn recording_send() -> (SendFn, Arc<Mutex<Vec<(u32, ThreadId)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let send_fn: SendFn = Arc::new(move |message: Message| {
            sink.lock().push((message.msg_type, thread::current().id()));
        });
        (send_fn, log)
    }

    #[test]
    fn test_send_from_other_thread_is_posted() {
        let runner = ThreadTaskRunner::spawn("sender-test").unwrap();
        let (send_fn, log) = recording_send();
        let sender = ChannelSender::new(HostId(1), runner.clone(), send_fn);

        let delivery = sender.send(Message::new(0, 9, Vec::new())).unwrap();
        runner.flush().unwrap();

        assert_eq!(delivery, Delivery::Posted);
        let log = log.lock();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, 9);
        assert_ne!(log[0].1, thread::current().id());
    }

    #[test]
    fn test_send_on_bound_thread_is_inline() {
        let runner = ThreadTaskRunner::spawn("sender-inline").unwrap();
        let (send_fn, log) = recording_send();
        let sender = ChannelSender::new(HostId(1), runner.clone(), send_fn);
        let result = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&result);
        runner
            .post_task(Box::new(move || {
                *slot.lock() = Some(sender.send(Message::new(0, 4, Vec::new())));
            }))
            .unwrap();
        runner.flush().unwrap();

        assert_eq!(*result.lock(), Some(Ok(Delivery::Inline)));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_send_after_runner_shutdown_fails() {
        let runner = ThreadTaskRunner::spawn("sender-closed").unwrap();
        let (send_fn, log) = recording_send();
        let sender = ChannelSender::new(HostId(2), runner.clone(), send_fn);
        runner.shutdown().unwrap();

        assert_eq!(
            sender.send(Message::new(0, 1, Vec::new())),
            Err(ChannelError::TaskRunnerClosed("sender-closed".to_string()))
        );
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_revoke_reaches_every_clone() {
        let runner = ThreadTaskRunner::spawn("sender-revoked").unwrap();
        let (send_fn, log) = recording_send();
        let sender = ChannelSender::new(HostId(3), runner.clone(), send_fn);
        let kept = sender.clone();

        sender.revoke();

        assert!(!kept.is_live());
        assert_eq!(
            kept.send(Message::new(0, 5, Vec::new())),
            Err(ChannelError::NotConnected)
        );
        runner.flush().unwrap();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_posted_send_dropped_when_revoked_before_it_runs() {
        let runner = ThreadTaskRunner::spawn("sender-pending").unwrap();
        let (send_fn, log) = recording_send();
        let sender = ChannelSender::new(HostId(4), runner.clone(), send_fn);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);

        runner
            .post_task(Box::new(move || {
                let _ = release_rx.recv();
            }))
            .unwrap();
        assert_eq!(
            sender.send(Message::new(0, 6, Vec::new())),
            Ok(Delivery::Posted)
        );
        sender.revoke();
        release_tx.send(()).unwrap();
        runner.flush().unwrap();

        assert!(log.lock().is_empty());
    }
}
