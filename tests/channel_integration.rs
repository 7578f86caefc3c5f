//! Channel host integration tests
//!
//! Drives `ChannelSupportHost` through its public API the way the
//! transport and subsystems do.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use proptest::prelude::*;

use ozone_bridge::channel::{
    ChannelError, ChannelHandler, ChannelObserver, ChannelSender, ChannelSupportHost, HostId,
    Message, SendFn,
};
use ozone_bridge::dispatch::ThreadTaskRunner;
use ozone_bridge::utils::{metric_names, MetricsCollector};

#[derive(Default)]
struct Handler {
    established: Mutex<Vec<HostId>>,
    destroyed: Mutex<Vec<HostId>>,
    sender: Mutex<Option<ChannelSender>>,
}

impl ChannelHandler for Handler {
    fn on_channel_established(&self, host_id: HostId, sender: ChannelSender) {
        self.established.lock().push(host_id);
        *self.sender.lock() = Some(sender);
    }

    fn on_channel_destroyed(&self, host_id: HostId) {
        self.destroyed.lock().push(host_id);
        *self.sender.lock() = None;
    }

    fn on_message_received(&self, _message: &Message) -> bool {
        false
    }
}

#[derive(Default)]
struct Observer {
    transitions: Mutex<Vec<bool>>,
}

impl ChannelObserver for Observer {
    fn on_channel_established(&self) {
        self.transitions.lock().push(true);
    }

    fn on_channel_destroyed(&self) {
        self.transitions.lock().push(false);
    }
}

fn noop_send() -> SendFn {
    Arc::new(|_message: Message| {})
}

fn create_host() -> ChannelSupportHost {
    ChannelSupportHost::new(Arc::new(MetricsCollector::new()))
}

#[test]
fn test_handler_sends_through_bound_thread() {
    let runner = ThreadTaskRunner::spawn("integration-send").unwrap();
    let sent_on = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&sent_on);
    let send_fn: SendFn = Arc::new(move |message: Message| {
        log.lock()
            .push((message.msg_type, thread::current().name().map(str::to_string)));
    });

    let mut host = create_host();
    let handler = Arc::new(Handler::default());
    host.register_handler(handler.clone());
    host.on_channel_established(HostId(11), runner.clone(), send_fn)
        .unwrap();

    let sender = handler.sender.lock().clone().unwrap();
    let producer = thread::spawn(move || sender.send(Message::new(1, 42, b"hello".to_vec())));
    producer.join().unwrap().unwrap();
    runner.flush().unwrap();

    assert_eq!(
        *sent_on.lock(),
        vec![(42, Some("integration-send".to_string()))]
    );
    assert_eq!(
        handler.sender.lock().as_ref().map(|s| s.host_id()),
        Some(HostId(11))
    );
}

#[test]
fn test_worker_sender_fails_after_channel_destroyed() {
    let runner = ThreadTaskRunner::spawn("integration-stale").unwrap();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&sent);
    let send_fn: SendFn = Arc::new(move |message: Message| log.lock().push(message.msg_type));

    let mut host = create_host();
    let handler = Arc::new(Handler::default());
    host.register_handler(handler.clone());
    host.on_channel_established(HostId(3), runner.clone(), send_fn)
        .unwrap();
    let worker_sender = handler.sender.lock().clone().unwrap();

    host.on_channel_destroyed(HostId(3));
    let worker = thread::spawn(move || worker_sender.send(Message::new(0, 77, Vec::new())));

    assert_eq!(worker.join().unwrap(), Err(ChannelError::NotConnected));
    runner.flush().unwrap();
    assert!(sent.lock().is_empty());
    assert_eq!(*handler.destroyed.lock(), vec![HostId(3)]);
}

#[test]
fn test_observer_sees_lifecycle_and_late_registration() {
    let runner = ThreadTaskRunner::spawn("integration-observer").unwrap();
    let mut host = create_host();
    let early = Arc::new(Observer::default());
    host.add_channel_observer(early.clone());

    host.on_channel_established(HostId(1), runner.clone(), noop_send())
        .unwrap();
    let late = Arc::new(Observer::default());
    host.add_channel_observer(late.clone());
    host.on_channel_destroyed(HostId(1));

    assert_eq!(*early.transitions.lock(), vec![true, false]);
    assert_eq!(*late.transitions.lock(), vec![true, false]);
    assert_eq!(host.observer_count(), 2);
}

#[test]
fn test_protocol_violations_are_counted() {
    let runner = ThreadTaskRunner::spawn("integration-violations").unwrap();
    let mut host = create_host();

    assert!(!host.on_channel_destroyed(HostId(3)));
    host.on_channel_established(HostId(3), runner.clone(), noop_send())
        .unwrap();
    assert_eq!(
        host.on_channel_established(HostId(3), runner.clone(), noop_send()),
        Err(ChannelError::AlreadyEstablished(HostId(3)))
    );
    host.on_channel_established(HostId(4), runner, noop_send())
        .unwrap();

    let metrics = host.metrics();
    assert_eq!(metrics.counter(metric_names::CHANNEL_STALE_DESTROYS), 1);
    assert_eq!(metrics.counter(metric_names::CHANNEL_PROTOCOL_VIOLATIONS), 2);
    assert_eq!(metrics.counter(metric_names::CHANNELS_ESTABLISHED), 2);
    assert_eq!(metrics.counter(metric_names::CHANNELS_DESTROYED), 1);
}

#[derive(Debug, Clone)]
enum Op {
    Establish(i32),
    Destroy(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4i32).prop_map(Op::Establish),
        (0..4i32).prop_map(Op::Destroy),
    ]
}

proptest! {
    #[test]
    fn prop_send_fails_whenever_disconnected(
        ops in prop::collection::vec(op_strategy(), 0..24),
        routing_id in any::<u32>(),
        msg_type in any::<u32>(),
        payload in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let runner = ThreadTaskRunner::spawn("prop-send").unwrap();
        let mut host = create_host();
        let mut model: Option<i32> = None;

        for op in ops {
            match op {
                Op::Establish(id) => {
                    let result = host.on_channel_established(HostId(id), runner.clone(), noop_send());
                    prop_assert_eq!(result.is_err(), model == Some(id));
                    model = Some(id);
                }
                Op::Destroy(id) => {
                    let destroyed = host.on_channel_destroyed(HostId(id));
                    prop_assert_eq!(destroyed, model == Some(id));
                    if destroyed {
                        model = None;
                    }
                }
            }

            prop_assert_eq!(host.is_connected(), model.is_some());
            let sent = host.send(Message::new(routing_id, msg_type, payload.clone()));
            if host.is_connected() {
                prop_assert!(sent.is_ok());
            } else {
                prop_assert_eq!(sent, Err(ChannelError::NotConnected));
            }
        }
    }

    #[test]
    fn prop_registration_is_deduplicated(
        registrations in prop::collection::vec(0..4usize, 0..16),
        establish_at in 0..17usize,
    ) {
        let runner = ThreadTaskRunner::spawn("prop-register").unwrap();
        let pool: Vec<Arc<Handler>> = (0..4).map(|_| Arc::new(Handler::default())).collect();
        let mut host = create_host();
        let establish_at = establish_at.min(registrations.len());

        for (position, index) in registrations.iter().enumerate() {
            if position == establish_at {
                host.on_channel_established(HostId(9), runner.clone(), noop_send()).unwrap();
            }
            host.register_handler(pool[*index].clone());
        }
        if establish_at == registrations.len() {
            host.on_channel_established(HostId(9), runner.clone(), noop_send()).unwrap();
        }

        let mut distinct = registrations.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(host.handler_count(), distinct.len());

        for (index, handler) in pool.iter().enumerate() {
            let expected = if distinct.contains(&index) { vec![HostId(9)] } else { Vec::new() };
            prop_assert_eq!(handler.established.lock().clone(), expected);
        }
    }
}
