//! Ordered re-dispatch of SDK callbacks to a single event sink.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use rtc_bridge_ipc::RtcEvent;

use crate::sdk::RtcEventHandler;

/// Destination for outgoing events.
pub trait EventSink: Send + Sync {
    fn send(&self, event: RtcEvent);
}

impl EventSink for Sender<RtcEvent> {
    fn send(&self, event: RtcEvent) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = event.event_type(), "Event channel full, dropping event");
            }
            Err(TrySendError::Disconnected(event)) => {
                debug!(event = event.event_type(), "Event channel closed, dropping event");
            }
        }
    }
}

/// A unit of work posted to the delivery context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The single execution context events are delivered on.
///
/// Implementations must run tasks one at a time, in the order posted.
pub trait DeliveryContext: Send + Sync {
    fn post(&self, task: Task);
}

/// A dedicated thread draining a FIFO task queue.
pub struct DeliveryThread {
    task_tx: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

impl DeliveryThread {
    /// Spawn the delivery thread.
    pub fn spawn() -> std::io::Result<Self> {
        let (task_tx, task_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("rtc-bridge-events".to_string())
            .spawn(move || delivery_loop(task_rx))?;

        Ok(Self {
            task_tx: Some(task_tx),
            handle: Some(handle),
        })
    }
}

fn delivery_loop(task_rx: Receiver<Task>) {
    debug!("Delivery thread starting");
    for task in task_rx {
        task();
    }
    debug!("Delivery thread stopped");
}

impl DeliveryContext for DeliveryThread {
    fn post(&self, task: Task) {
        let Some(task_tx) = self.task_tx.as_ref() else {
            return;
        };
        if task_tx.send(task).is_err() {
            warn!("Delivery thread gone, dropping task");
        }
    }
}

impl Drop for DeliveryThread {
    fn drop(&mut self) {
        // Closing the queue lets the thread drain what is left and exit.
        self.task_tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

/// Forwards events from any thread to the subscribed sink, preserving the
/// order in which they were emitted.
///
/// This is a broadcast, not a queue: events emitted while nobody is
/// subscribed are discarded and never replayed.
pub struct EventRelay {
    sink: RwLock<Option<Arc<dyn EventSink>>>,
    context: Arc<dyn DeliveryContext>,
}

impl EventRelay {
    /// Create a relay delivering on `context`.
    pub fn new(context: Arc<dyn DeliveryContext>) -> Self {
        Self {
            sink: RwLock::new(None),
            context,
        }
    }

    /// Install `sink`, replacing any previous subscriber.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        *self.sink.write() = Some(sink);
        debug!("Event sink subscribed");
    }

    /// Remove the current subscriber.
    pub fn unsubscribe(&self) {
        *self.sink.write() = None;
        debug!("Event sink unsubscribed");
    }

    /// Whether a sink is installed.
    pub fn has_subscriber(&self) -> bool {
        self.sink.read().is_some()
    }

    /// Emit an event. Safe to call from any thread.
    pub fn emit(&self, event: RtcEvent) {
        // Posting under the read lock keeps the queue order equal to the
        // emission order.
        let guard = self.sink.read();
        let Some(sink) = guard.as_ref() else {
            trace!(event = event.event_type(), "No subscriber, dropping event");
            return;
        };

        let sink = Arc::clone(sink);
        self.context.post(Box::new(move || sink.send(event)));
    }
}

impl RtcEventHandler for EventRelay {
    fn handle(&self, event: RtcEvent) {
        self.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rtc_bridge_ipc::event_channel;

    fn joined(uid: u32) -> RtcEvent {
        RtcEvent::UserJoined { uid, elapsed: 0 }
    }

    fn relay() -> EventRelay {
        EventRelay::new(Arc::new(DeliveryThread::spawn().unwrap()))
    }

    #[test]
    fn test_events_without_subscriber_are_not_replayed() {
        let relay = relay();
        relay.emit(joined(1));

        let (tx, rx) = event_channel();
        relay.subscribe(Arc::new(tx));
        relay.emit(joined(2));

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), joined(2));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let relay = relay();
        let (tx, rx) = event_channel();
        relay.subscribe(Arc::new(tx));
        assert!(relay.has_subscriber());

        relay.unsubscribe();
        relay.emit(joined(3));

        assert!(!relay.has_subscriber());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_subscribe_replaces_previous_sink() {
        let relay = relay();
        let (old_tx, old_rx) = event_channel();
        let (new_tx, new_rx) = event_channel();
        relay.subscribe(Arc::new(old_tx));
        relay.subscribe(Arc::new(new_tx));

        relay.emit(joined(4));

        assert_eq!(new_rx.recv_timeout(Duration::from_secs(2)).unwrap(), joined(4));
        assert!(old_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_order_preserved_across_threads() {
        let relay = Arc::new(relay());
        let (tx, rx) = event_channel();
        relay.subscribe(Arc::new(tx));

        let first = Arc::clone(&relay);
        thread::spawn(move || first.emit(joined(10))).join().unwrap();
        let second = Arc::clone(&relay);
        thread::spawn(move || second.emit(joined(11))).join().unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), joined(10));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), joined(11));
    }

    #[test]
    fn test_delivery_happens_on_one_thread() {
        let context = Arc::new(DeliveryThread::spawn().unwrap());
        let (id_tx, id_rx) = crossbeam_channel::unbounded();

        for _ in 0..3 {
            let id_tx = id_tx.clone();
            let ctx = Arc::clone(&context);
            thread::spawn(move || {
                ctx.post(Box::new(move || {
                    let _ = id_tx.send(thread::current().id());
                }))
            })
            .join()
            .unwrap();
        }

        let ids: Vec<_> = (0..3)
            .map(|_| id_rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_ne!(ids[0], thread::current().id());
    }

    #[test]
    fn test_relay_is_an_event_handler() {
        let relay = relay();
        let (tx, rx) = event_channel();
        relay.subscribe(Arc::new(tx));

        let handler: &dyn RtcEventHandler = &relay;
        handler.handle(RtcEvent::RequestToken {});

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            RtcEvent::RequestToken {}
        );
    }
}
