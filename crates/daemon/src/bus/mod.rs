// Per-script publish/subscribe bus for service events.
//
// Topics are script identities. Each subscriber owns an unbounded FIFO
// queue, so events for one script are observed in publish order while
// different scripts drain independently. Publishing and disposal take the
// same lock: once `Subscription::dispose` returns, nothing new is queued
// for that subscriber.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use scriptpad_common::protocol::events::ServiceEvent;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<ServiceEvent>,
}

#[derive(Default)]
struct BusInner {
    topics: Mutex<HashMap<Uuid, Vec<Subscriber>>>,
    next_subscription_id: AtomicU64,
}

impl BusInner {
    fn unsubscribe(&self, script_id: Uuid, subscription_id: u64) {
        let mut topics = self.topics.lock().expect("event bus lock poisoned");
        if let Some(subscribers) = topics.get_mut(&script_id) {
            subscribers.retain(|subscriber| subscriber.id != subscription_id);
            if subscribers.is_empty() {
                topics.remove(&script_id);
            }
        }
    }
}

/// Cheap to clone; clones share the same topics.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events addressed to `script_id`.
    pub fn subscribe(&self, script_id: Uuid) -> (Subscription, mpsc::UnboundedReceiver<ServiceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .topics
            .lock()
            .expect("event bus lock poisoned")
            .entry(script_id)
            .or_default()
            .push(Subscriber { id, tx });

        debug!(script_id = %script_id, subscription_id = id, "subscribed to script events");
        let subscription = Subscription {
            bus: Arc::downgrade(&self.inner),
            script_id,
            id,
            disposed: AtomicBool::new(false),
        };
        (subscription, rx)
    }

    /// Queue `event` for every subscriber of its script. Returns how many
    /// subscribers it reached; zero means the event was dropped.
    pub fn publish(&self, event: ServiceEvent) -> usize {
        let script_id = event.script_id();
        let mut topics = self.inner.topics.lock().expect("event bus lock poisoned");
        let Some(subscribers) = topics.get_mut(&script_id) else {
            debug!(script_id = %script_id, kind = event.kind(), "no subscriber for script, event dropped");
            return 0;
        };

        // Receivers that went away without disposing are pruned here.
        subscribers.retain(|subscriber| subscriber.tx.send(event.clone()).is_ok());
        let reached = subscribers.len();
        if reached == 0 {
            topics.remove(&script_id);
        }
        reached
    }

    pub fn subscriber_count(&self, script_id: Uuid) -> usize {
        self.inner
            .topics
            .lock()
            .expect("event bus lock poisoned")
            .get(&script_id)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = self.inner.topics.lock().expect("event bus lock poisoned").len();
        f.debug_struct("EventBus").field("topics", &topics).finish()
    }
}

/// Handle to one bus subscription. Disposing is idempotent and also happens
/// on drop.
pub struct Subscription {
    bus: Weak<BusInner>,
    script_id: Uuid,
    id: u64,
    disposed: AtomicBool,
}

impl Subscription {
    pub fn script_id(&self) -> Uuid {
        self.script_id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.script_id, self.id);
        }
        debug!(script_id = %self.script_id, subscription_id = self.id, "subscription disposed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("script_id", &self.script_id)
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
