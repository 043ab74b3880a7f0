//! Event bus
//!
//! Fans domain events out to any number of subscribers. Every subscriber owns a single slot
//! holding the newest event it has not consumed yet: publishing overwrites that slot and never
//! waits, so a subscriber that falls behind sees only the latest event when it catches up.
//! This is lossy on purpose. A subscriber that keeps up observes every event in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chat_core::DomainEvent;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Per-subscriber conflation slot
#[derive(Debug, Default)]
struct Slot {
    latest: Mutex<Option<DomainEvent>>,
    notify: Notify,
    closed: AtomicBool,
}

impl Slot {
    /// Replace the pending event; returns true when an unconsumed event was dropped
    fn offer(&self, event: DomainEvent) -> bool {
        let dropped = self.latest.lock().replace(event).is_some();
        self.notify.notify_one();
        dropped
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }
}

/// Broadcast point between the interceptor and application code
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Weak<Slot>>>,
    closed: AtomicBool,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh, independent subscription. It sees events published from now on.
    pub fn subscribe(&self) -> Subscription {
        let slot = Arc::new(Slot::default());
        if self.is_closed() {
            slot.close();
        } else {
            self.subscribers.lock().push(Arc::downgrade(&slot));
        }
        Subscription { slot }
    }

    /// Hand `event` to every live subscriber without waiting on any of them.
    ///
    /// Returns how many subscribers it reached.
    pub fn publish(&self, event: DomainEvent) -> usize {
        if self.is_closed() {
            return 0;
        }

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|slot| slot.strong_count() > 0);

        let mut delivered = 0;
        for slot in subscribers.iter().filter_map(Weak::upgrade) {
            if slot.offer(event.clone()) {
                tracing::trace!(event_type = event.event_type(), "Conflated event for slow subscriber");
            }
            delivered += 1;
        }
        delivered
    }

    /// Live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    /// End every subscription. Pending events are still delivered before the end.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for slot in self.subscribers.lock().drain(..).filter_map(|slot| slot.upgrade()) {
            slot.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// One subscriber's view of the bus
#[derive(Debug)]
pub struct Subscription {
    slot: Arc<Slot>,
}

impl Subscription {
    /// Wait for the next event; `None` once the bus is closed and the slot is empty
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        loop {
            if let Some(event) = self.slot.latest.lock().take() {
                return Some(event);
            }
            if self.slot.closed.load(Ordering::Acquire) {
                return None;
            }
            self.slot.notify.notified().await;
        }
    }

    /// The pending event, if any, without waiting
    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        self.slot.latest.lock().take()
    }

    pub fn into_stream(self) -> BoxStream<'static, DomainEvent> {
        stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|event| (event, subscription))
        })
        .boxed()
    }
}
