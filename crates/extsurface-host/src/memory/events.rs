//! In-memory event bus.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use extsurface_core::Value;
use extsurface_core::sync::lock;
use indexmap::IndexMap;

use crate::bridge::EventHost;
use crate::error::HostResult;
use crate::types::{EventCallback, SubscriptionId};

struct Subscription {
    event: String,
    callback: EventCallback,
}

/// Event host with synchronous delivery.
#[derive(Default)]
pub struct MemoryEventHost {
    subscriptions: Mutex<IndexMap<SubscriptionId, Subscription>>,
    next_id: AtomicU64,
}

impl MemoryEventHost {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every subscriber of `event`.
    ///
    /// Callbacks run in subscription order with no lock held, so they may
    /// subscribe or unsubscribe. Returns the number of callbacks invoked.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        let callbacks: Vec<EventCallback> = lock(&self.subscriptions)
            .values()
            .filter(|sub| sub.event == event)
            .map(|sub| sub.callback.clone())
            .collect();
        tracing::trace!(target: "extsurface::host", event, subscribers = callbacks.len(), "Emitting event");
        for callback in &callbacks {
            callback(payload);
        }
        callbacks.len()
    }

    /// Number of subscribers of `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        lock(&self.subscriptions)
            .values()
            .filter(|sub| sub.event == event)
            .count()
    }
}

impl std::fmt::Debug for MemoryEventHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventHost")
            .field("subscriptions", &lock(&self.subscriptions).len())
            .finish()
    }
}

impl EventHost for MemoryEventHost {
    fn subscribe(&self, event: &str, callback: EventCallback) -> HostResult<SubscriptionId> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.subscriptions).insert(
            id,
            Subscription {
                event: event.to_string(),
                callback,
            },
        );
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> HostResult<()> {
        lock(&self.subscriptions).shift_remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_matching_subscribers() {
        let bus = MemoryEventHost::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let id = bus
            .subscribe(
                "theme_changed",
                Arc::new(move |_: &Value| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        bus.subscribe("other", Arc::new(|_: &Value| panic!("wrong event")))
            .unwrap();

        assert_eq!(bus.emit("theme_changed", &Value::Null), 1);
        bus.unsubscribe(id).unwrap();
        assert_eq!(bus.emit("theme_changed", &Value::Null), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_may_unsubscribe() {
        let bus = Arc::new(MemoryEventHost::new());
        let inner = Arc::clone(&bus);
        let slot = Arc::new(Mutex::new(None));
        let own = Arc::clone(&slot);
        let id = bus
            .subscribe(
                "tick",
                Arc::new(move |_: &Value| {
                    if let Some(id) = *lock(&own) {
                        inner.unsubscribe(id).unwrap();
                    }
                }),
            )
            .unwrap();
        *lock(&slot) = Some(id);

        assert_eq!(bus.emit("tick", &Value::Null), 1);
        assert_eq!(bus.subscriber_count("tick"), 0);
    }
}
