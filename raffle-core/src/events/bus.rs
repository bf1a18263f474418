//! Event bus with per-subscriber bounded queues.

use raffle_sdk::objects::RaffleEvent;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::Stream;
use tracing::{debug, trace};

/// Queue slots per subscriber.
///
/// Small on purpose: a client that falls this far behind is better served by
/// the next full `state` event than by a backlog.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 4;

/// Identifies one subscription within an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<SubscriberId, mpsc::Sender<RaffleEvent>>,
    /// Bumped on every `state` broadcast.
    generation: u64,
}

struct BusInner {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl BusInner {
    /// The registry is only touched by non-panicking code, so a poisoned
    /// lock still holds a usable map.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.lock().subscribers.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, "Unregistered subscriber");
        }
        removed
    }
}

/// Fans events out to every registered [`Subscription`].
///
/// Cloning is cheap and every clone shares the same subscriber set.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: Mutex::new(Registry::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Number of `state` events broadcast so far.
    ///
    /// Read this before building a snapshot and pass it to
    /// [`register_at`](Self::register_at) to detect a newer state having
    /// been published in the meantime.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Register a subscriber whose first item is `first`.
    ///
    /// `first` is queued before the subscriber joins the set, so no
    /// broadcast can overtake it.
    pub fn register(&self, first: RaffleEvent) -> Subscription {
        let mut registry = self.inner.lock();
        self.insert(&mut registry, first)
    }

    /// Register like [`register`](Self::register), but only if no `state`
    /// event has been broadcast since `generation` was read.
    ///
    /// On a stale generation `first` is handed back unchanged.
    pub fn register_at(&self, generation: u64, first: RaffleEvent) -> Result<Subscription, RaffleEvent> {
        let mut registry = self.inner.lock();
        if registry.generation != generation {
            return Err(first);
        }
        Ok(self.insert(&mut registry, first))
    }

    fn insert(&self, registry: &mut Registry, first: RaffleEvent) -> Subscription {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        // A fresh channel always has room for one item.
        let _ = tx.try_send(first);
        registry.subscribers.insert(id, tx);
        debug!(subscriber = %id, total = registry.subscribers.len(), "Registered subscriber");
        Subscription {
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscriber and close its stream.
    ///
    /// Items already queued can still be read; after them the stream ends.
    /// Returns `false` if it was not registered (idempotent).
    pub fn unregister(&self, id: SubscriberId) -> bool {
        self.inner.remove(id)
    }

    /// Deliver `event` to every current subscriber without waiting.
    ///
    /// A subscriber with a full queue misses this event. Subscribers whose
    /// receiving side is gone are pruned. Returns how many subscribers
    /// accepted the event.
    pub fn broadcast(&self, event: RaffleEvent) -> usize {
        let name = event.name();
        let mut registry = self.inner.lock();
        if matches!(event, RaffleEvent::State(_)) {
            registry.generation += 1;
        }

        let mut delivered = 0;
        registry.subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(subscriber = %id, event = name, "Subscriber queue full, dropping event");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        trace!(event = name, delivered, "Broadcast event");
        delivered
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live-update listener.
///
/// Yields events in broadcast order. Dropping it unregisters it from the
/// bus.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<RaffleEvent>,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. `None` once unregistered and drained.
    pub async fn recv(&mut self) -> Option<RaffleEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<RaffleEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = RaffleEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raffle_sdk::objects::{EventError, RaffleState};
    use tokio_stream::StreamExt;

    fn state() -> RaffleEvent {
        RaffleEvent::State(RaffleState::default())
    }

    fn error(message: &str) -> RaffleEvent {
        RaffleEvent::Error(EventError::conflict(message))
    }

    #[tokio::test]
    async fn test_first_item_is_registration_event() {
        let bus = EventBus::new();
        let mut sub = bus.register(state());
        bus.broadcast(error("later"));

        assert_eq!(sub.recv().await, Some(state()));
        assert_eq!(sub.recv().await, Some(error("later")));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let bus = EventBus::new();
        let mut a = bus.register(state());
        let mut b = bus.register(state());

        assert_eq!(bus.broadcast(error("x")), 2);
        for sub in [&mut a, &mut b] {
            assert_eq!(sub.recv().await, Some(state()));
            assert_eq!(sub.recv().await, Some(error("x")));
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking_others() {
        let bus = EventBus::new();
        let mut stalled = bus.register(state());
        let mut reader = bus.register(state());
        assert_eq!(reader.recv().await, Some(state()));

        for i in 0..10 {
            let event = error(&format!("event {i}"));
            bus.broadcast(event.clone());
            assert_eq!(reader.recv().await, Some(event));
        }

        // The stalled queue kept the first CAPACITY items and lost the rest.
        let mut kept = Vec::new();
        while let Some(event) = stalled.try_recv() {
            kept.push(event);
        }
        assert_eq!(kept.len(), SUBSCRIBER_QUEUE_CAPACITY);
        assert_eq!(kept[0], state());
        assert_eq!(kept[1], error("event 0"));
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent_and_ends_stream() {
        let bus = EventBus::new();
        let mut sub = bus.register(state());
        bus.broadcast(error("queued"));

        assert!(bus.unregister(sub.id()));
        assert!(!bus.unregister(sub.id()));
        assert_eq!(bus.broadcast(error("after")), 0);

        assert_eq!(sub.next().await, Some(state()));
        assert_eq!(sub.next().await, Some(error("queued")));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let bus = EventBus::new();
        let sub = bus.register(state());
        let keep = bus.register(state());
        assert_eq!(bus.subscriber_count(), 2);

        let id = sub.id();
        drop(sub);
        assert_eq!(bus.subscriber_count(), 1);
        assert!(!bus.unregister(id));
        drop(keep);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_register_at_rejects_stale_generation() {
        let bus = EventBus::new();
        let generation = bus.generation();
        bus.broadcast(error("errors do not bump"));
        assert_eq!(bus.generation(), generation);

        bus.broadcast(state());
        let rejected = bus.register_at(generation, state());
        assert_eq!(rejected.err(), Some(state()));
        assert_eq!(bus.subscriber_count(), 0);

        let accepted = bus.register_at(bus.generation(), state());
        assert!(accepted.is_ok());
        assert_eq!(bus.subscriber_count(), 1);
    }
}
