//! Typed, synchronous publish/subscribe.
//!
//! [`EventBus`] keys handlers by the event's [`TypeId`]. Raising an event
//! snapshots the handler list under a read lock and then invokes every
//! handler on the raising thread with the lock released, so a handler may
//! itself subscribe, unsubscribe, or raise without deadlocking.

use std::any::{Any, TypeId};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::id::SubscriptionId;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    /// Always a `Handler<T>` for the `TypeId` this entry is filed under.
    handler: Box<dyn Any + Send + Sync>,
}

/// In-process event bus.
///
/// # Examples
///
/// ```
/// use prospect_core::EventBus;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// struct Ping(u32);
///
/// let bus = EventBus::new();
/// let total = Arc::new(AtomicU32::new(0));
/// let sink = Arc::clone(&total);
/// let id = bus.subscribe(move |p: &Ping| {
///     sink.fetch_add(p.0, Ordering::Relaxed);
/// });
///
/// assert_eq!(bus.raise(Ping(3)), 1);
/// assert!(bus.unsubscribe::<Ping>(id));
/// assert_eq!(bus.raise(Ping(3)), 0);
/// assert_eq!(total.load(Ordering::Relaxed), 3);
/// ```
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<IndexMap<TypeId, Vec<Subscription>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of type `T`.
    pub fn subscribe<T, H>(&self, handler: H) -> SubscriptionId
    where
        T: 'static,
        H: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId::next();
        let handler: Handler<T> = Arc::new(handler);
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Subscription {
                id,
                handler: Box::new(handler),
            });
        id
    }

    /// Remove a handler. Returns `false` if `id` was not subscribed to `T`.
    pub fn unsubscribe<T: 'static>(&self, id: SubscriptionId) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(&TypeId::of::<T>()) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        before != list.len()
    }

    /// Deliver `event` to every current subscriber of `T`.
    ///
    /// Returns the number of handlers invoked.
    pub fn raise<T: 'static>(&self, event: T) -> usize {
        let snapshot: Vec<Handler<T>> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            match handlers.get(&TypeId::of::<T>()) {
                Some(list) => list
                    .iter()
                    .filter_map(|s| s.handler.downcast_ref::<Handler<T>>().cloned())
                    .collect(),
                None => Vec::new(),
            }
        };
        for handler in &snapshot {
            handler(&event);
        }
        snapshot.len()
    }

    /// Number of live subscriptions for `T`.
    pub fn subscriber_count<T: 'static>(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .map_or(0, Vec::len)
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let dropped: usize = handlers.values().map(Vec::len).sum();
        handlers.clear();
        tracing::debug!(dropped, "event bus cleared");
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventBus")
            .field("event_types", &handlers.len())
            .field(
                "subscriptions",
                &handlers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}
