//! The event bus.

use std::{
    cell::RefCell,
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU32, Ordering},
};

use mbe_handle::{Handle, HandleRegistry};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{
    event::{Envelope, Event, EventTypeId},
    subscriber::{Subscriber, SubscriptionId},
};

/// Source of bus tags, so ids from one bus never match another.
static NEXT_BUS_TAG: AtomicU32 = AtomicU32::new(0);

/// Shared bus state.
struct BusInner {
    tag: u32,
    /// Callback wrappers; their handles identify subscriptions.
    subscribers: HandleRegistry<Subscriber>,
    /// Subscriber handles per event type, in subscription order.
    buckets: FxHashMap<EventTypeId, Vec<Handle<Subscriber>>>,
}

impl Default for BusInner {
    fn default() -> Self {
        Self {
            tag: NEXT_BUS_TAG.fetch_add(1, Ordering::Relaxed),
            subscribers: HandleRegistry::new(),
            buckets: FxHashMap::default(),
        }
    }
}

impl BusInner {
    /// Subscriber handle of `id`, if this bus issued it.
    fn own(&self, id: SubscriptionId) -> Option<Handle<Subscriber>> {
        (id.bus() == self.tag).then(|| id.handle())
    }
}

/// Type-erased publish/subscribe bus.
///
/// Cloning is cheap and every clone talks to the same subscribers, so
/// callbacks can capture a clone and raise further events. The bus is
/// single-threaded (`!Send`).
///
/// # Dispatch
///
/// [`raise`](Self::raise) iterates a snapshot of the subscribers taken when
/// it starts. A callback subscribed during dispatch is first called by the
/// next raise. A callback unsubscribed during dispatch is skipped if it has
/// not run yet. Raising from inside a callback dispatches immediately,
/// nested inside the current dispatch.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of type `E`.
    pub fn subscribe<E, F>(&self, callback: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E) + 'static,
    {
        let event_type = EventTypeId::of::<E>();
        let mut inner = self.inner.borrow_mut();
        let handle = inner.subscribers.issue(Subscriber::new(callback));
        inner.buckets.entry(event_type).or_default().push(handle);
        let id = SubscriptionId::new(inner.tag, handle);

        debug!(subscription = %id, event = event_type.name(), "subscribed");
        id
    }

    /// Call every subscriber of `E` with `event`, in subscription order.
    ///
    /// Returns how many callbacks ran.
    pub fn raise<E: Event>(&self, event: &E) -> usize {
        let envelope = Envelope::new(event);

        let snapshot: SmallVec<[Handle<Subscriber>; 8]> = {
            let inner = self.inner.borrow();
            inner
                .buckets
                .get(&envelope.type_id())
                .map(|bucket| bucket.iter().copied().collect())
                .unwrap_or_default()
        };

        let mut invoked = 0;
        for handle in snapshot {
            // Re-resolve per call: an earlier callback may have unsubscribed it.
            let callback = {
                let inner = self.inner.borrow();
                match inner.subscribers.resolve(handle) {
                    Some(subscriber) => Rc::clone(&subscriber.callback),
                    None => continue,
                }
            };
            callback(&envelope);
            invoked += 1;
        }

        trace!(event = envelope.type_id().name(), invoked, "raised");
        invoked
    }

    /// Remove a subscription to `E`.
    ///
    /// Only the bucket for `E` is searched. Returns `false` if `id` is not a
    /// live subscription to `E` on this bus; unsubscribing twice is a no-op.
    pub fn unsubscribe<E: Event>(&self, id: SubscriptionId) -> bool {
        let event_type = EventTypeId::of::<E>();
        let mut inner = self.inner.borrow_mut();
        let Some(handle) = inner.own(id) else {
            return false;
        };

        let removed = inner
            .buckets
            .get_mut(&event_type)
            .is_some_and(|bucket| remove_handle(bucket, handle));
        if removed {
            inner.subscribers.release(handle);
            debug!(subscription = %id, event = event_type.name(), "unsubscribed");
        }
        removed
    }

    /// Remove a subscription without knowing its event type.
    ///
    /// Scans every bucket, so it costs more than
    /// [`unsubscribe`](Self::unsubscribe). Returns `false` for unknown or
    /// already removed ids, and for ids issued by another bus.
    pub fn unsubscribe_any(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(handle) = inner.own(id) else {
            return false;
        };

        let removed = inner
            .buckets
            .values_mut()
            .any(|bucket| remove_handle(bucket, handle));
        if removed {
            inner.subscribers.release(handle);
            debug!(subscription = %id, "unsubscribed");
        }
        removed
    }

    /// Whether `id` is a live subscription on this bus.
    #[must_use]
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        let inner = self.inner.borrow();
        inner
            .own(id)
            .is_some_and(|handle| inner.subscribers.is_valid(handle))
    }

    /// Number of live subscriptions to `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.inner
            .borrow()
            .buckets
            .get(&EventTypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Total number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Whether there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        let handles: Vec<Handle<Subscriber>> = inner.subscribers.handles().collect();
        for handle in handles {
            inner.subscribers.release(handle);
        }
        inner.buckets.clear();
        debug!("cleared all subscriptions");
    }
}

fn remove_handle(bucket: &mut Vec<Handle<Subscriber>>, handle: Handle<Subscriber>) -> bool {
    match bucket.iter().position(|&candidate| candidate == handle) {
        Some(position) => {
            bucket.remove(position);
            true
        }
        None => false,
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("tag", &inner.tag)
            .field("subscriptions", &inner.subscribers.len())
            .field("event_types", &inner.buckets.len())
            .finish()
    }
}
