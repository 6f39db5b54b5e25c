//! Type-erased callback wrappers stored by the bus.

use std::{fmt, rc::Rc};

use mbe_handle::Handle;

use crate::event::{Envelope, Event, EventTypeId};

/// Identifies a subscription; pass it back to unsubscribe.
///
/// Ids belong to the bus that issued them. Every bus carries its own tag,
/// and another bus treats a foreign id as unknown.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    bus: u32,
    handle: Handle<Subscriber>,
}

impl SubscriptionId {
    pub(crate) const fn new(bus: u32, handle: Handle<Subscriber>) -> Self {
        Self { bus, handle }
    }

    /// Tag of the bus that issued this id.
    #[must_use]
    pub const fn bus(self) -> u32 {
        self.bus
    }

    pub(crate) const fn handle(self) -> Handle<Subscriber> {
        self.handle
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({}@{})", self.handle, self.bus)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.handle, self.bus)
    }
}

/// Type-erased callback.
pub(crate) type ErasedCallback = Rc<dyn Fn(&Envelope<'_>)>;

/// A registered callback, erased over its event type.
///
/// Only reachable through a [`SubscriptionId`] of the bus storing it.
pub struct Subscriber {
    /// Event type this subscriber handles.
    pub(crate) event_type: EventTypeId,
    /// The callback, adapted to take an envelope.
    pub(crate) callback: ErasedCallback,
}

impl Subscriber {
    /// Wrap a typed callback.
    pub(crate) fn new<E, F>(callback: F) -> Self
    where
        E: Event,
        F: Fn(&E) + 'static,
    {
        Self {
            event_type: EventTypeId::of::<E>(),
            callback: Rc::new(move |envelope: &Envelope<'_>| {
                // Buckets are keyed by type, so a mismatch means a routing bug.
                debug_assert_eq!(envelope.type_id(), EventTypeId::of::<E>());
                if let Some(event) = envelope.downcast::<E>() {
                    callback(event);
                }
            }),
        }
    }

    /// Event type this subscriber handles.
    #[must_use]
    pub const fn event_type(&self) -> EventTypeId {
        self.event_type
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Damage {
        amount: u32,
    }

    #[test]
    fn test_subscriber_adapter() {
        let total = Rc::new(Cell::new(0));
        let sink = Rc::clone(&total);

        let subscriber = Subscriber::new(move |event: &Damage| {
            sink.set(sink.get() + event.amount);
        });
        assert_eq!(subscriber.event_type(), EventTypeId::of::<Damage>());

        let event = Damage { amount: 42 };
        (subscriber.callback)(&Envelope::new(&event));

        assert_eq!(total.get(), 42);
    }
}
