//! Event marker trait and the type-erased envelope events travel in.
//!
//! Any `'static` type can be raised as an event. Nothing has to inherit
//! from a common base: the bus wraps the value in an [`Envelope`] that
//! carries the event's type key next to a `&dyn Any` view of it.

use core::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

/// Marker trait for event types.
///
/// Blanket-implemented for every `'static` type.
pub trait Event: 'static {}

impl<T: 'static> Event for T {}

/// Type key identifying an event type on the bus.
///
/// Derived from [`TypeId`], so it does not depend on the order in which
/// event types are first used. The name is kept for diagnostics only.
#[derive(Clone, Copy)]
pub struct EventTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl EventTypeId {
    /// The key for event type `E`.
    #[must_use]
    pub fn of<E: Event>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            name: core::any::type_name::<E>(),
        }
    }

    /// The underlying Rust type id.
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.type_id
    }

    /// Type name for debugging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EventTypeId {}

impl Hash for EventTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for EventTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventTypeId({})", self.name)
    }
}

/// A raised event, erased to `&dyn Any` and tagged with its type key.
pub struct Envelope<'a> {
    type_id: EventTypeId,
    event: &'a dyn Any,
}

impl<'a> Envelope<'a> {
    /// Wrap `event`.
    #[must_use]
    pub fn new<E: Event>(event: &'a E) -> Self {
        Self {
            type_id: EventTypeId::of::<E>(),
            event,
        }
    }

    /// Type key of the wrapped event.
    #[must_use]
    pub const fn type_id(&self) -> EventTypeId {
        self.type_id
    }

    /// Recover the typed event, or `None` if it is not an `E`.
    #[must_use]
    pub fn downcast<E: Event>(&self) -> Option<&'a E> {
        self.event.downcast_ref()
    }
}

impl fmt::Debug for Envelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clicked {
        button: u8,
    }

    struct Hovered;

    #[test]
    fn test_event_type_id() {
        assert_eq!(EventTypeId::of::<Clicked>(), EventTypeId::of::<Clicked>());
        assert_ne!(EventTypeId::of::<Clicked>(), EventTypeId::of::<Hovered>());
        assert!(EventTypeId::of::<Clicked>().name().ends_with("Clicked"));
    }

    #[test]
    fn test_any_type_is_event() {
        fn assert_event<T: Event>() {}

        assert_event::<Clicked>();
        assert_event::<i32>();
        assert_event::<String>();
    }

    #[test]
    fn test_envelope_downcast() {
        let event = Clicked { button: 2 };
        let envelope = Envelope::new(&event);

        assert_eq!(envelope.type_id(), EventTypeId::of::<Clicked>());
        assert_eq!(envelope.downcast::<Clicked>().map(|e| e.button), Some(2));
        assert!(envelope.downcast::<Hovered>().is_none());
    }
}
