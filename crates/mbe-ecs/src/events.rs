//! Events raised by the entity manager.

use std::{fmt, marker::PhantomData};

use crate::entity::EntityId;

/// An entity was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityCreated {
    pub entity: EntityId,
}

/// An inactive entity was released by
/// [`commit_pending_removals`](crate::EntityManager::commit_pending_removals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRemoved {
    pub entity: EntityId,
}

/// A component was added to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentsChanged {
    pub entity: EntityId,
}

impl fmt::Display for EntityCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity created: {}", self.entity)
    }
}

impl fmt::Display for EntityRemoved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity removed: {}", self.entity)
    }
}

impl fmt::Display for ComponentsChanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "components changed: {}", self.entity)
    }
}

/// A named value of component `C` on `entity` changed.
///
/// Components raise this themselves, typically from
/// [`Component::update`](crate::Component::update) through
/// [`Frame::events`](crate::Frame::events). The value name is lowercased.
pub struct ComponentValueChanged<C: ?Sized> {
    entity: EntityId,
    value: String,
    _component: PhantomData<fn() -> C>,
}

impl<C: ?Sized> ComponentValueChanged<C> {
    #[must_use]
    pub fn new(entity: EntityId, value: &str) -> Self {
        Self {
            entity,
            value: value.to_ascii_lowercase(),
            _component: PhantomData,
        }
    }

    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Name of the changed value, lowercased.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the changed value is `value` (case-insensitive).
    #[must_use]
    pub fn is_value_changed(&self, value: &str) -> bool {
        self.value.eq_ignore_ascii_case(value)
    }
}

impl<C: ?Sized> Clone for ComponentValueChanged<C> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity,
            value: self.value.clone(),
            _component: PhantomData,
        }
    }
}

impl<C: ?Sized> fmt::Debug for ComponentValueChanged<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentValueChanged")
            .field("component", &std::any::type_name::<C>())
            .field("entity", &self.entity)
            .field("value", &self.value)
            .finish()
    }
}
