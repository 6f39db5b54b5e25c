//! Component trait and per-type keys.
//!
//! Components are the units of data and behaviour an entity is built from.
//! Every component type, and every interface (`dyn Trait`) a component can be
//! looked up through, is keyed by a [`ComponentTypeId`].

use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
    time::Duration,
};

use mbe_event::EventBus;

use crate::{entity::EntityId, registry::ComponentBases};

/// Data and behaviour attached to an entity.
///
/// Usually implemented through `#[derive(Component)]`, which also fills in
/// [`declare_bases`](Self::declare_bases) from `#[component(bases(...))]`.
///
/// ```ignore
/// trait Drawable {
///     fn layer(&self) -> i32;
/// }
///
/// #[derive(Component)]
/// #[component(bases(dyn Drawable))]
/// struct Sprite { layer: i32 }
///
/// impl Drawable for Sprite {
///     fn layer(&self) -> i32 { self.layer }
/// }
/// ```
pub trait Component: 'static {
    /// Advance this component by one frame. Does nothing by default.
    fn update(&mut self, frame: &Frame<'_>) {
        let _ = frame;
    }

    /// Declare the types this component can also be looked up as.
    ///
    /// Called once per registry, the first time the component is added.
    /// The declarations apply to this component type only.
    fn declare_bases(bases: &mut ComponentBases)
    where
        Self: Sized,
    {
        let _ = bases;
    }

    /// Stable name of the component type, used in errors and by serialisers.
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

/// Context passed to [`Component::update`].
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Time elapsed since the previous update.
    pub delta: Duration,
    /// Entity owning the component being updated.
    pub owner: EntityId,
    /// Bus of the manager running the update.
    pub events: &'a EventBus,
}

/// Stable key of a component or interface type.
///
/// Equality and hashing use only the [`TypeId`]; the name is for display.
#[derive(Clone, Copy)]
pub struct ComponentTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// Key of any `'static` type, including `dyn Trait`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Key of a component type, named by [`Component::type_name`].
    #[must_use]
    pub fn of_component<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: C::type_name(),
        }
    }

    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentTypeId {}

impl Hash for ComponentTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.name)
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
