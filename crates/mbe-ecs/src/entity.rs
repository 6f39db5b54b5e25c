//! Entities: components, group tags and a parent/child tree.

use std::{collections::BTreeSet, fmt};

use mbe_handle::Handle;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    component::{Component, ComponentTypeId, Frame},
    error::{EcsError, Result},
    registry::View,
};

/// Handle naming an entity inside its [`EntityManager`](crate::EntityManager).
pub type EntityId = Handle<Entity>;

/// A component instance owned by an entity.
struct Owned {
    type_id: ComponentTypeId,
    ptr: *mut dyn Component,
}

/// Aggregate of components with group tags and tree links.
///
/// Entities are created and owned by an
/// [`EntityManager`](crate::EntityManager); read access goes through
/// [`EntityManager::entity`](crate::EntityManager::entity) and mutation
/// through [`EntityMut`](crate::EntityMut).
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) active: bool,
    /// Owned components in insertion order.
    components: Vec<Owned>,
    /// Views of owned components, keyed by their own type and every
    /// declared ancestor.
    by_type: FxHashMap<ComponentTypeId, View>,
    pub(crate) groups: SmallVec<[String; 2]>,
    pub(crate) parent: EntityId,
    pub(crate) children: BTreeSet<EntityId>,
}

impl Entity {
    pub(crate) fn new() -> Self {
        Self {
            id: EntityId::NULL,
            active: true,
            components: Vec::new(),
            by_type: FxHashMap::default(),
            groups: SmallVec::new(),
            parent: EntityId::NULL,
            children: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// `false` once destroyed; inactive entities are released by the next
    /// [`commit_pending_removals`](crate::EntityManager::commit_pending_removals).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Component registered as `C`, which may be a concrete type or an
    /// interface such as `dyn Drawable`.
    pub fn get_component<C: ?Sized + 'static>(&self) -> Result<&C> {
        let ptr = self.view::<C>()?;
        // SAFETY: the view points into a component owned by `self`, freed
        // only when `self` drops. The shared borrow of `self` rules out a
        // concurrent `&mut` from `get_component_mut` or `update`.
        Ok(unsafe { &*ptr })
    }

    /// Mutable variant of [`get_component`](Self::get_component).
    pub fn get_component_mut<C: ?Sized + 'static>(&mut self) -> Result<&mut C> {
        let ptr = self.view::<C>()?;
        // SAFETY: as in `get_component`; the exclusive borrow of `self`
        // makes this the only live reference into the entity's components.
        Ok(unsafe { &mut *ptr })
    }

    #[must_use]
    pub fn has_component<C: ?Sized + 'static>(&self) -> bool {
        self.by_type.contains_key(&ComponentTypeId::of::<C>())
    }

    /// Concrete types of the owned components, in insertion order.
    pub fn component_type_ids(&self) -> impl ExactSizeIterator<Item = ComponentTypeId> + '_ {
        self.components.iter().map(|owned| owned.type_id)
    }

    /// Number of owned components (not counting ancestor keys).
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether the entity carries the (case-insensitive) group tag.
    #[must_use]
    pub fn is_in_group(&self, group: &str) -> bool {
        let group = normalise_group(group);
        self.groups.iter().any(|tag| *tag == group)
    }

    /// Group tags, lowercased.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Parent entity, or [`EntityId::NULL`].
    #[must_use]
    pub const fn parent(&self) -> EntityId {
        self.parent
    }

    #[must_use]
    pub const fn children(&self) -> &BTreeSet<EntityId> {
        &self.children
    }

    /// First of `keys` already registered on this entity.
    pub(crate) fn conflicting_key(&self, keys: &[ComponentTypeId]) -> Option<ComponentTypeId> {
        keys.iter().copied().find(|key| self.by_type.contains_key(key))
    }

    /// Take ownership of `component` and register its views.
    ///
    /// The caller has checked that no key in `views` is present.
    pub(crate) fn insert<C: Component>(
        &mut self,
        component: C,
        views: impl FnOnce(*mut C) -> Vec<(ComponentTypeId, View)>,
    ) -> *mut C {
        let ptr = Box::into_raw(Box::new(component));
        for (key, view) in views(ptr) {
            let previous = self.by_type.insert(key, view);
            debug_assert!(previous.is_none(), "component key {key:?} registered twice");
        }
        self.components.push(Owned {
            type_id: ComponentTypeId::of_component::<C>(),
            ptr,
        });
        ptr
    }

    /// Run [`Component::update`] on every component in insertion order.
    pub(crate) fn update_components(&mut self, frame: &Frame<'_>) {
        for owned in &self.components {
            // SAFETY: `owned.ptr` came from `Box::into_raw` in `insert` and
            // stays allocated until drop; `&mut self` makes this the only
            // reference into the component.
            unsafe { &mut *owned.ptr }.update(frame);
        }
    }

    fn view<C: ?Sized + 'static>(&self) -> Result<*mut C> {
        self.by_type
            .get(&ComponentTypeId::of::<C>())
            .and_then(|view| view.downcast_ref::<*mut C>())
            .copied()
            .ok_or(EcsError::ComponentNotFound {
                entity: self.id,
                component: std::any::type_name::<C>(),
            })
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        self.by_type.clear();
        for owned in self.components.drain(..) {
            // SAFETY: allocated by `Box::into_raw` in `insert` and freed only
            // here; the views pointing into it were cleared above.
            drop(unsafe { Box::from_raw(owned.ptr) });
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("active", &self.active)
            .field(
                "components",
                &self.components.iter().map(|owned| owned.type_id).collect::<Vec<_>>(),
            )
            .field("groups", &self.groups)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

/// Group tags compare case-insensitively (ASCII).
pub(crate) fn normalise_group(group: &str) -> String {
    group.to_ascii_lowercase()
}
