//! The entity manager: creation, lookup, groups and deferred removal.

use std::time::Duration;

use mbe_event::EventBus;
use mbe_handle::HandleRegistry;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{
    bundle::ComponentBundle,
    component::{Component, ComponentTypeId, Frame},
    config::ManagerConfig,
    entity::{Entity, EntityId, normalise_group},
    error::{EcsError, Result},
    events::{ComponentsChanged, EntityCreated, EntityRemoved},
    registry::ComponentRegistry,
};

/// What a call to [`EntityManager::commit_pending_removals`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Inactive entities released from the arena.
    pub removed_entities: usize,
    /// Group memberships dropped, over named and component groups.
    pub pruned_memberships: usize,
}

/// Owner of all entities of a world.
///
/// The manager also owns the world's [`ComponentRegistry`] and
/// [`EventBus`]. Destroying an entity only deactivates it; it stays in the
/// arena and in its groups until the next
/// [`commit_pending_removals`](Self::commit_pending_removals), which the
/// caller runs at a frame boundary.
///
/// ```ignore
/// let mut manager = EntityManager::new();
/// let player = manager.create_entity();
/// manager.entity_mut(player)?.add_component(Position { x: 0.0, y: 0.0 })?;
///
/// for &id in manager.get_component_group::<dyn Drawable>() {
///     let drawable = manager.entity(id)?.get_component::<dyn Drawable>()?;
/// }
/// ```
pub struct EntityManager {
    entities: HandleRegistry<Entity>,
    /// Creation order, including inactive entities awaiting removal.
    order: Vec<EntityId>,
    named_groups: FxHashMap<String, Vec<EntityId>>,
    /// Entities per component key, including declared ancestor keys.
    type_groups: FxHashMap<ComponentTypeId, Vec<EntityId>>,
    registry: ComponentRegistry,
    events: EventBus,
    config: ManagerConfig,
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityManager {
    /// Manager with the default configuration and a fresh event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ManagerConfig) -> Self {
        Self::with_events(config, EventBus::new())
    }

    /// Manager raising its events on an existing bus.
    #[must_use]
    pub fn with_events(config: ManagerConfig, events: EventBus) -> Self {
        debug!(?config, "creating entity manager");
        Self {
            entities: HandleRegistry::with_capacity_and_validation(
                config.entity_capacity,
                config.validation,
            ),
            order: Vec::with_capacity(config.entity_capacity),
            named_groups: FxHashMap::default(),
            type_groups: FxHashMap::default(),
            registry: ComponentRegistry::new(),
            events,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> ManagerConfig {
        self.config
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub const fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Create an empty entity and raise [`EntityCreated`].
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.entities.issue(Entity::new());
        if let Some(entity) = self.entities.resolve_mut(id) {
            entity.id = id;
        }
        self.order.push(id);

        debug!(entity = %id, "created entity");
        self.events.raise(&EntityCreated { entity: id });
        id
    }

    /// Create an entity holding every component of `bundle`.
    ///
    /// If a component is rejected the entity is destroyed again and the
    /// error returned.
    pub fn create_entity_with<B: ComponentBundle>(&mut self, bundle: B) -> Result<EntityId> {
        let id = self.create_entity();
        let added = EntityMut { manager: &mut *self, id }.add_components(bundle);
        if let Err(error) = added {
            self.destroy(id)?;
            return Err(error);
        }
        Ok(id)
    }

    /// Whether `id` resolves to an active entity.
    #[must_use]
    pub fn is_valid(&self, id: EntityId) -> bool {
        self.entities.resolve(id).is_some_and(Entity::is_active)
    }

    /// The active entity named by `id`.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        let entity = self.entities.get_or_fail(id)?;
        if entity.active {
            Ok(entity)
        } else {
            Err(EcsError::InvalidEntity(id))
        }
    }

    /// Mutable access to the active entity named by `id`.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<EntityMut<'_>> {
        live_mut(&mut self.entities, id)?;
        Ok(EntityMut { manager: self, id })
    }

    /// Entities owned, including destroyed ones awaiting removal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids of all active entities, in creation order.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities().map(Entity::id).collect()
    }

    /// Active entities, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.order
            .iter()
            .filter_map(|&id| self.entities.resolve(id))
            .filter(|entity| entity.active)
    }

    /// Members of a named group (case-insensitive).
    ///
    /// May include entities destroyed or removed from the group since the
    /// last [`commit_pending_removals`](Self::commit_pending_removals).
    #[must_use]
    pub fn get_group(&self, group: &str) -> &[EntityId] {
        self.named_groups
            .get(&normalise_group(group))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entities owning a component registered as `C`, including through a
    /// declared base.
    ///
    /// May include entities destroyed since the last
    /// [`commit_pending_removals`](Self::commit_pending_removals).
    #[must_use]
    pub fn get_component_group<C: ?Sized + 'static>(&self) -> &[EntityId] {
        self.type_groups
            .get(&ComponentTypeId::of::<C>())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Tag `id` with a (case-insensitive) group name.
    pub fn add_to_group(&mut self, id: EntityId, group: &str) -> Result<()> {
        let group = normalise_group(group);
        let entity = live_mut(&mut self.entities, id)?;
        if entity.groups.contains(&group) {
            return Ok(());
        }

        // Still listed if it left the group since the last refresh.
        let members = self.named_groups.entry(group.clone()).or_default();
        if !members.contains(&id) {
            members.push(id);
        }
        trace!(entity = %id, %group, "added to group");
        entity.groups.push(group);
        Ok(())
    }

    /// Remove a group tag from `id`.
    ///
    /// The group's member list is pruned on the next refresh. Returns
    /// `false` if the entity did not carry the tag.
    pub fn remove_from_group(&mut self, id: EntityId, group: &str) -> Result<bool> {
        let group = normalise_group(group);
        let entity = live_mut(&mut self.entities, id)?;
        let Some(position) = entity.groups.iter().position(|tag| *tag == group) else {
            return Ok(false);
        };
        entity.groups.remove(position);
        trace!(entity = %id, %group, "removed from group");
        Ok(true)
    }

    /// Deactivate `id` and, recursively, its children.
    ///
    /// The entity detaches from its parent. Destroying an inactive entity
    /// does nothing.
    pub fn destroy(&mut self, id: EntityId) -> Result<()> {
        let entity = self.entities.get_or_fail_mut(id)?;
        if !entity.active {
            return Ok(());
        }
        entity.active = false;
        let parent = std::mem::replace(&mut entity.parent, EntityId::NULL);
        let children = std::mem::take(&mut entity.children);

        if let Some(parent) = self.entities.resolve_mut(parent) {
            parent.children.remove(&id);
        }
        debug!(entity = %id, children = children.len(), "destroyed entity");

        for child in children {
            self.destroy(child)?;
        }
        Ok(())
    }

    /// Make `child` a child of `parent`, moving it from its current parent.
    pub fn attach_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        if parent == child {
            return Err(EcsError::InvalidHierarchy { parent, child });
        }
        self.entity(parent)?;
        let current = self.entity(child)?.parent;
        if current == parent {
            return Ok(());
        }
        if self.is_ancestor(child, parent) {
            return Err(EcsError::InvalidHierarchy { parent, child });
        }

        if let Some(previous) = self.entities.resolve_mut(current) {
            previous.children.remove(&child);
        }
        live_mut(&mut self.entities, child)?.parent = parent;
        live_mut(&mut self.entities, parent)?.children.insert(child);

        trace!(%parent, %child, "attached child");
        Ok(())
    }

    /// Remove `child` from `parent`'s children.
    pub fn detach_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        let parent_entity = self.entities.get_or_fail_mut(parent)?;
        if !parent_entity.children.remove(&child) {
            return Err(EcsError::NotAChild { parent, child });
        }
        if let Some(child_entity) = self.entities.resolve_mut(child) {
            child_entity.parent = EntityId::NULL;
        }

        trace!(%parent, %child, "detached child");
        Ok(())
    }

    /// Set or clear the parent of `child`.
    ///
    /// A null or invalid `parent` detaches `child` from its current parent.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<()> {
        let current = self.entity(child)?.parent;
        if current == parent {
            return Ok(());
        }
        if self.is_valid(parent) {
            return self.attach_child(parent, child);
        }
        if self.entities.is_valid(current) {
            return self.detach_child(current, child);
        }
        live_mut(&mut self.entities, child)?.parent = EntityId::NULL;
        Ok(())
    }

    /// Whether `ancestor` is found walking up the parents of `id`.
    fn is_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut cursor = self.entities.resolve(id).map(Entity::parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.entities.resolve(current).map(Entity::parent);
        }
        false
    }

    /// Prune groups and release destroyed entities.
    ///
    /// Named groups lose members that are inactive, released or no longer
    /// carry the tag; component groups lose members that are inactive or
    /// released. Inactive entities are then released in creation order and
    /// [`EntityRemoved`] is raised for each. Running it twice in a row is a
    /// no-op the second time.
    pub fn commit_pending_removals(&mut self) -> RefreshReport {
        let mut report = RefreshReport::default();
        let entities = &self.entities;

        for (group, members) in &mut self.named_groups {
            let before = members.len();
            members.retain(|&id| {
                entities
                    .resolve(id)
                    .is_some_and(|entity| entity.active && entity.groups.contains(group))
            });
            report.pruned_memberships += before - members.len();
        }

        for members in self.type_groups.values_mut() {
            let before = members.len();
            members.retain(|&id| entities.resolve(id).is_some_and(Entity::is_active));
            report.pruned_memberships += before - members.len();
        }

        let mut removed = Vec::new();
        let entities = &mut self.entities;
        self.order.retain(|&id| match entities.resolve(id).map(Entity::is_active) {
            Some(true) => true,
            Some(false) => {
                entities.release(id);
                removed.push(id);
                false
            }
            None => false,
        });
        report.removed_entities = removed.len();

        for entity in removed {
            self.events.raise(&EntityRemoved { entity });
        }

        if report == RefreshReport::default() {
            trace!("nothing to commit");
        } else {
            debug!(
                removed = report.removed_entities,
                pruned = report.pruned_memberships,
                "committed pending removals"
            );
        }
        report
    }

    /// Alias of [`commit_pending_removals`](Self::commit_pending_removals).
    pub fn refresh(&mut self) -> RefreshReport {
        self.commit_pending_removals()
    }

    /// Call [`Component::update`] on the components of every active
    /// entity, in creation order. Does not commit pending removals.
    pub fn update(&mut self, delta: Duration) {
        let Self {
            entities,
            order,
            events,
            ..
        } = self;

        for &id in order.iter() {
            let Some(entity) = entities.resolve_mut(id) else {
                continue;
            };
            if !entity.active {
                continue;
            }
            let frame = Frame {
                delta,
                owner: id,
                events: &*events,
            };
            entity.update_components(&frame);
        }
        trace!(entities = order.len(), ?delta, "updated components");
    }

    fn add_component_with<C, F>(&mut self, id: EntityId, make: F) -> Result<&mut C>
    where
        C: Component,
        F: FnOnce(EntityId) -> C,
    {
        let Self {
            entities,
            type_groups,
            registry,
            events,
            ..
        } = self;

        registry.register::<C>();
        let keys = registry.closure(ComponentTypeId::of_component::<C>());

        let entity = live_mut(entities, id)?;
        if let Some(key) = entity.conflicting_key(&keys) {
            return Err(EcsError::DuplicateComponent {
                entity: id,
                component: key.name(),
            });
        }

        let ptr = entity.insert(make(id), |ptr| registry.views(ptr));
        for key in &keys {
            type_groups.entry(*key).or_default().push(id);
        }

        debug!(
            entity = %id,
            component = C::type_name(),
            keys = keys.len(),
            "added component"
        );
        events.raise(&ComponentsChanged { entity: id });

        // SAFETY: `ptr` is the component just boxed into an entity owned by
        // `self`. It is freed only when that entity is released, which needs
        // `&mut self` and so cannot happen while the returned borrow lives.
        Ok(unsafe { &mut *ptr })
    }
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("entities", &self.entities.len())
            .field("named_groups", &self.named_groups.len())
            .field("component_groups", &self.type_groups.len())
            .field("registry", &self.registry)
            .field("events", &self.events)
            .finish()
    }
}

/// Resolve an entity that must exist and be active.
fn live_mut(entities: &mut HandleRegistry<Entity>, id: EntityId) -> Result<&mut Entity> {
    let entity = entities.get_or_fail_mut(id)?;
    if entity.active {
        Ok(entity)
    } else {
        Err(EcsError::InvalidEntity(id))
    }
}

/// Mutable access to one active entity through its manager.
///
/// Obtained from [`EntityManager::entity_mut`]. Keeps the manager borrowed
/// so component additions can update its groups.
pub struct EntityMut<'m> {
    manager: &'m mut EntityManager,
    id: EntityId,
}

impl EntityMut<'_> {
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity(&self) -> Result<&Entity> {
        self.manager.entity(self.id)
    }

    /// Add a component, registering it under its own type and every
    /// declared base.
    ///
    /// Fails with [`EcsError::DuplicateComponent`] without touching the
    /// entity if any of those types is already present.
    pub fn add_component<C: Component>(&mut self, component: C) -> Result<&mut C> {
        self.manager.add_component_with(self.id, |_| component)
    }

    /// Like [`add_component`](Self::add_component), building the component
    /// from the owning entity's id.
    ///
    /// `make` is not called if the component would be rejected.
    pub fn add_component_with<C, F>(&mut self, make: F) -> Result<&mut C>
    where
        C: Component,
        F: FnOnce(EntityId) -> C,
    {
        self.manager.add_component_with(self.id, make)
    }

    /// Add each component of a tuple, in order.
    ///
    /// Stops at the first rejected component; the ones before it stay.
    pub fn add_components<B: ComponentBundle>(&mut self, bundle: B) -> Result<()> {
        bundle.add_to(self)
    }

    pub fn get_component<C: ?Sized + 'static>(&self) -> Result<&C> {
        self.manager.entity(self.id)?.get_component::<C>()
    }

    pub fn get_component_mut<C: ?Sized + 'static>(&mut self) -> Result<&mut C> {
        live_mut(&mut self.manager.entities, self.id)?.get_component_mut::<C>()
    }

    #[must_use]
    pub fn has_component<C: ?Sized + 'static>(&self) -> bool {
        self.manager
            .entity(self.id)
            .is_ok_and(Entity::has_component::<C>)
    }

    pub fn add_to_group(&mut self, group: &str) -> Result<()> {
        self.manager.add_to_group(self.id, group)
    }

    pub fn remove_from_group(&mut self, group: &str) -> Result<bool> {
        self.manager.remove_from_group(self.id, group)
    }

    #[must_use]
    pub fn is_in_group(&self, group: &str) -> bool {
        self.manager
            .entity(self.id)
            .is_ok_and(|entity| entity.is_in_group(group))
    }

    pub fn attach_child(&mut self, child: EntityId) -> Result<()> {
        self.manager.attach_child(self.id, child)
    }

    pub fn detach_child(&mut self, child: EntityId) -> Result<()> {
        self.manager.detach_child(self.id, child)
    }

    pub fn set_parent(&mut self, parent: EntityId) -> Result<()> {
        self.manager.set_parent(self.id, parent)
    }

    /// Destroy the entity; see [`EntityManager::destroy`].
    pub fn destroy(self) -> Result<()> {
        self.manager.destroy(self.id)
    }
}
