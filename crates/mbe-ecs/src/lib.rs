// Components are stored behind raw pointers so interface views stay valid
#![allow(unsafe_code)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_fields_in_debug)]

//! Entity/component composition with polymorphic component lookup.
//!
//! # Key Concepts
//!
//! - **Entity**: aggregate of components, named by an [`EntityId`] handle
//! - **Component**: data and behaviour attached to one entity
//! - **Base**: a type a component can also be looked up as, usually an
//!   interface such as `dyn Drawable`
//! - **Group**: entities sharing a tag, or owning a component of some type
//!
//! # Lifecycle
//!
//! Entities are created through the [`EntityManager`]. Destroying one only
//! deactivates it (and its children); it is released, and dropped from its
//! groups, by the next [`EntityManager::commit_pending_removals`].
//!
//! ```ignore
//! trait Drawable {
//!     fn draw(&self);
//! }
//!
//! #[derive(Component)]
//! #[component(bases(dyn Drawable))]
//! struct Sprite { texture: u32 }
//!
//! let mut manager = EntityManager::new();
//! let id = manager.create_entity_with((Sprite { texture: 7 },))?;
//!
//! for &id in manager.get_component_group::<dyn Drawable>() {
//!     manager.entity(id)?.get_component::<dyn Drawable>()?.draw();
//! }
//!
//! manager.destroy(id)?;
//! manager.commit_pending_removals();
//! ```

mod bundle;
mod component;
mod config;
mod entity;
mod error;
mod events;
mod manager;
mod registry;

pub use bundle::ComponentBundle;
pub use component::{Component, ComponentTypeId, Frame};
pub use config::{ENTITY_CAPACITY_ENV, ManagerConfig, VALIDATION_ENV};
pub use entity::{Entity, EntityId};
pub use error::{EcsError, Result};
pub use events::{ComponentValueChanged, ComponentsChanged, EntityCreated, EntityRemoved};
pub use manager::{EntityManager, EntityMut, RefreshReport};
pub use mbe_ecs_derive::Component;
pub use registry::{ComponentBases, ComponentRegistry};

pub use mbe_event::EventBus;
pub use mbe_handle::Validation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Component, ComponentBases, ComponentRegistry, EcsError, Entity, EntityId, EntityManager,
        EntityMut, EventBus, Frame, declare_bases,
    };
}
