//! Errors reported by the entity manager and entities.

use mbe_handle::HandleError;
use thiserror::Error;

use crate::entity::EntityId;

/// Result alias used throughout the crate.
pub type Result<T, E = EcsError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity owns no component registered under the requested type.
    #[error("entity {entity} has no component `{component}`")]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },

    /// A component (or one of its declared bases) is already registered.
    #[error("entity {entity} already has a component registered as `{component}`")]
    DuplicateComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// The entity was destroyed and awaits removal.
    #[error("entity {0} is inactive")]
    InvalidEntity(EntityId),

    /// Attaching `child` under `parent` would make an entity its own ancestor.
    #[error("cannot attach {child} under {parent}: would create a cycle")]
    InvalidHierarchy { parent: EntityId, child: EntityId },

    #[error("entity {child} is not a child of {parent}")]
    NotAChild { parent: EntityId, child: EntityId },

    #[error(transparent)]
    Handle(#[from] HandleError),
}
