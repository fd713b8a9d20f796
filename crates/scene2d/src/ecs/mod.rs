//! Entity-Component runtime
//!
//! Entities are bare ids. Components are boxed trait objects with lifecycle
//! hooks, stored per type and indexed per entity. The [`World`] ties the
//! entity allocator, the component store and the transform arena together
//! and drives the update loop.

pub mod component;
pub mod components;
pub mod entity;
pub mod scheduler;
pub mod storage;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::{AsAny, Component, ComponentContext, ComponentHandle};
pub use entity::{Entity, EntityManager};
pub use storage::{ComponentKey, ComponentStore, SlotFlags};
pub use world::World;

/// Errors surfaced by component operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity was never created or has been destroyed
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// A component's `awake` needs a sibling the entity does not have
    #[error("{component} on {entity} requires a {required} component")]
    MissingDependency {
        /// Entity the component was added to
        entity: Entity,
        /// Component that failed to wake
        component: &'static str,
        /// Sibling it needs
        required: &'static str,
    },
}
