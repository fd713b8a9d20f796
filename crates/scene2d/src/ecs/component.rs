//! Component trait, lifecycle hooks and typed handles

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::storage::ComponentKey;
use super::{EcsError, Entity, World};

/// Downcasting support for boxed components
pub trait AsAny: Any {
    /// View as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// View as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour attached to an entity
///
/// Every hook has an empty default. Hooks run with the component checked out
/// of the store, so the context gives full access to the [`World`] while
/// `self` is borrowed; a component cannot look itself up through the store
/// from inside its own hook.
///
/// Lifecycle, per component:
/// - `awake` once, synchronously inside `add_component`
/// - `start` once, before the first `update` while enabled
/// - `fixed_update` every fixed step while enabled
/// - `update` every frame while enabled
/// - `destroy` once, before the component leaves the store
pub trait Component: AsAny {
    /// Called when the component is added. Returning an error aborts the
    /// addition and discards the component.
    fn awake(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), EcsError> {
        Ok(())
    }

    /// Called before the first update
    fn start(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called once per frame with the frame's delta time
    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _delta_time: f32) {}

    /// Called once per fixed step with the step length
    fn fixed_update(&mut self, _ctx: &mut ComponentContext<'_>, _delta_time: f32) {}

    /// Called when the component is removed or its entity destroyed
    fn destroy(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

/// What a lifecycle hook can see
pub struct ComponentContext<'w> {
    /// Entity owning the component
    pub entity: Entity,

    /// Storage key of the component whose hook is running
    pub key: ComponentKey,

    /// The world the component lives in
    pub world: &'w mut World,
}

impl ComponentContext<'_> {
    /// First sibling component of type `T` on the same entity
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.world.get_component::<T>(self.entity)
    }

    /// Mutable access to the first sibling component of type `T`
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.world.get_component_mut::<T>(self.entity)
    }

    /// Enable or disable the running component
    pub fn set_enabled(&mut self, enabled: bool) {
        self.world.components.set_enabled(self.key, enabled);
    }

    /// Queue removal of the running component; applied after the current pass
    pub fn remove_self(&mut self) {
        self.world.remove_component(self.entity, self.key);
    }
}

/// Typed reference to a stored component
///
/// A plain key plus the component type; it does not keep the component
/// alive and resolves to `None` once the component is removed.
pub struct ComponentHandle<T> {
    key: ComponentKey,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> ComponentHandle<T> {
    /// Create a new typed handle from a key
    pub(crate) fn new(key: ComponentKey) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> ComponentKey {
        self.key
    }
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentHandle<T> {}

impl<T> PartialEq for ComponentHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for ComponentHandle<T> {}

impl<T> Hash for ComponentHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentHandle").field(&self.key).finish()
    }
}

impl<T> From<ComponentHandle<T>> for ComponentKey {
    fn from(handle: ComponentHandle<T>) -> Self {
        handle.key
    }
}
