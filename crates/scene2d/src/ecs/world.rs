//! The world context
//!
//! One `World` owns everything a running scene needs: the entity allocator,
//! the component store, the transform arena, the active-camera slot and the
//! fixed-step accumulator. There are no globals; components reach the world
//! through their [`ComponentContext`].
//!
//! Lifecycle hooks run with their component checked out of the store. While
//! any hook or pass is running, removals and entity destructions are queued
//! and applied once the outermost dispatch returns, so iteration never sees
//! a half-removed component.

use super::component::{Component, ComponentContext, ComponentHandle};
use super::components::{CameraComponent, SpriteComponent, TransformComponent};
use super::storage::{ComponentKey, ComponentStore};
use super::{EcsError, Entity, EntityManager};
use crate::config::{CameraConfig, SchedulerConfig};
use crate::foundation::math::{Transform, Vec3};
use crate::foundation::time::FixedTimestep;
use crate::scene::{Aabb, TransformArena, TransformKey};

#[derive(Debug, Clone, Copy)]
enum PendingOp {
    RemoveComponent(Entity, ComponentKey),
    DestroyEntity(Entity),
}

/// Container for entities, components and spatial state
pub struct World {
    /// Component storage
    pub components: ComponentStore,

    /// Transform hierarchy shared by all transform components
    pub transforms: TransformArena,

    entities: EntityManager,
    active_camera: Option<ComponentKey>,
    pub(crate) scheduler: FixedTimestep,
    dispatch_depth: u32,
    pending: Vec<PendingOp>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a world with default scheduling and camera settings
    pub fn new() -> Self {
        Self::with_config(&SchedulerConfig::default())
    }

    /// Create a world with the given update-loop settings
    pub fn with_config(scheduler: &SchedulerConfig) -> Self {
        Self {
            components: ComponentStore::new(),
            transforms: TransformArena::new(),
            entities: EntityManager::new(),
            active_camera: None,
            scheduler: scheduler.timestep(),
            dispatch_depth: 0,
            pending: Vec::new(),
        }
    }

    // Entities

    /// Allocate a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create_entity()
    }

    /// Remove every component of `entity`, then retire its id
    ///
    /// Unknown entities are ignored. Called from inside a hook, the
    /// destruction is applied after the current dispatch.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if !self.entities.has_entity(entity) {
            log::debug!("World: Ignoring destroy of unknown {}", entity);
            return;
        }
        if self.dispatch_depth > 0 {
            self.pending.push(PendingOp::DestroyEntity(entity));
            return;
        }

        self.remove_all_components(entity);
        self.entities.retire(entity);

        // destroy hooks may have added siblings before the id was retired
        for key in self.components.keys_of_entity(entity) {
            self.remove_component_now(key);
        }
    }

    /// Whether `entity` is live
    pub fn has_entity(&self, entity: Entity) -> bool {
        self.entities.has_entity(entity)
    }

    /// Snapshot of all live entities
    pub fn all_entities(&self) -> Vec<Entity> {
        self.entities.all_entities()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // Components

    /// Attach `component` to `entity` and run its `awake` hook
    ///
    /// Fails if the entity is not live, or if `awake` fails; in the latter
    /// case the component is discarded without its `destroy` hook.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<ComponentHandle<T>, EcsError> {
        if !self.entities.has_entity(entity) {
            log::error!("World: Cannot add {} to missing {}", std::any::type_name::<T>(), entity);
            return Err(EcsError::EntityNotFound(entity));
        }

        let key = self.components.insert(entity, component);
        let Some((_, mut instance)) = self.components.checkout(key) else {
            return Err(EcsError::EntityNotFound(entity));
        };

        self.dispatch_depth += 1;
        let awoken = {
            let mut ctx = ComponentContext { entity, key, world: self };
            instance.awake(&mut ctx)
        };
        self.dispatch_depth -= 1;

        let result = match awoken {
            Ok(()) => {
                self.components.checkin(key, instance);
                Ok(ComponentHandle::new(key))
            }
            Err(error) => {
                log::error!("World: {}", error);
                self.components.detach(key);
                Err(error)
            }
        };
        self.flush_pending();
        result
    }

    /// First component of type `T` on `entity`
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.get::<T>(entity)
    }

    /// Mutable access to the first component of type `T` on `entity`
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut::<T>(entity)
    }

    /// Handles to every component of type `T` on `entity`, in insertion order
    pub fn get_components<T: Component>(&self, entity: Entity) -> Vec<ComponentHandle<T>> {
        self.components.handles::<T>(entity)
    }

    /// Run the component's `destroy` hook and remove it from storage
    ///
    /// `component` may be a typed handle or a raw key. A key that does not
    /// belong to `entity` is ignored.
    pub fn remove_component(&mut self, entity: Entity, component: impl Into<ComponentKey>) {
        let key = component.into();
        if self.components.entity_of(key) != Some(entity) {
            log::warn!("World: {:?} is not a component of {}", key, entity);
            return;
        }
        if self.dispatch_depth > 0 {
            self.pending.push(PendingOp::RemoveComponent(entity, key));
            return;
        }
        self.remove_component_now(key);
    }

    /// Remove every component of `entity`, oldest first
    pub fn remove_all_components(&mut self, entity: Entity) {
        for key in self.components.keys_of_entity(entity) {
            self.remove_component(entity, key);
        }
    }

    fn remove_component_now(&mut self, key: ComponentKey) {
        let Some((entity, mut instance)) = self.components.begin_removal(key) else {
            return;
        };

        self.dispatch_depth += 1;
        {
            let mut ctx = ComponentContext { entity, key, world: self };
            instance.destroy(&mut ctx);
        }
        self.dispatch_depth -= 1;

        drop(instance);
        self.components.detach(key);
        if self.active_camera == Some(key) {
            self.active_camera = None;
        }
        self.flush_pending();
    }

    /// Run `hook` on the checked-out component under `key`
    ///
    /// Returns `None` if the component is gone or already checked out.
    pub(crate) fn dispatch<R>(
        &mut self,
        key: ComponentKey,
        hook: impl FnOnce(&mut dyn Component, &mut ComponentContext<'_>) -> R,
    ) -> Option<R> {
        let (entity, mut instance) = self.components.checkout(key)?;

        self.dispatch_depth += 1;
        let result = {
            let mut ctx = ComponentContext { entity, key, world: self };
            hook(&mut *instance, &mut ctx)
        };
        self.dispatch_depth -= 1;

        self.components.checkin(key, instance);
        self.flush_pending();
        Some(result)
    }

    /// Mark the start of a pass; mutations are deferred until it ends
    pub(crate) fn begin_pass(&mut self) {
        self.dispatch_depth += 1;
    }

    /// Mark the end of a pass and apply deferred mutations
    pub(crate) fn end_pass(&mut self) {
        self.dispatch_depth = self.dispatch_depth.saturating_sub(1);
        self.flush_pending();
    }

    fn flush_pending(&mut self) {
        while self.dispatch_depth == 0 && !self.pending.is_empty() {
            let ops = std::mem::take(&mut self.pending);
            log::trace!("World: Applying {} deferred operations", ops.len());
            for op in ops {
                match op {
                    PendingOp::RemoveComponent(entity, key) => {
                        if self.components.entity_of(key) == Some(entity) {
                            self.remove_component_now(key);
                        }
                    }
                    PendingOp::DestroyEntity(entity) => self.destroy_entity(entity),
                }
            }
        }
    }

    // Transforms

    /// Transform node of the entity's first Transform component
    pub fn transform_key(&self, entity: Entity) -> Option<TransformKey> {
        self.get_component::<TransformComponent>(entity)?.key()
    }

    /// Up-to-date world position of the entity's transform
    pub fn world_position(&mut self, entity: Entity) -> Option<Vec3> {
        let key = self.transform_key(entity)?;
        self.transforms.world_position(key)
    }

    /// Local transform of the entity
    pub fn local_transform(&self, entity: Entity) -> Option<&Transform> {
        let key = self.transform_key(entity)?;
        self.transforms.local(key)
    }

    // Cameras

    /// Key of the camera currently holding the active slot
    pub fn active_camera(&self) -> Option<ComponentKey> {
        self.active_camera
    }

    /// Make `key` the active camera; the previous holder is marked inactive
    ///
    /// Returns `false` if `key` does not refer to a camera.
    pub fn set_active_camera(&mut self, key: ComponentKey) -> bool {
        if self.components.get_by_key::<CameraComponent>(key).is_none() {
            log::warn!("World: {:?} is not a camera", key);
            return false;
        }

        if let Some(previous) = self.active_camera.filter(|previous| *previous != key) {
            if let Some(camera) = self.components.get_by_key_mut::<CameraComponent>(previous) {
                camera.set_active(false);
            }
        }
        if let Some(camera) = self.components.get_by_key_mut::<CameraComponent>(key) {
            camera.set_active(true);
        }
        self.active_camera = Some(key);
        log::debug!("World: Active camera is now {:?}", key);
        true
    }

    /// Claim the active slot for `key` if it is empty
    pub(crate) fn claim_active_camera(&mut self, key: ComponentKey) -> bool {
        if self.active_camera.is_some() {
            return false;
        }
        self.active_camera = Some(key);
        true
    }

    /// Clear the active slot if `key` holds it
    pub(crate) fn release_active_camera(&mut self, key: ComponentKey) {
        if self.active_camera == Some(key) {
            self.active_camera = None;
            log::debug!("World: Active camera {:?} released", key);
        }
    }

    /// A camera together with the transform arena it reads from
    pub fn camera_mut(&mut self, key: ComponentKey) -> Option<(&mut CameraComponent, &mut TransformArena)> {
        let camera = self.components.get_by_key_mut::<CameraComponent>(key)?;
        Some((camera, &mut self.transforms))
    }

    /// The active camera together with the transform arena
    pub fn active_camera_mut(&mut self) -> Option<(&mut CameraComponent, &mut TransformArena)> {
        let key = self.active_camera?;
        self.camera_mut(key)
    }

    /// Create an entity with a Transform and a Camera built from `config`
    pub fn spawn_camera(&mut self, config: &CameraConfig) -> Result<(Entity, ComponentHandle<CameraComponent>), EcsError> {
        let entity = self.create_entity();
        self.add_component(entity, TransformComponent::new())?;
        let camera = self.add_component(entity, CameraComponent::from_config(config))?;
        log::info!("World: Spawned camera on {}", entity);
        Ok((entity, camera))
    }

    /// XY bounds of the entity's sprite at its world position, grown by `margin`
    ///
    /// `None` without a transform or a sprite with a known content size.
    pub fn entity_bounds(&mut self, entity: Entity, margin: f32) -> Option<Aabb> {
        let size = self.get_component::<SpriteComponent>(entity)?.content_size()?;
        let key = self.transform_key(entity)?;
        let scale = self.transforms.local(key)?.scale;
        let position = self.transforms.world_position(key)?;

        Some(Aabb::from_center_size_2d(position.x, position.y, size.x * scale.x, size.y * scale.y).inflate_xy(margin))
    }

    /// Whether the entity's sprite bounds overlap the camera's view
    pub fn is_entity_visible(&mut self, camera: ComponentKey, entity: Entity, margin: f32) -> bool {
        let Some(bounds) = self.entity_bounds(entity, margin) else {
            return false;
        };
        match self.camera_mut(camera) {
            Some((camera, transforms)) => camera.is_box_visible(transforms, &bounds, false),
            None => {
                log::warn!("World: {:?} is not a camera", camera);
                false
            }
        }
    }

    /// Entities with a sprite visible from the active camera
    pub fn visible_entities(&mut self, margin: f32) -> Vec<Entity> {
        let Some(camera) = self.active_camera else {
            return Vec::new();
        };
        self.components
            .entities_with::<SpriteComponent>()
            .into_iter()
            .filter(|entity| self.is_entity_visible(camera, *entity, margin))
            .collect()
    }
}
