//! Transform component
//!
//! The component is a thin owner of a node in the world's
//! [`TransformArena`](crate::scene::TransformArena). The node is created on
//! `awake` and removed on `destroy`; everything spatial goes through the
//! arena with the key returned by [`TransformComponent::key`].

use crate::ecs::{Component, ComponentContext, EcsError};
use crate::foundation::math::{Transform, Vec3};
use crate::scene::TransformKey;

/// Places an entity in the transform hierarchy
#[derive(Debug, Clone, Default)]
pub struct TransformComponent {
    initial: Transform,
    parent: Option<TransformKey>,
    node: Option<TransformKey>,
}

impl TransformComponent {
    /// Identity transform at the root of the hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self::from_transform(Transform::from_position(position))
    }

    /// Create from a full local transform
    pub fn from_transform(initial: Transform) -> Self {
        Self {
            initial,
            ..Default::default()
        }
    }

    /// Set the initial rotation, in degrees per axis
    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.initial.rotation = degrees;
        self
    }

    /// Set the initial scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.initial.scale = scale;
        self
    }

    /// Attach under `parent` when the component wakes
    pub fn with_parent(mut self, parent: TransformKey) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Arena key of this component's node; `None` before `awake`
    pub fn key(&self) -> Option<TransformKey> {
        self.node
    }
}

impl Component for TransformComponent {
    fn awake(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), EcsError> {
        let key = ctx.world.transforms.insert(ctx.entity, self.initial.clone());
        if let Some(parent) = self.parent {
            ctx.world.transforms.set_parent(key, Some(parent));
        }
        self.node = Some(key);
        Ok(())
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, _delta_time: f32) {
        if let Some(key) = self.node {
            ctx.world.transforms.update_world_matrix(key);
        }
    }

    fn destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        if let Some(key) = self.node.take() {
            ctx.world.transforms.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;
    use approx::assert_relative_eq;

    #[test]
    fn test_awake_creates_node_with_initial_transform() {
        let mut world = World::new();
        let entity = world.create_entity();
        world
            .add_component(entity, TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::new(2.0, 2.0, 2.0)))
            .unwrap();

        let key = world.transform_key(entity).unwrap();

        assert_eq!(world.transforms.get(key).unwrap().entity(), entity);
        assert_relative_eq!(world.transforms.local(key).unwrap().scale, Vec3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(world.world_position(entity).unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_with_parent_links_nodes() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        world.add_component(parent, TransformComponent::from_position(Vec3::new(10.0, 0.0, 0.0))).unwrap();
        let parent_key = world.transform_key(parent).unwrap();

        world
            .add_component(child, TransformComponent::from_position(Vec3::new(0.0, 5.0, 0.0)).with_parent(parent_key))
            .unwrap();

        assert_relative_eq!(world.world_position(child).unwrap(), Vec3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn test_update_refreshes_world_matrix() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::new()).unwrap();
        let key = world.transform_key(entity).unwrap();

        world.transforms.translate(key, Vec3::new(3.0, 0.0, 0.0));
        assert!(world.transforms.needs_refresh(key));

        world.update(0.0);
        assert!(!world.transforms.needs_refresh(key));
    }

    #[test]
    fn test_destroy_removes_node_and_orphans_children() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        world.add_component(parent, TransformComponent::new()).unwrap();
        let parent_key = world.transform_key(parent).unwrap();
        world.add_component(child, TransformComponent::new().with_parent(parent_key)).unwrap();
        let child_key = world.transform_key(child).unwrap();

        world.destroy_entity(parent);

        assert!(!world.transforms.contains(parent_key));
        assert_eq!(world.transforms.parent(child_key), None);
    }
}
