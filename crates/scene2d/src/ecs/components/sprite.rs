//! Sprite component
//!
//! Screen-space placement for a drawable attached to an entity. The
//! component does no drawing itself; each frame it works out where the
//! sprite lands on screen through the active camera, and a renderer reads
//! the result from [`SpriteComponent::placement`].

use crate::ecs::{Component, ComponentContext, EcsError};
use crate::foundation::math::Vec2;
use crate::scene::{Aabb, TransformKey};

/// Where and how a sprite should be drawn this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPlacement {
    /// Position in pixels, or world X/Y when drawn without a camera
    pub position: Vec2,
    /// Scale including the camera zoom
    pub scale: Vec2,
    /// Z rotation in degrees, relative to the camera when it applies rotation
    pub rotation: f32,
    /// False when frustum culling rejected the sprite
    pub on_screen: bool,
}

impl ScreenPlacement {
    fn hidden() -> Self {
        Self {
            position: Vec2::zeros(),
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            on_screen: false,
        }
    }
}

/// Renderer-facing sprite state
#[derive(Debug, Clone)]
pub struct SpriteComponent {
    content_size: Option<Vec2>,
    visible: bool,
    z_order: i32,
    use_camera: bool,
    frustum_culling: bool,
    transform: Option<TransformKey>,
    placement: Option<ScreenPlacement>,
}

impl Default for SpriteComponent {
    fn default() -> Self {
        Self {
            content_size: None,
            visible: true,
            z_order: 0,
            use_camera: true,
            frustum_culling: true,
            transform: None,
            placement: None,
        }
    }
}

impl SpriteComponent {
    /// Sprite with no known content size yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Sprite whose unscaled content is `width` x `height`
    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            content_size: Some(Vec2::new(width, height)),
            ..Self::default()
        }
    }

    /// Unscaled content size
    pub fn content_size(&self) -> Option<Vec2> {
        self.content_size
    }

    /// Set the unscaled content size, e.g. once a texture has loaded
    pub fn set_content_size(&mut self, size: Vec2) {
        self.content_size = Some(size);
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.placement = None;
        }
    }

    /// Whether the sprite is meant to be drawn at all
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Draw order; higher values draw later
    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    /// Set draw order
    pub fn set_z_order(&mut self, z_order: i32) {
        self.z_order = z_order;
    }

    /// Place through the active camera (true) or at raw world coordinates
    pub fn set_use_camera(&mut self, use_camera: bool) {
        self.use_camera = use_camera;
    }

    /// Skip placement for sprites outside the camera frustum
    pub fn set_frustum_culling(&mut self, enabled: bool) {
        self.frustum_culling = enabled;
    }

    /// Result of the last update; `None` while hidden or before the first update
    pub fn placement(&self) -> Option<&ScreenPlacement> {
        self.placement.as_ref()
    }

    fn mark_culled(&mut self) {
        let previous = self.placement.unwrap_or_else(ScreenPlacement::hidden);
        self.placement = Some(ScreenPlacement {
            on_screen: false,
            ..previous
        });
    }
}

impl Component for SpriteComponent {
    fn awake(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), EcsError> {
        match ctx.world.transform_key(ctx.entity) {
            Some(key) => {
                self.transform = Some(key);
                Ok(())
            }
            None => Err(EcsError::MissingDependency {
                entity: ctx.entity,
                component: "Sprite",
                required: "Transform",
            }),
        }
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, _delta_time: f32) {
        let Some(key) = self.transform else {
            return;
        };
        if !self.visible {
            return;
        }

        let camera = if self.use_camera { ctx.world.active_camera() } else { None };
        let transforms = &mut ctx.world.transforms;
        let (Some(position), Some(local)) = (transforms.world_position(key), transforms.local(key).cloned()) else {
            log::warn!("Sprite: Transform of {} no longer exists", ctx.entity);
            self.placement = None;
            return;
        };

        let camera = match camera {
            Some(camera) => ctx.world.camera_mut(camera),
            None => None,
        };
        let Some((camera, transforms)) = camera else {
            self.placement = Some(ScreenPlacement {
                position: position.xy(),
                scale: local.scale.xy(),
                rotation: local.rotation.z,
                on_screen: true,
            });
            return;
        };

        if self.frustum_culling {
            if let Some(size) = self.content_size {
                let bounds = Aabb::from_center_size_2d(position.x, position.y, size.x * local.scale.x, size.y * local.scale.y);
                if !camera.is_box_visible(transforms, &bounds, false) {
                    log::trace!("Sprite: {} culled", ctx.entity);
                    self.mark_culled();
                    return;
                }
            }
        }

        let screen = camera.world_to_screen_point(transforms, position);
        let mut rotation = local.rotation.z;
        if camera.applies_rotation() {
            rotation -= camera.z_rotation(transforms);
        }

        self.placement = Some(ScreenPlacement {
            position: screen,
            scale: local.scale.xy() * camera.zoom(),
            rotation,
            on_screen: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{CameraComponent, TransformComponent};
    use crate::ecs::World;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn world_with_camera() -> World {
        let mut world = World::new();
        let camera = world.create_entity();
        world.add_component(camera, TransformComponent::new()).unwrap();
        world.add_component(camera, CameraComponent::new()).unwrap();
        world
    }

    #[test]
    fn test_sprite_requires_transform() {
        let mut world = World::new();
        let entity = world.create_entity();

        let result = world.add_component(entity, SpriteComponent::with_size(10.0, 10.0));

        assert!(matches!(result, Err(EcsError::MissingDependency { required: "Transform", .. })));
        assert!(world.get_component::<SpriteComponent>(entity).is_none());
    }

    #[test]
    fn test_placement_through_camera() {
        let mut world = world_with_camera();
        let entity = world.create_entity();
        world
            .add_component(entity, TransformComponent::from_position(Vec3::new(100.0, 50.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 1.0)))
            .unwrap();
        world.add_component(entity, SpriteComponent::with_size(10.0, 10.0)).unwrap();
        world.active_camera_mut().unwrap().0.set_zoom(2.0);

        world.update(0.016);

        let placement = *world.get_component::<SpriteComponent>(entity).unwrap().placement().unwrap();
        assert!(placement.on_screen);
        assert_relative_eq!(placement.position, Vec2::new(600.0, 200.0), epsilon = 1e-3);
        assert_relative_eq!(placement.scale, Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_culled_sprite_is_off_screen() {
        let mut world = world_with_camera();
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_position(Vec3::new(5000.0, 0.0, 0.0))).unwrap();
        world.add_component(entity, SpriteComponent::with_size(10.0, 10.0)).unwrap();

        world.update(0.016);

        let placement = world.get_component::<SpriteComponent>(entity).unwrap().placement().unwrap();
        assert!(!placement.on_screen);
    }

    #[test]
    fn test_placement_without_camera_uses_world_position() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_position(Vec3::new(7.0, 8.0, 0.0))).unwrap();
        world.add_component(entity, SpriteComponent::new()).unwrap();

        world.update(0.016);

        let placement = world.get_component::<SpriteComponent>(entity).unwrap().placement().unwrap();
        assert_relative_eq!(placement.position, Vec2::new(7.0, 8.0));
    }

    #[test]
    fn test_camera_rotation_is_subtracted() {
        let mut world = world_with_camera();
        let entity = world.create_entity();
        world
            .add_component(entity, TransformComponent::new().with_rotation(Vec3::new(0.0, 0.0, 30.0)))
            .unwrap();
        world.add_component(entity, SpriteComponent::with_size(4.0, 4.0)).unwrap();
        {
            let (camera, transforms) = world.active_camera_mut().unwrap();
            camera.set_rotation(transforms, Vec3::new(0.0, 0.0, 10.0));
        }

        world.update(0.016);

        let placement = world.get_component::<SpriteComponent>(entity).unwrap().placement().unwrap();
        assert_relative_eq!(placement.rotation, 20.0, epsilon = 1e-4);
    }
}
