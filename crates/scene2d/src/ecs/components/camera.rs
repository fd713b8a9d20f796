//! 2D camera component
//!
//! An orthographic camera bound to its entity's transform. It caches view,
//! projection and combined matrices and recomputes them lazily: mutators mark
//! the camera stale, and every accessor that needs the matrices refreshes
//! them first. A transform change made elsewhere is noticed through the
//! transform node's revision counter.
//!
//! Methods that touch the transform take the world's
//! [`TransformArena`] explicitly; get both through
//! [`World::camera_mut`](crate::ecs::World::camera_mut).
//!
//! # Coordinate System
//! - World: X right, Y up; the 2D plane is z = 0
//! - Screen: pixels, origin top-left, Y down
//! - The camera looks along its look direction (default -Z)

use crate::config::CameraConfig;
use crate::ecs::{Component, ComponentContext, EcsError};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec2, Vec3, Vec4};
use crate::scene::{Aabb, Frustum, TransformArena, TransformKey};

/// Zoom used in place of a non-positive request
pub const MIN_ZOOM: f32 = 0.1;

/// Follow behaviour towards a target transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowTarget {
    /// Node whose world position is tracked
    pub target: TransformKey,
    /// Ease towards the target instead of snapping
    pub smooth: bool,
    /// Fraction of the remaining distance covered per second when smooth
    pub speed: f32,
}

/// Orthographic camera
#[derive(Debug, Clone)]
pub struct CameraComponent {
    transform: Option<TransformKey>,
    view: Mat4,
    projection: Mat4,
    combined: Mat4,
    viewport: Vec2,
    zoom: f32,
    near: f32,
    far: f32,
    active: bool,
    needs_update: bool,
    apply_rotation: bool,
    up: Vec3,
    look_direction: Vec3,
    follow: Option<FollowTarget>,
    follow_speed: f32,
    seen_revision: u64,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl CameraComponent {
    /// Camera with the default 800x600 viewport
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with settings taken from `config`
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            transform: None,
            view: Mat4::identity(),
            projection: Mat4::identity(),
            combined: Mat4::identity(),
            viewport: Vec2::new(config.viewport_width, config.viewport_height),
            zoom: if config.zoom > 0.0 { config.zoom } else { MIN_ZOOM },
            near: config.near,
            far: config.far,
            active: false,
            needs_update: true,
            apply_rotation: config.apply_rotation,
            up: Vec3::new(0.0, 1.0, 0.0),
            look_direction: Vec3::new(0.0, 0.0, -1.0),
            follow: None,
            follow_speed: config.follow_speed,
            seen_revision: 0,
        }
    }

    /// Set the viewport size before the camera is added
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Vec2::new(width, height);
        self
    }

    /// Set the zoom before the camera is added
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.set_zoom(zoom);
        self
    }

    // State

    /// Transform node the camera is bound to; `None` before `awake`
    pub fn transform(&self) -> Option<TransformKey> {
        self.transform
    }

    /// Current zoom factor; above 1 zooms in
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Viewport size in pixels
    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    /// Near clip value
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clip value
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Whether this camera is marked active
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether the transform's Z rotation widens the frustum and rotates sprites
    pub fn applies_rotation(&self) -> bool {
        self.apply_rotation
    }

    /// Turn rotation handling on or off
    pub fn enable_rotation(&mut self, enable: bool) {
        self.apply_rotation = enable;
    }

    /// Camera up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Direction the camera looks in
    pub fn look_direction(&self) -> Vec3 {
        self.look_direction
    }

    /// Current follow settings
    pub fn follow_target(&self) -> Option<&FollowTarget> {
        self.follow.as_ref()
    }

    /// Z rotation of the camera's transform, in degrees
    pub fn z_rotation(&self, transforms: &TransformArena) -> f32 {
        self.transform
            .and_then(|key| transforms.local(key))
            .map_or(0.0, |local| local.rotation.z)
    }

    // Matrices

    /// Whether the cached matrices are out of date
    pub fn is_stale(&self, transforms: &TransformArena) -> bool {
        if self.needs_update {
            return true;
        }
        match self.transform {
            Some(key) => transforms.needs_refresh(key) || transforms.revision(key) != Some(self.seen_revision),
            None => false,
        }
    }

    /// Force a recompute on next access
    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    /// Recompute view, projection and combined matrices
    pub fn update_matrices(&mut self, transforms: &mut TransformArena) {
        let Some(key) = self.transform else {
            return;
        };
        let Some(position) = transforms.world_position(key) else {
            log::warn!("Camera: Transform {:?} no longer exists", key);
            return;
        };

        self.view = Mat4::look_at(position, position + self.look_direction, self.up);

        let half_width = self.viewport.x / self.zoom * 0.5;
        let half_height = self.viewport.y / self.zoom * 0.5;
        self.projection = Mat4::orthographic(-half_width, half_width, -half_height, half_height, self.near, self.far);

        self.combined = self.projection * self.view;
        self.seen_revision = transforms.revision(key).unwrap_or_default();
        self.needs_update = false;
    }

    fn refresh(&mut self, transforms: &mut TransformArena) {
        if self.is_stale(transforms) {
            self.update_matrices(transforms);
        }
    }

    /// World-to-view matrix
    pub fn view_matrix(&mut self, transforms: &mut TransformArena) -> Mat4 {
        self.refresh(transforms);
        self.view
    }

    /// Orthographic projection matrix
    pub fn projection_matrix(&mut self, transforms: &mut TransformArena) -> Mat4 {
        self.refresh(transforms);
        self.projection
    }

    /// Projection × view
    pub fn combined_matrix(&mut self, transforms: &mut TransformArena) -> Mat4 {
        self.refresh(transforms);
        self.combined
    }

    // Conversions

    /// Project a world point to screen pixels (origin top-left, Y down)
    pub fn world_to_screen_point(&mut self, transforms: &mut TransformArena, world: Vec3) -> Vec2 {
        self.refresh(transforms);

        let clip = self.combined * Vec4::new(world.x, world.y, world.z, 1.0);
        let ndc = clip.xyz() / clip.w;

        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }

    /// Unproject screen pixels to a point on the world z = 0 plane
    ///
    /// The inverse of [`world_to_screen_point`](Self::world_to_screen_point)
    /// for points with z = 0.
    pub fn screen_to_world_point(&mut self, transforms: &mut TransformArena, screen: Vec2) -> Vec3 {
        self.refresh(transforms);

        let Some(inverse) = self.combined.try_inverse() else {
            log::error!("Camera: Combined matrix is not invertible");
            return Vec3::zeros();
        };

        let ndc_x = screen.x / self.viewport.x * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / self.viewport.y * 2.0;

        // depth of the z = 0 plane below the camera
        let position = self
            .transform
            .and_then(|key| transforms.world_position(key))
            .unwrap_or_else(Vec3::zeros);
        let plane = self.combined * Vec4::new(position.x, position.y, 0.0, 1.0);
        let ndc_z = plane.z / plane.w;

        let world = inverse * Vec4::new(ndc_x, ndc_y, ndc_z, 1.0);
        world.xyz() / world.w
    }

    /// Whether a world point lands inside the viewport, edges included
    pub fn is_visible(&mut self, transforms: &mut TransformArena, world: Vec3) -> bool {
        let screen = self.world_to_screen_point(transforms, world);
        screen.x >= 0.0 && screen.x <= self.viewport.x && screen.y >= 0.0 && screen.y <= self.viewport.y
    }

    // Frustum

    /// World-space region seen by the camera
    ///
    /// With rotation applied and a non-zero Z rotation on the transform, this
    /// is the axis-aligned hull of the rotated view rectangle.
    #[allow(clippy::float_cmp)]
    pub fn frustum(&mut self, transforms: &mut TransformArena) -> Frustum {
        self.refresh(transforms);

        let half_width = self.viewport.x / self.zoom * 0.5;
        let half_height = self.viewport.y / self.zoom * 0.5;
        let position = self
            .transform
            .and_then(|key| transforms.world_position(key))
            .unwrap_or_else(Vec3::zeros);

        let frustum = Frustum::around(position, half_width, half_height, self.near, self.far);
        let rotation = self.z_rotation(transforms);
        if self.apply_rotation && rotation != 0.0 {
            frustum.rotated_bounds(position, utils::deg_to_rad(rotation))
        } else {
            frustum
        }
    }

    /// Whether `aabb` overlaps the frustum; Z is only tested when `check_z`
    pub fn is_box_visible(&mut self, transforms: &mut TransformArena, aabb: &Aabb, check_z: bool) -> bool {
        self.frustum(transforms).intersects_aabb(aabb, check_z)
    }

    // Mutators

    /// Set the zoom factor; non-positive values fall back to [`MIN_ZOOM`]
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom > 0.0 {
            zoom
        } else {
            log::warn!("Camera: Zoom must be positive, got {}; using {}", zoom, MIN_ZOOM);
            MIN_ZOOM
        };
        self.needs_update = true;
    }

    /// Add `delta` to the zoom factor
    pub fn zoom_by(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta);
    }

    /// Change the viewport size in pixels
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.needs_update = true;
    }

    /// Move the camera's transform to `position`
    pub fn move_to(&mut self, transforms: &mut TransformArena, position: Vec3) {
        if let Some(key) = self.transform {
            transforms.set_position(key, position);
            self.needs_update = true;
        }
    }

    /// Move the camera's transform by `delta`
    pub fn move_by(&mut self, transforms: &mut TransformArena, delta: Vec3) {
        if let Some(key) = self.transform {
            transforms.translate(key, delta);
            self.needs_update = true;
        }
    }

    /// Set the transform position and recompute right away
    pub fn set_position(&mut self, transforms: &mut TransformArena, position: Vec3) {
        self.move_to(transforms, position);
        self.update_matrices(transforms);
    }

    /// Set the transform rotation (degrees) and recompute right away
    pub fn set_rotation(&mut self, transforms: &mut TransformArena, degrees: Vec3) {
        if let Some(key) = self.transform {
            transforms.set_rotation(key, degrees);
            self.needs_update = true;
            self.update_matrices(transforms);
        }
    }

    /// Set the transform scale and recompute right away
    pub fn set_scale(&mut self, transforms: &mut TransformArena, scale: Vec3) {
        if let Some(key) = self.transform {
            transforms.set_scale(key, scale);
            self.needs_update = true;
            self.update_matrices(transforms);
        }
    }

    /// Roll the view about world Z by `degrees`
    ///
    /// Only the up vector and look direction turn; the transform and the
    /// frustum are unaffected.
    pub fn spin(&mut self, transforms: &mut TransformArena, degrees: f32) {
        let rotation = Mat4::rotation_z(utils::deg_to_rad(degrees));
        self.up = (rotation * self.up.push(0.0)).xyz().normalize();
        self.look_direction = (rotation * self.look_direction.push(0.0)).xyz();
        self.needs_update = true;
        self.update_matrices(transforms);
    }

    // Following

    /// Snap to the target's X/Y now and on every update
    pub fn follow(&mut self, transforms: &mut TransformArena, target: TransformKey) {
        self.follow = Some(FollowTarget {
            target,
            smooth: false,
            speed: self.follow_speed,
        });
        self.snap_to_target(transforms, target);
    }

    /// Ease towards the target's X/Y on every update
    pub fn follow_smooth(&mut self, target: TransformKey, speed: f32) {
        self.follow = Some(FollowTarget {
            target,
            smooth: true,
            speed,
        });
    }

    /// Stop tracking the follow target
    pub fn stop_following(&mut self) {
        self.follow = None;
    }

    fn snap_to_target(&mut self, transforms: &mut TransformArena, target: TransformKey) {
        let (Some(key), Some(goal)) = (self.transform, transforms.world_position(target)) else {
            return;
        };
        let z = transforms.local(key).map_or(0.0, |local| local.position.z);
        self.move_to(transforms, Vec3::new(goal.x, goal.y, z));
    }

    /// Advance following by `delta_time` seconds
    pub fn update_follow(&mut self, transforms: &mut TransformArena, delta_time: f32) {
        let (Some(follow), Some(key)) = (self.follow, self.transform) else {
            return;
        };
        let Some(goal) = transforms.world_position(follow.target) else {
            log::warn!("Camera: Follow target {:?} no longer exists; stopping", follow.target);
            self.follow = None;
            return;
        };

        if follow.smooth {
            let Some(current) = transforms.local(key).map(|local| local.position) else {
                return;
            };
            let t = follow.speed * delta_time;
            let next = Vec3::new(utils::lerp(current.x, goal.x, t), utils::lerp(current.y, goal.y, t), current.z);
            self.move_to(transforms, next);
        } else {
            self.snap_to_target(transforms, follow.target);
        }
    }
}

impl Component for CameraComponent {
    fn awake(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), EcsError> {
        let Some(key) = ctx.world.transform_key(ctx.entity) else {
            return Err(EcsError::MissingDependency {
                entity: ctx.entity,
                component: "Camera",
                required: "Transform",
            });
        };
        self.transform = Some(key);
        self.update_matrices(&mut ctx.world.transforms);

        if ctx.world.claim_active_camera(ctx.key) {
            self.active = true;
            log::debug!("Camera: {} is now the active camera", ctx.entity);
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, delta_time: f32) {
        let transforms = &mut ctx.world.transforms;
        self.update_follow(transforms, delta_time);
        self.refresh(transforms);
    }

    fn destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.world.release_active_camera(ctx.key);
        self.follow = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Entity;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    fn bound_camera() -> (CameraComponent, TransformArena) {
        let mut transforms = TransformArena::new();
        let key = transforms.insert(Entity::new(1), Transform::default());
        let mut camera = CameraComponent::new();
        camera.transform = Some(key);
        camera.update_matrices(&mut transforms);
        (camera, transforms)
    }

    #[test]
    fn test_default_frustum() {
        let (mut camera, mut transforms) = bound_camera();
        let frustum = camera.frustum(&mut transforms);

        assert_relative_eq!(frustum.left, -400.0);
        assert_relative_eq!(frustum.right, 400.0);
        assert_relative_eq!(frustum.bottom, -300.0);
        assert_relative_eq!(frustum.top, 300.0);
        assert_relative_eq!(frustum.near, 0.1);
        assert_relative_eq!(frustum.far, 1000.0);
    }

    #[test]
    fn test_world_to_screen_flips_y() {
        let (mut camera, mut transforms) = bound_camera();

        let screen = camera.world_to_screen_point(&mut transforms, Vec3::new(100.0, 50.0, 0.0));
        assert_relative_eq!(screen, Vec2::new(500.0, 250.0), epsilon = 1e-3);

        let world = camera.screen_to_world_point(&mut transforms, Vec2::new(500.0, 250.0));
        assert_relative_eq!(world, Vec3::new(100.0, 50.0, 0.0), epsilon = 1e-3);
    }

    #[test]
    fn test_non_positive_zoom_is_clamped() {
        let mut camera = CameraComponent::new();

        camera.set_zoom(0.0);
        assert_relative_eq!(camera.zoom(), MIN_ZOOM);

        camera.set_zoom(-3.0);
        assert_relative_eq!(camera.zoom(), MIN_ZOOM);

        camera.set_zoom(2.0);
        camera.zoom_by(-5.0);
        assert_relative_eq!(camera.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_mutators_mark_stale() {
        let (mut camera, mut transforms) = bound_camera();
        assert!(!camera.is_stale(&transforms));

        camera.resize(1024.0, 768.0);
        assert!(camera.is_stale(&transforms));
        camera.frustum(&mut transforms);
        assert!(!camera.is_stale(&transforms));

        camera.move_by(&mut transforms, Vec3::new(1.0, 0.0, 0.0));
        assert!(camera.is_stale(&transforms));
    }

    #[test]
    fn test_external_transform_refresh_is_noticed() {
        let (mut camera, mut transforms) = bound_camera();
        let key = camera.transform().unwrap();

        transforms.set_position(key, Vec3::new(50.0, 0.0, 0.0));
        transforms.update_world_matrix(key);
        assert!(!transforms.needs_refresh(key));
        assert!(camera.is_stale(&transforms));

        let frustum = camera.frustum(&mut transforms);
        assert_relative_eq!(frustum.left, -350.0);
    }

    #[test]
    fn test_spin_turns_up_vector() {
        let (mut camera, mut transforms) = bound_camera();

        camera.spin(&mut transforms, 90.0);

        assert_relative_eq!(camera.up(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(camera.look_direction(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
        assert!(!camera.is_stale(&transforms));

        // the camera's right is now world +Y
        let screen = camera.world_to_screen_point(&mut transforms, Vec3::new(0.0, 100.0, 0.0));
        assert_relative_eq!(screen, Vec2::new(500.0, 300.0), epsilon = 1e-3);
    }

    #[test]
    fn test_unbound_camera_is_harmless() {
        let mut transforms = TransformArena::new();
        let mut camera = CameraComponent::new();

        camera.move_to(&mut transforms, Vec3::new(1.0, 1.0, 0.0));
        camera.update_follow(&mut transforms, 0.1);
        assert!(camera.transform().is_none());
    }
}
