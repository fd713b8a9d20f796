//! Built-in components
//!
//! Transform places an entity in the hierarchy; Camera and Sprite both
//! require a Transform sibling and fail to wake without one.

pub mod camera;
pub mod sprite;
pub mod transform;

pub use camera::{CameraComponent, FollowTarget, MIN_ZOOM};
pub use sprite::{ScreenPlacement, SpriteComponent};
pub use transform::TransformComponent;
