//! Spatial scene data
//!
//! The transform hierarchy and the bounding volumes used for culling. Both
//! are plain data owned by the [`World`](crate::ecs::World); components
//! reach them through their keys.

pub mod bounds;
pub mod hierarchy;

pub use bounds::{Aabb, Frustum};
pub use hierarchy::{TransformArena, TransformKey, TransformNode};
