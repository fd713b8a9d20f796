//! # scene2d
//!
//! A 2D entity-component scene runtime.
//!
//! ## Features
//!
//! - **Components**: boxed behaviours with `awake`/`start`/`update`/
//!   `fixed_update`/`destroy` hooks, stored per type and per entity
//! - **Scheduling**: fixed-step accumulation followed by one variable step
//! - **Transforms**: a parent/child hierarchy with lazily recomputed world matrices
//! - **Camera**: orthographic view, world/screen conversion and frustum culling
//!
//! ## Quick Start
//!
//! ```rust
//! use scene2d::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!
//!     let world = engine.world_mut();
//!     let ship = world.create_entity();
//!     world.add_component(ship, TransformComponent::from_position(Vec3::new(100.0, 50.0, 0.0)))?;
//!     world.add_component(ship, SpriteComponent::with_size(32.0, 32.0))?;
//!
//!     engine.run();
//!     engine.tick(1.0 / 60.0);
//!
//!     let (camera, transforms) = engine.world_mut().active_camera_mut().expect("default camera");
//!     let screen = camera.world_to_screen_point(transforms, Vec3::new(100.0, 50.0, 0.0));
//!     assert!((screen.x - 500.0).abs() < 1e-3);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{CameraConfig, Config, EngineConfig, SchedulerConfig},
        ecs::{
            components::{CameraComponent, ScreenPlacement, SpriteComponent, TransformComponent},
            Component, ComponentContext, ComponentHandle, ComponentKey, EcsError, Entity, World,
        },
        foundation::{
            math::{Mat4, Transform, Vec2, Vec3},
            time::{FixedTimestep, Timer},
        },
        scene::{Aabb, Frustum, TransformArena, TransformKey},
        Engine, EngineError,
    };
}
