//! Host integration
//!
//! The engine owns one [`World`] and drives it from the host's frame loop.
//! It holds no globals; `reset` simply builds a fresh, empty world.

use crate::{
    config::{ConfigError, EngineConfig},
    ecs::{components::CameraComponent, ComponentHandle, EcsError, Entity, World},
    foundation::time::Timer,
};
use thiserror::Error;

/// Main engine struct
///
/// Call [`run`](Self::run) once, then [`tick`](Self::tick) (or
/// [`frame`](Self::frame)) every host frame.
pub struct Engine {
    world: World,
    config: EngineConfig,
    timer: Timer,
    running: bool,
    default_camera: Option<(Entity, ComponentHandle<CameraComponent>)>,
}

impl Engine {
    /// Validate `config` and build the world
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        let mut engine = Self {
            world: Self::build_world(&config),
            config,
            timer: Timer::new(),
            running: false,
            default_camera: None,
        };
        engine.setup_scene()?;
        Ok(engine)
    }

    /// Load configuration from a `.toml` or `.ron` file and build the engine
    pub fn from_config_file(path: &str) -> Result<Self, EngineError> {
        use crate::config::Config;
        Self::new(EngineConfig::load_from_file(path)?)
    }

    fn build_world(config: &EngineConfig) -> World {
        World::with_config(&config.scheduler)
    }

    fn setup_scene(&mut self) -> Result<(), EngineError> {
        self.default_camera = if self.config.spawn_default_camera {
            Some(self.world.spawn_camera(&self.config.camera)?)
        } else {
            None
        };
        Ok(())
    }

    /// Warm every component up with `start` and begin accepting ticks
    pub fn run(&mut self) {
        log::info!("Starting main loop...");
        self.world.start_all();
        self.timer.reset();
        self.running = true;
    }

    /// Stop accepting ticks
    pub fn stop(&mut self) {
        if self.running {
            log::info!("Engine stopped");
        }
        self.running = false;
    }

    /// Whether ticks are currently applied
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the world by `delta_time` seconds; ignored while stopped
    pub fn tick(&mut self, delta_time: f32) {
        if self.running {
            self.world.update(delta_time);
        }
    }

    /// Measure the time since the previous frame and tick with it
    pub fn frame(&mut self) -> f32 {
        self.timer.update();
        let delta_time = self.timer.delta_time();
        self.tick(delta_time);
        delta_time
    }

    /// Throw the world away and build an empty one from the same configuration
    ///
    /// Entity ids start over at 1 and no components remain, including the
    /// default camera; spawn a new one with [`World::spawn_camera`] if needed.
    /// The engine keeps its running state.
    pub fn reset(&mut self) {
        log::info!("Resetting world");
        self.world = Self::build_world(&self.config);
        self.default_camera = None;
    }

    /// The world being driven
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frame timer used by [`frame`](Self::frame)
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Entity and component of the camera created at startup
    pub fn default_camera(&self) -> Option<(Entity, ComponentHandle<CameraComponent>)> {
        self.default_camera
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Building the initial scene failed
    #[error("Scene setup failed: {0}")]
    Scene(#[from] EcsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::TransformComponent;
    use crate::ecs::{Component, ComponentContext};
    use std::cell::Cell;
    use std::rc::Rc;

    struct StartCounter(Rc<Cell<u32>>);

    impl Component for StartCounter {
        fn start(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_new_spawns_default_camera() {
        crate::foundation::logging::try_init();
        let engine = Engine::new(EngineConfig::default()).unwrap();

        let (entity, camera) = engine.default_camera().unwrap();
        assert_eq!(entity.id(), 1);
        assert_eq!(engine.world().active_camera(), Some(camera.key()));
    }

    #[test]
    fn test_without_default_camera() {
        let config = EngineConfig {
            spawn_default_camera: false,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();

        assert!(engine.default_camera().is_none());
        assert_eq!(engine.world().entity_count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.camera.far = config.camera.near;

        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_ticks_apply_only_while_running() {
        let count = Rc::new(Cell::new(0));
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let entity = engine.world_mut().create_entity();
        engine.world_mut().add_component(entity, StartCounter(count.clone())).unwrap();

        engine.tick(0.016);
        assert_eq!(count.get(), 0);

        engine.run();
        assert_eq!(count.get(), 1);

        engine.tick(0.016);
        assert_eq!(count.get(), 2);

        engine.stop();
        engine.tick(0.016);
        assert!(!engine.is_running());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_frame_measures_time() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.run();

        let delta_time = engine.frame();

        assert!(delta_time >= 0.0);
        assert_eq!(engine.timer().frame_count(), 1);
    }

    #[test]
    fn test_reset_empties_world_and_restarts_ids() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let entity = engine.world_mut().create_entity();
        engine.world_mut().add_component(entity, TransformComponent::new()).unwrap();

        engine.reset();

        assert_eq!(engine.world().entity_count(), 0);
        assert!(engine.world().components.is_empty());
        assert!(engine.world().transforms.is_empty());
        assert!(engine.world().active_camera().is_none());
        assert!(engine.default_camera().is_none());
        assert_eq!(engine.world_mut().create_entity().id(), 1);
    }

    #[test]
    fn test_camera_can_be_spawned_after_reset() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.reset();

        let camera_config = engine.config().camera.clone();
        let (entity, camera) = engine.world_mut().spawn_camera(&camera_config).unwrap();

        assert_eq!(entity.id(), 1);
        assert_eq!(engine.world().active_camera(), Some(camera.key()));
    }
}
