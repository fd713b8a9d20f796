//! Configuration system
//!
//! Runtime settings are plain serde structs. Every field has a default, so a
//! config file only needs to name what it changes.

pub use serde::{Deserialize, Serialize};

use crate::foundation::time::FixedTimestep;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its valid range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Update loop settings
    pub scheduler: SchedulerConfig,

    /// Defaults applied to cameras built from configuration
    pub camera: CameraConfig,

    /// Create a camera entity (Transform + Camera at the origin) when the
    /// engine starts
    pub spawn_default_camera: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            camera: CameraConfig::default(),
            spawn_default_camera: true,
        }
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check value ranges that would otherwise stall or corrupt the update loop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scheduler.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid {
                field: "scheduler.fixed_timestep",
                reason: format!("must be positive, got {}", self.scheduler.fixed_timestep),
            });
        }
        if self.scheduler.max_fixed_steps == Some(0) {
            return Err(ConfigError::Invalid {
                field: "scheduler.max_fixed_steps",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        if self.camera.far <= self.camera.near {
            return Err(ConfigError::Invalid {
                field: "camera.far",
                reason: format!("must be greater than near ({})", self.camera.near),
            });
        }
        Ok(())
    }
}

/// Fixed/variable step scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Length of one fixed-update step in seconds
    pub fixed_timestep: f32,

    /// Upper bound on fixed steps run in a single frame; `None` catches up fully
    pub max_fixed_steps: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: FixedTimestep::DEFAULT_STEP,
            max_fixed_steps: None,
        }
    }
}

impl SchedulerConfig {
    /// Build the accumulator described by this configuration
    pub fn timestep(&self) -> FixedTimestep {
        FixedTimestep::new(self.fixed_timestep, self.max_fixed_steps)
    }
}

/// Camera defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Viewport width in pixels
    pub viewport_width: f32,

    /// Viewport height in pixels
    pub viewport_height: f32,

    /// Initial zoom factor
    pub zoom: f32,

    /// Near clipping plane
    pub near: f32,

    /// Far clipping plane
    pub far: f32,

    /// Whether the camera's Z rotation widens the culling frustum
    pub apply_rotation: bool,

    /// Default speed for smooth following
    pub follow_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            zoom: 1.0,
            near: 0.1,
            far: 1000.0,
            apply_rotation: true,
            follow_speed: 5.0,
        }
    }
}
