//! Pilot configuration
//!
//! Sources, later ones winning: built-in defaults, an optional file, then
//! `FACE_PILOT__*` environment variables (e.g. `FACE_PILOT__SERVO__TARGET_NAME`).

use crate::sim::SimConfig;
use crate::PilotError;
use ::config::{Config, Environment, File};
use face_id::StoreConfig;
use serde::{Deserialize, Serialize};
use servo::ServoConfig;
use std::path::Path;
use tracing::info;
use vehicle_link::VehicleConfig;

pub const ENV_PREFIX: &str = "FACE_PILOT";

/// Control loop cadence and detection duty cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Target loop rate (cycles per second)
    pub fps: u32,

    /// Run the detector on every n-th cycle
    pub detection_interval: u32,

    /// Downscale applied to frames before detection
    pub detection_scale: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            fps: 25,
            detection_interval: 2,
            detection_scale: 0.5,
        }
    }
}

/// Complete pilot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub servo: ServoConfig,
    pub vehicle: VehicleConfig,
    pub store: StoreConfig,
    pub control: ControlConfig,
    pub sim: SimConfig,
}

impl PilotConfig {
    /// Load defaults, then `path` (if given), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, PilotError> {
        let mut builder = Config::builder().add_source(Config::try_from(&PilotConfig::default())?);
        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: PilotConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), PilotError> {
        self.servo.validate()?;

        if self.control.fps == 0 {
            return Err(PilotError::Config("FPS must be positive".to_string()));
        }
        if self.control.detection_interval == 0 {
            return Err(PilotError::Config("Detection interval must be positive".to_string()));
        }
        let scale = self.control.detection_scale;
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(PilotError::Config(format!(
                "Detection scale must lie in (0, 1], got {}",
                scale
            )));
        }
        if self.store.match_tolerance <= 0.0 {
            return Err(PilotError::Config("Match tolerance must be positive".to_string()));
        }
        Ok(())
    }
}
