//! Servo configuration

use crate::ServoError;
use serde::{Deserialize, Serialize};

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Reference frame the boxes are expressed in
    pub frame: FrameConfig,

    /// Vehicle safety bound: every axis is clamped to [-limit, limit]
    pub command_limit: i32,

    pub approach: ApproachConfig,

    pub search: SearchConfig,

    pub manual: ManualConfig,

    /// Only follow this identity in autonomous mode (any known face when unset)
    pub target_name: Option<String>,
}

/// Reference frame dimensions (pixels)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: i32,
    pub height: i32,
}

/// Approach controller gains and convergence bands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproachConfig {
    /// Gain for yaw and vertical axes
    pub gain_yaw: f64,

    /// Gain for the forward/back axis
    pub gain_forward: f64,

    /// Horizontal aim tolerance (pixels)
    pub tolerance_x: i32,

    /// Vertical aim tolerance (pixels)
    pub tolerance_y: i32,

    /// Half of the box side length at the desired standoff (pixels)
    pub depth_box_size: i32,

    /// Allowed deviation of box width/height from the standoff size (pixels)
    pub depth_tolerance: i32,

    /// Boxes wider than `oversize_factor * depth_box_size` are not approached while unaimed
    pub oversize_factor: f64,
}

/// No-target search behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Empty cycles tolerated before acting
    pub wait_cycles: u32,

    /// Yaw rate used when scanning for a face
    pub scan_yaw: i32,

    /// Forward/back velocity while recovering a lost face
    pub recover_forward: i32,

    /// Vertical velocity while recovering a lost face
    pub recover_vertical: i32,
}

/// Operator override speeds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    /// Forward/back, left/right and up/down speed
    pub speed: i32,

    pub yaw_speed: i32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            command_limit: 100,
            approach: ApproachConfig::default(),
            search: SearchConfig::default(),
            manual: ManualConfig::default(),
            target_name: None,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
        }
    }
}

impl Default for ApproachConfig {
    fn default() -> Self {
        Self {
            gain_yaw: 100.0,
            gain_forward: 15.0,
            tolerance_x: 50,
            tolerance_y: 50,
            depth_box_size: 150,
            depth_tolerance: 50,
            oversize_factor: 1.5,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wait_cycles: 10,
            scan_yaw: 25,
            recover_forward: -20,
            recover_vertical: -30,
        }
    }
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            speed: 50,
            yaw_speed: 100,
        }
    }
}

/// An empty target name follows any known face
pub(crate) fn named_target(name: Option<&str>) -> Option<&str> {
    name.filter(|name| !name.is_empty())
}

impl ServoConfig {
    /// Target name, treating an empty string as unset
    pub fn target(&self) -> Option<&str> {
        named_target(self.target_name.as_deref())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ServoError> {
        if self.frame.width <= 0 || self.frame.height <= 0 {
            return Err(ServoError::Config(format!(
                "Frame size must be positive, got {}x{}",
                self.frame.width, self.frame.height
            )));
        }
        if self.command_limit <= 0 {
            return Err(ServoError::Config("Command limit must be positive".to_string()));
        }

        let limit = f64::from(self.command_limit);
        let approach = &self.approach;
        if !(0.0..=limit).contains(&approach.gain_yaw) || !(0.0..=limit).contains(&approach.gain_forward) {
            return Err(ServoError::Config(format!(
                "Approach gains must be between 0 and {}",
                self.command_limit
            )));
        }
        if approach.depth_box_size <= 0 {
            return Err(ServoError::Config("Depth box size must be positive".to_string()));
        }
        if approach.tolerance_x < 0 || approach.tolerance_y < 0 || approach.depth_tolerance < 0 {
            return Err(ServoError::Config("Tolerances must not be negative".to_string()));
        }
        if approach.oversize_factor <= 0.0 {
            return Err(ServoError::Config("Oversize factor must be positive".to_string()));
        }

        let speeds = [
            self.search.scan_yaw,
            self.search.recover_forward,
            self.search.recover_vertical,
            self.manual.speed,
            self.manual.yaw_speed,
        ];
        if speeds.iter().any(|s| s.abs() > self.command_limit) {
            return Err(ServoError::Config(format!(
                "Search and manual speeds must lie within +/-{}",
                self.command_limit
            )));
        }

        Ok(())
    }
}
