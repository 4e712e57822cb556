//! Four-axis velocity command

use serde::{Deserialize, Serialize};
use std::fmt;

/// Velocity command handed to the vehicle every cycle.
///
/// Zero on every axis is itself a command ("hold position").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VelocityCommand {
    pub forward_back: i32,
    pub left_right: i32,
    pub up_down: i32,
    pub yaw: i32,
}

impl VelocityCommand {
    pub const HOLD: Self = Self {
        forward_back: 0,
        left_right: 0,
        up_down: 0,
        yaw: 0,
    };

    pub fn is_hold(&self) -> bool {
        *self == Self::HOLD
    }

    /// Clamp every axis to `[-limit, limit]`
    pub fn clamped(self, limit: i32) -> Self {
        let limit = limit.abs();
        Self {
            forward_back: self.forward_back.clamp(-limit, limit),
            left_right: self.left_right.clamp(-limit, limit),
            up_down: self.up_down.clamp(-limit, limit),
            yaw: self.yaw.clamp(-limit, limit),
        }
    }

    /// Axes in vehicle argument order: (left_right, forward_back, up_down, yaw)
    pub fn as_tuple(&self) -> (i32, i32, i32, i32) {
        (self.left_right, self.forward_back, self.up_down, self.yaw)
    }
}

impl fmt::Display for VelocityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fb={} lr={} ud={} yaw={}",
            self.forward_back, self.left_right, self.up_down, self.yaw
        )
    }
}

/// Round a controller output to the nearest integer and bound it
pub fn to_axis(value: f64, limit: i32) -> i32 {
    let limit = limit.abs();
    if value.is_nan() {
        return 0;
    }
    let bound = f64::from(limit);
    value.round().clamp(-bound, bound) as i32
}
