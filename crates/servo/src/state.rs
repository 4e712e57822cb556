//! Controller state carried across cycles

use serde::{Deserialize, Serialize};

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Select, approach and search on detector output
    #[default]
    Autonomous,
    /// Operator drives every axis directly
    ManualOverride,
    /// Approach unknown faces and capture them into the store
    Enroll,
}

/// Side of the frame where the target was last seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchDirection {
    Left,
    #[default]
    Right,
}

impl SearchDirection {
    /// Yaw sign that turns the camera toward this side
    pub fn sign(self) -> i32 {
        match self {
            SearchDirection::Left => -1,
            SearchDirection::Right => 1,
        }
    }
}

/// Per-cycle mutable state owned by the autopilot
#[derive(Debug, Clone, Default)]
pub struct TrackState {
    /// A target was selected this cycle
    pub locked: bool,

    pub last_known_direction: SearchDirection,

    /// Consecutive cycles without a selected target
    pub miss_count: u32,

    /// A target was held since the last search action
    pub had_face: bool,

    pub mode: Mode,
}

impl TrackState {
    /// Record the side of the last seen target from its horizontal error
    pub fn observe_offset(&mut self, horizontal_error: f64) {
        if horizontal_error < 0.0 {
            self.last_known_direction = SearchDirection::Left;
        } else if horizontal_error > 0.0 {
            self.last_known_direction = SearchDirection::Right;
        }
    }
}
