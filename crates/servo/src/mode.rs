//! Mode arbitration
//!
//! Operator requests are queued and applied at the start of the next cycle.
//! Leaving manual override re-zeros all four axes.

use crate::command::VelocityCommand;
use crate::config::{named_target, ManualConfig};
use crate::state::{Mode, TrackState};
use std::collections::VecDeque;
use tracing::info;

/// Operator request affecting mode or target selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeRequest {
    ToggleOverride,
    ToggleEnroll,
    Set(Mode),
    /// Follow only this identity; `None` or empty follows any known face
    SetTarget(Option<String>),
}

/// One manual axis, driven by a pair of opposing inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisInput {
    #[default]
    Neutral,
    Positive,
    Negative,
}

impl AxisInput {
    /// Positive input wins when both are held
    pub fn from_pair(positive: bool, negative: bool) -> Self {
        if positive {
            AxisInput::Positive
        } else if negative {
            AxisInput::Negative
        } else {
            AxisInput::Neutral
        }
    }

    pub fn velocity(self, speed: i32) -> i32 {
        match self {
            AxisInput::Neutral => 0,
            AxisInput::Positive => speed,
            AxisInput::Negative => -speed,
        }
    }
}

/// Operator axis inputs active this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManualInput {
    pub forward_back: AxisInput,
    pub left_right: AxisInput,
    pub up_down: AxisInput,
    pub yaw: AxisInput,
}

/// Mode transition applied at a cycle boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: Mode,
    pub to: Mode,
}

#[derive(Debug, Clone)]
pub struct ModeSupervisor {
    manual: ManualConfig,
    target_name: Option<String>,
    pending: VecDeque<ModeRequest>,
}

impl ModeSupervisor {
    pub fn new(manual: ManualConfig, target_name: Option<&str>) -> Self {
        Self {
            manual,
            target_name: named_target(target_name).map(str::to_owned),
            pending: VecDeque::new(),
        }
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Queue a request for the next cycle boundary
    pub fn request(&mut self, request: ModeRequest) {
        self.pending.push_back(request);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn next_mode(current: Mode, request: &ModeRequest) -> Mode {
        match (request, current) {
            (ModeRequest::ToggleOverride, Mode::ManualOverride) => Mode::Autonomous,
            (ModeRequest::ToggleOverride, _) => Mode::ManualOverride,
            (ModeRequest::ToggleEnroll, Mode::Enroll) => Mode::Autonomous,
            (ModeRequest::ToggleEnroll, _) => Mode::Enroll,
            (ModeRequest::Set(mode), _) => *mode,
            (ModeRequest::SetTarget(_), mode) => mode,
        }
    }

    /// Apply queued requests. Returns the net mode change, if any.
    pub fn begin_cycle(&mut self, track: &mut TrackState, command: &mut VelocityCommand) -> Option<ModeChange> {
        let start = track.mode;

        while let Some(request) = self.pending.pop_front() {
            if let ModeRequest::SetTarget(name) = &request {
                self.target_name = named_target(name.as_deref()).map(str::to_owned);
                info!("Target set to {}", self.target_name.as_deref().unwrap_or("<any known face>"));
                continue;
            }

            let next = Self::next_mode(track.mode, &request);
            if next == track.mode {
                continue;
            }
            if track.mode == Mode::ManualOverride {
                *command = VelocityCommand::HOLD;
            }
            info!("Mode {:?} -> {:?}", track.mode, next);
            track.mode = next;
            track.locked = false;
        }

        (track.mode != start).then_some(ModeChange {
            from: start,
            to: track.mode,
        })
    }

    /// Command built only from operator inputs
    pub fn manual_command(&self, input: ManualInput) -> VelocityCommand {
        VelocityCommand {
            forward_back: input.forward_back.velocity(self.manual.speed),
            left_right: input.left_right.velocity(self.manual.speed),
            up_down: input.up_down.velocity(self.manual.speed),
            yaw: input.yaw.velocity(self.manual.yaw_speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor() -> ModeSupervisor {
        ModeSupervisor::new(ManualConfig::default(), None)
    }

    #[test]
    fn test_requests_wait_for_cycle_boundary() {
        let mut sup = supervisor();
        let mut track = TrackState::default();
        let mut cmd = VelocityCommand::HOLD;

        sup.request(ModeRequest::ToggleOverride);
        assert_eq!(track.mode, Mode::Autonomous);
        assert!(sup.has_pending());

        let change = sup.begin_cycle(&mut track, &mut cmd).unwrap();
        assert_eq!(change.from, Mode::Autonomous);
        assert_eq!(change.to, Mode::ManualOverride);
        assert_eq!(track.mode, Mode::ManualOverride);
        assert!(sup.begin_cycle(&mut track, &mut cmd).is_none());
    }

    #[test]
    fn test_leaving_override_zeros_axes() {
        let mut sup = supervisor();
        let mut track = TrackState {
            mode: Mode::ManualOverride,
            ..Default::default()
        };
        let mut cmd = VelocityCommand {
            forward_back: 50,
            left_right: -50,
            up_down: 50,
            yaw: 100,
        };
        sup.request(ModeRequest::ToggleOverride);
        sup.begin_cycle(&mut track, &mut cmd);
        assert_eq!(track.mode, Mode::Autonomous);
        assert!(cmd.is_hold());
    }

    #[test]
    fn test_toggle_transitions() {
        assert_eq!(ModeSupervisor::next_mode(Mode::ManualOverride, &ModeRequest::ToggleEnroll), Mode::Enroll);
        assert_eq!(ModeSupervisor::next_mode(Mode::Enroll, &ModeRequest::ToggleOverride), Mode::ManualOverride);
        assert_eq!(ModeSupervisor::next_mode(Mode::Enroll, &ModeRequest::ToggleEnroll), Mode::Autonomous);
        assert_eq!(ModeSupervisor::next_mode(Mode::Autonomous, &ModeRequest::Set(Mode::Enroll)), Mode::Enroll);
    }

    #[test]
    fn test_enroll_from_override_zeros_axes() {
        let mut sup = supervisor();
        let mut track = TrackState {
            mode: Mode::ManualOverride,
            ..Default::default()
        };
        let mut cmd = VelocityCommand {
            yaw: -100,
            ..Default::default()
        };
        sup.request(ModeRequest::ToggleEnroll);
        sup.begin_cycle(&mut track, &mut cmd);
        assert_eq!(track.mode, Mode::Enroll);
        assert!(cmd.is_hold());
    }

    #[test]
    fn test_double_toggle_is_no_change() {
        let mut sup = supervisor();
        let mut track = TrackState::default();
        let mut cmd = VelocityCommand::HOLD;
        sup.request(ModeRequest::ToggleEnroll);
        sup.request(ModeRequest::ToggleEnroll);
        assert!(sup.begin_cycle(&mut track, &mut cmd).is_none());
        assert_eq!(track.mode, Mode::Autonomous);
    }

    #[test]
    fn test_set_target() {
        let mut sup = supervisor();
        let mut track = TrackState::default();
        let mut cmd = VelocityCommand::HOLD;
        sup.request(ModeRequest::SetTarget(Some("alice".into())));
        assert!(sup.target_name().is_none());
        sup.begin_cycle(&mut track, &mut cmd);
        assert_eq!(sup.target_name(), Some("alice"));

        sup.request(ModeRequest::SetTarget(Some(String::new())));
        sup.begin_cycle(&mut track, &mut cmd);
        assert!(sup.target_name().is_none());
    }

    #[test]
    fn test_manual_command() {
        let sup = supervisor();
        let input = ManualInput {
            forward_back: AxisInput::from_pair(true, false),
            left_right: AxisInput::from_pair(false, true),
            up_down: AxisInput::from_pair(false, false),
            yaw: AxisInput::from_pair(true, true),
        };
        let cmd = sup.manual_command(input);
        assert_eq!(cmd.forward_back, 50);
        assert_eq!(cmd.left_right, -50);
        assert_eq!(cmd.up_down, 0);
        assert_eq!(cmd.yaw, 100);
    }
}
