//! No-target search policy
//!
//! Runs on every cycle without a selected target. Short gaps are held out,
//! then the vehicle either backs off to re-acquire a lost face or rotates
//! in place to sweep the camera.

use crate::command::VelocityCommand;
use crate::config::SearchConfig;
use crate::state::TrackState;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Search state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchState {
    #[default]
    Scanning,
    RecoveringFromLoss,
}

/// What the policy did this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction {
    /// Still inside the wait window, previous command kept
    Hold { missed: u32 },
    /// Backing off and dropping to widen the view
    Recover,
    /// Rotating in place
    Scan,
}

#[derive(Debug, Clone)]
pub struct SearchPolicy {
    config: SearchConfig,
    /// `None` while a target is being tracked
    state: Option<SearchState>,
}

impl SearchPolicy {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            state: Some(SearchState::Scanning),
        }
    }

    pub fn state(&self) -> Option<SearchState> {
        self.state
    }

    /// A target was selected: leave search and arm recovery for the next loss
    pub fn on_target(&mut self, track: &mut TrackState) {
        if self.state.take().is_some() {
            debug!("search: target acquired");
        }
        track.miss_count = 0;
        track.had_face = true;
    }

    /// No target this cycle. Updates `command` only once the wait window is exceeded.
    pub fn on_miss(&mut self, track: &mut TrackState, command: &mut VelocityCommand) -> SearchAction {
        track.locked = false;
        track.miss_count = track.miss_count.saturating_add(1);

        if track.miss_count <= self.config.wait_cycles {
            return SearchAction::Hold {
                missed: track.miss_count,
            };
        }
        track.miss_count = 0;

        if track.had_face {
            track.had_face = false;
            self.state = Some(SearchState::RecoveringFromLoss);
            command.forward_back = self.config.recover_forward;
            command.up_down = self.config.recover_vertical;
            debug!("search: recovering from loss ({})", command);
            SearchAction::Recover
        } else {
            self.state = Some(SearchState::Scanning);
            command.yaw = self.config.scan_yaw * track.last_known_direction.sign();
            command.forward_back = 0;
            command.up_down = 0;
            debug!("search: scanning ({})", command);
            SearchAction::Scan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SearchDirection;

    fn policy() -> SearchPolicy {
        SearchPolicy::new(SearchConfig::default())
    }

    #[test]
    fn test_holds_inside_wait_window() {
        let mut search = policy();
        let mut track = TrackState::default();
        let prior = VelocityCommand {
            forward_back: 12,
            up_down: -4,
            yaw: 9,
            left_right: 0,
        };
        let mut cmd = prior;

        for i in 1..=10 {
            assert_eq!(search.on_miss(&mut track, &mut cmd), SearchAction::Hold { missed: i });
            assert_eq!(cmd, prior);
        }
        assert_eq!(search.on_miss(&mut track, &mut cmd), SearchAction::Scan);
        assert_eq!(cmd.yaw, 25);
        assert_eq!((cmd.forward_back, cmd.up_down), (0, 0));
        assert_eq!(track.miss_count, 0);
    }

    #[test]
    fn test_recovers_then_scans_after_loss() {
        let mut search = policy();
        let mut track = TrackState::default();
        let mut cmd = VelocityCommand {
            yaw: 6,
            ..Default::default()
        };
        search.on_target(&mut track);
        assert!(search.state().is_none());

        for _ in 0..10 {
            search.on_miss(&mut track, &mut cmd);
        }
        assert_eq!(search.on_miss(&mut track, &mut cmd), SearchAction::Recover);
        assert_eq!(search.state(), Some(SearchState::RecoveringFromLoss));
        assert_eq!((cmd.forward_back, cmd.up_down, cmd.yaw), (-20, -30, 6));
        assert!(!track.had_face);

        for _ in 0..10 {
            search.on_miss(&mut track, &mut cmd);
        }
        assert_eq!(search.on_miss(&mut track, &mut cmd), SearchAction::Scan);
        assert_eq!(search.state(), Some(SearchState::Scanning));
    }

    #[test]
    fn test_scan_turns_toward_last_seen_side() {
        let mut search = policy();
        let mut track = TrackState {
            last_known_direction: SearchDirection::Left,
            ..Default::default()
        };
        let mut cmd = VelocityCommand::HOLD;
        for _ in 0..11 {
            search.on_miss(&mut track, &mut cmd);
        }
        assert_eq!(cmd.yaw, -25);
    }

    #[test]
    fn test_target_resets_counter() {
        let mut search = policy();
        let mut track = TrackState::default();
        let mut cmd = VelocityCommand::HOLD;
        for _ in 0..7 {
            search.on_miss(&mut track, &mut cmd);
        }
        search.on_target(&mut track);
        assert_eq!(track.miss_count, 0);
        assert!(track.had_face);
    }
}
