//! Operator input
//!
//! One key per line on stdin. Axis keys act for a single cycle, like a key
//! press sampled once per frame.

use servo::{AxisInput, ManualInput, ModeRequest};
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Manual axis key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualKey {
    Forward,
    Back,
    Right,
    Left,
    Up,
    Down,
    YawRight,
    YawLeft,
}

/// Discrete operator event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorEvent {
    Takeoff,
    Land,
    ToggleOverride,
    ToggleEnroll,
    Manual(ManualKey),
    SetTarget(Option<String>),
    Quit,
}

impl OperatorEvent {
    /// Parse one input line. Unknown keys yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut parts = line.splitn(2, char::is_whitespace);
        let key = parts.next()?.to_ascii_lowercase();
        let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let event = match key.as_str() {
            "t" => OperatorEvent::Takeoff,
            "l" => OperatorEvent::Land,
            "o" => OperatorEvent::ToggleOverride,
            "v" => OperatorEvent::ToggleEnroll,
            "w" => OperatorEvent::Manual(ManualKey::Forward),
            "s" => OperatorEvent::Manual(ManualKey::Back),
            "d" => OperatorEvent::Manual(ManualKey::Right),
            "a" => OperatorEvent::Manual(ManualKey::Left),
            "r" => OperatorEvent::Manual(ManualKey::Up),
            "f" => OperatorEvent::Manual(ManualKey::Down),
            "e" => OperatorEvent::Manual(ManualKey::YawRight),
            "q" => OperatorEvent::Manual(ManualKey::YawLeft),
            "target" => OperatorEvent::SetTarget(rest.map(str::to_string)),
            "esc" | "quit" => OperatorEvent::Quit,
            _ => return None,
        };
        Some(event)
    }

    /// Mode request carried by this event, if any
    pub fn mode_request(&self) -> Option<ModeRequest> {
        match self {
            OperatorEvent::ToggleOverride => Some(ModeRequest::ToggleOverride),
            OperatorEvent::ToggleEnroll => Some(ModeRequest::ToggleEnroll),
            OperatorEvent::SetTarget(name) => Some(ModeRequest::SetTarget(name.clone())),
            _ => None,
        }
    }
}

/// Axis keys seen during one cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyState {
    keys: [bool; 8],
}

impl KeyState {
    pub fn press(&mut self, key: ManualKey) {
        self.keys[key as usize] = true;
    }

    fn held(&self, key: ManualKey) -> bool {
        self.keys[key as usize]
    }

    pub fn to_input(self) -> ManualInput {
        ManualInput {
            forward_back: AxisInput::from_pair(self.held(ManualKey::Forward), self.held(ManualKey::Back)),
            left_right: AxisInput::from_pair(self.held(ManualKey::Right), self.held(ManualKey::Left)),
            up_down: AxisInput::from_pair(self.held(ManualKey::Up), self.held(ManualKey::Down)),
            yaw: AxisInput::from_pair(self.held(ManualKey::YawRight), self.held(ManualKey::YawLeft)),
        }
    }
}

/// Read operator events from stdin on a dedicated thread.
///
/// The thread stops after forwarding `Quit`, at end of input, or once the
/// receiver is dropped.
pub fn spawn_stdin_reader(capacity: usize) -> mpsc::Receiver<OperatorEvent> {
    let (tx, rx) = mpsc::channel(capacity);

    let spawned = thread::Builder::new()
        .name("operator-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Operator input closed: {}", e);
                        break;
                    }
                };
                let Some(event) = OperatorEvent::parse(&line) else {
                    debug!("Ignoring operator input {:?}", line);
                    continue;
                };
                let quit = event == OperatorEvent::Quit;
                if tx.blocking_send(event).is_err() || quit {
                    break;
                }
            }
            info!("Operator input reader stopped");
        });

    if let Err(e) = spawned {
        warn!("Failed to start operator input reader: {}", e);
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_map() {
        assert_eq!(OperatorEvent::parse("t"), Some(OperatorEvent::Takeoff));
        assert_eq!(OperatorEvent::parse(" L \n"), Some(OperatorEvent::Land));
        assert_eq!(OperatorEvent::parse("o"), Some(OperatorEvent::ToggleOverride));
        assert_eq!(OperatorEvent::parse("v"), Some(OperatorEvent::ToggleEnroll));
        assert_eq!(OperatorEvent::parse("q"), Some(OperatorEvent::Manual(ManualKey::YawLeft)));
        assert_eq!(OperatorEvent::parse("esc"), Some(OperatorEvent::Quit));
        assert_eq!(OperatorEvent::parse("quit"), Some(OperatorEvent::Quit));
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(
            OperatorEvent::parse("target alice"),
            Some(OperatorEvent::SetTarget(Some("alice".to_string())))
        );
        assert_eq!(OperatorEvent::parse("target"), Some(OperatorEvent::SetTarget(None)));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        assert_eq!(OperatorEvent::parse("x"), None);
        assert_eq!(OperatorEvent::parse(""), None);
    }

    #[test]
    fn test_key_state_to_input() {
        let mut keys = KeyState::default();
        keys.press(ManualKey::Back);
        keys.press(ManualKey::YawRight);
        keys.press(ManualKey::YawLeft);
        let input = keys.to_input();
        assert_eq!(input.forward_back, AxisInput::Negative);
        assert_eq!(input.yaw, AxisInput::Positive);
        assert_eq!(input.left_right, AxisInput::Neutral);
    }

    #[test]
    fn test_mode_requests() {
        assert_eq!(OperatorEvent::ToggleEnroll.mode_request(), Some(ModeRequest::ToggleEnroll));
        assert!(OperatorEvent::Takeoff.mode_request().is_none());
    }
}
