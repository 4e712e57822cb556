//! Face Follower Pilot
//!
//! Wires the controller to its collaborators:
//! - Layered configuration (defaults, file, environment)
//! - Fixed-cadence control loop with alternating detection passes
//! - Operator key events
//! - Simulated vehicle, camera and recognizer for hardware-free runs

pub mod config;
pub mod control;
pub mod input;
pub mod sim;

pub use config::{ControlConfig, PilotConfig};
pub use control::{ControlLoop, ExitReason, SessionSummary};
pub use input::{ManualKey, OperatorEvent};

use camera_capture::CameraError;
use face_id::FaceIdError;
use servo::ServoError;
use thiserror::Error;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use vehicle_link::LinkError;

/// Pilot error types
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("Vehicle setup failed: {0}")]
    Setup(#[source] LinkError),

    #[error("Controller error: {0}")]
    Servo(#[from] ServoError),

    #[error("Face store error: {0}")]
    FaceId(#[from] FaceIdError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize logging on stderr. A second call leaves the first subscriber in place.
pub fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging(Level::INFO);
        init_logging(Level::DEBUG);
    }

    #[test]
    fn test_setup_error_keeps_source() {
        use std::error::Error as _;
        let err = PilotError::Setup(LinkError::Rejected { command: "connect" });
        assert!(err.to_string().contains("connect"));
        assert!(err.source().is_some());
    }
}
