//! Vehicle Link Error Types

use thiserror::Error;

/// Errors that can occur while talking to the vehicle
#[derive(Debug, Error)]
pub enum LinkError {
    /// Vehicle answered a command with a refusal
    #[error("Vehicle rejected command: {command}")]
    Rejected { command: &'static str },

    /// Command issued before a successful connect
    #[error("Vehicle not connected")]
    NotConnected,
}
