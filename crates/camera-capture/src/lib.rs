//! Camera Capture Library for the Face Follower
//!
//! Provides the onboard video stream abstraction:
//! - RGB24 frames with crop, downscale and PNG export
//! - `FrameSource` trait implemented by the vehicle stream (or a simulator)

pub mod frame;

pub use frame::VideoFrame;

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A source of video frames.
///
/// `Ok(None)` means the stream has ended and will not produce further frames.
pub trait FrameSource {
    /// Read the most recent frame
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Stop the stream and release its resources
    fn stop(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        (**self).read()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
