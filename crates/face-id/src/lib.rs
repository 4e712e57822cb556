//! Face Identification Module
//!
//! Identity side of the face follower:
//! - Bounding boxes and labelled detections
//! - Recognizer contract (detection + embedding extraction)
//! - Nearest-neighbour identity matching
//! - Enrolled-target store with two-phase enrollment

pub mod bbox;
pub mod matcher;
pub mod store;

pub use bbox::BoundingBox;
pub use matcher::KnownFaces;
pub use store::{EnrollOutcome, FaceStore, StagedCapture, StoreConfig};

use camera_capture::{CameraError, VideoFrame};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Face identification error types
#[derive(Error, Debug)]
pub enum FaceIdError {
    #[error("Invalid bounding box: top={top} right={right} bottom={bottom} left={left}")]
    InvalidBox {
        top: i32,
        right: i32,
        bottom: i32,
        left: i32,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Face embedding produced by the recognizer
pub type Embedding = ndarray::Array1<f32>;

/// Identity attached to a detection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Matched an enrolled identity
    Known(String),
    /// No enrolled identity passed the match test
    Unknown,
}

impl Label {
    /// Create a known label
    pub fn known(name: impl Into<String>) -> Self {
        Label::Known(name.into())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Label::Unknown)
    }

    /// Name of the identity, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Label::Known(name) => Some(name),
            Label::Unknown => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Known(name) => f.write_str(name),
            Label::Unknown => f.write_str("unknown"),
        }
    }
}

/// Unlabelled face as returned by the detector
#[derive(Debug, Clone)]
pub struct RawFace {
    pub bbox: BoundingBox,
    pub embedding: Embedding,
}

/// A face with its resolved identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: Label,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: Label) -> Self {
        Self { bbox, label }
    }
}

/// Face detector and embedding extractor.
///
/// Implementations wrap an external recognition model; the controller only
/// sees boxes and embeddings.
pub trait FaceRecognizer {
    /// Find faces in the frame, in detector order
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<RawFace>, FaceIdError>;

    /// Extract an embedding from an image file. `Ok(None)` when no usable face is found.
    fn embed_image(&mut self, path: &Path) -> Result<Option<Embedding>, FaceIdError>;
}

impl<R: FaceRecognizer + ?Sized> FaceRecognizer for Box<R> {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<RawFace>, FaceIdError> {
        (**self).detect(frame)
    }

    fn embed_image(&mut self, path: &Path) -> Result<Option<Embedding>, FaceIdError> {
        (**self).embed_image(path)
    }
}
