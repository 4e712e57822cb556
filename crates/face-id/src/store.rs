//! Enrolled-target store
//!
//! One image file per identity in the known directory; the file stem is the
//! identity label. New captures are written to a staging directory first and
//! only copied into the known directory once an embedding could be extracted
//! from them.

use crate::matcher::DEFAULT_MATCH_TOLERANCE;
use crate::{BoundingBox, FaceIdError, FaceRecognizer, KnownFaces};
use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory of promoted identity images
    pub known_dir: PathBuf,
    /// Directory for captures awaiting promotion (purged on open)
    pub staging_dir: PathBuf,
    /// Maximum embedding distance for a match
    pub match_tolerance: f32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            known_dir: PathBuf::from("known_faces"),
            staging_dir: PathBuf::from("new_faces"),
            match_tolerance: DEFAULT_MATCH_TOLERANCE,
        }
    }
}

/// Result of an enrollment attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Capture produced an embedding and was added under this label
    Promoted(String),
    /// Capture was discarded; the store is unchanged
    Rejected,
}

/// Capture written to the staging directory
#[derive(Debug, Clone)]
pub struct StagedCapture {
    pub id: Uuid,
    pub path: PathBuf,
}

/// Owned store of enrolled identities
pub struct FaceStore {
    config: StoreConfig,
    faces: KnownFaces,
}

impl FaceStore {
    /// Open the store: purge staged captures, then enroll every known image
    pub fn open<R: FaceRecognizer + ?Sized>(
        config: StoreConfig,
        recognizer: &mut R,
    ) -> Result<Self, FaceIdError> {
        fs::create_dir_all(&config.known_dir)?;
        fs::create_dir_all(&config.staging_dir)?;

        let mut store = Self {
            faces: KnownFaces::new(config.match_tolerance),
            config,
        };

        let purged = store.purge_staging()?;
        if purged > 0 {
            info!("Purged {} stale captures from {}", purged, store.config.staging_dir.display());
        }

        let loaded = store.load_known(recognizer)?;
        info!(
            "Loaded {} known faces from {}",
            loaded,
            store.config.known_dir.display()
        );

        Ok(store)
    }

    /// Enrolled identities used for matching
    pub fn known(&self) -> &KnownFaces {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Crop the box out of the frame and write it to the staging directory
    pub fn stage(&self, frame: &VideoFrame, bbox: &BoundingBox) -> Result<StagedCapture, FaceIdError> {
        let crop = frame
            .crop_edges(bbox.left(), bbox.top(), bbox.right(), bbox.bottom())
            .ok_or_else(|| FaceIdError::Store("capture region lies outside the frame".to_string()))?;

        let id = Uuid::new_v4();
        let path = self.config.staging_dir.join(format!("{id}.png"));
        crop.save_png(&path)?;
        debug!("Staged {}x{} capture at {}", crop.width, crop.height, path.display());

        Ok(StagedCapture { id, path })
    }

    /// Capture a face and enroll it.
    ///
    /// The capture is promoted into the known directory and the match set only
    /// if the recognizer extracts an embedding from the saved crop. The staged
    /// file is removed in every case.
    pub fn enroll<R: FaceRecognizer + ?Sized>(
        &mut self,
        frame: &VideoFrame,
        bbox: &BoundingBox,
        recognizer: &mut R,
    ) -> Result<EnrollOutcome, FaceIdError> {
        let staged = self.stage(frame, bbox)?;

        let embedding = match recognizer.embed_image(&staged.path) {
            Ok(Some(embedding)) => embedding,
            Ok(None) => {
                info!("No usable face in capture {}, discarding", staged.id);
                discard(&staged.path);
                return Ok(EnrollOutcome::Rejected);
            }
            Err(e) => {
                warn!("Embedding extraction failed for capture {}: {}", staged.id, e);
                discard(&staged.path);
                return Ok(EnrollOutcome::Rejected);
            }
        };

        let label = staged.id.to_string();
        let target = self.config.known_dir.join(format!("{label}.png"));
        let copied = fs::copy(&staged.path, &target);
        discard(&staged.path);
        copied?;
        self.faces.insert(label.clone(), embedding);

        info!("Enrolled new face {}", label);
        Ok(EnrollOutcome::Promoted(label))
    }

    fn purge_staging(&self) -> Result<usize, FaceIdError> {
        let mut purged = 0;
        for entry in fs::read_dir(&self.config.staging_dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
                purged += 1;
            }
        }
        Ok(purged)
    }

    fn load_known<R: FaceRecognizer + ?Sized>(&mut self, recognizer: &mut R) -> Result<usize, FaceIdError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.config.known_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let Some(label) = label_for(&path) else {
                continue;
            };

            match recognizer.embed_image(&path) {
                Ok(Some(embedding)) => {
                    debug!("Loaded known face {}", label);
                    self.faces.insert(label, embedding);
                }
                Ok(None) => warn!("No face found in {}, skipping", path.display()),
                Err(e) => warn!("Failed to load {}: {}", path.display(), e),
            }
        }

        Ok(self.faces.len())
    }
}

/// Identity label for an image file: its name minus the extension
fn label_for(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty() && !stem.starts_with('.'))
        .map(str::to_string)
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to remove staged capture {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_strips_extension() {
        assert_eq!(label_for(Path::new("known_faces/alice.png")), Some("alice".to_string()));
        assert_eq!(label_for(Path::new("known_faces/bob.jpg")), Some("bob".to_string()));
        assert_eq!(label_for(Path::new("known_faces/.hidden")), None);
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.known_dir, PathBuf::from("known_faces"));
        assert_eq!(config.staging_dir, PathBuf::from("new_faces"));
        assert!((config.match_tolerance - 0.6).abs() < f32::EPSILON);
    }
}
