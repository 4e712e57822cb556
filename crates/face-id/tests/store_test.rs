use camera_capture::VideoFrame;
use face_id::{
    BoundingBox, EnrollOutcome, Embedding, FaceIdError, FaceRecognizer, FaceStore, Label,
    RawFace, StoreConfig,
};
use ndarray::array;
use std::fs;
use std::path::{Path, PathBuf};

/// Embeds an image as its normalised top-left colour; black images have no face.
struct ColourRecognizer;

impl FaceRecognizer for ColourRecognizer {
    fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<RawFace>, FaceIdError> {
        Ok(Vec::new())
    }

    fn embed_image(&mut self, path: &Path) -> Result<Option<Embedding>, FaceIdError> {
        let img = image::open(path)?.to_rgb8();
        let [r, g, b] = img.get_pixel(0, 0).0;
        if r == 0 && g == 0 && b == 0 {
            return Ok(None);
        }
        Ok(Some(array![
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0
        ]))
    }
}

struct TestDirs {
    root: PathBuf,
}

impl TestDirs {
    fn new() -> Self {
        let root = std::env::temp_dir().join(format!("face-store-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("known")).unwrap();
        fs::create_dir_all(root.join("staging")).unwrap();
        Self { root }
    }

    fn config(&self) -> StoreConfig {
        StoreConfig {
            known_dir: self.root.join("known"),
            staging_dir: self.root.join("staging"),
            match_tolerance: 0.1,
        }
    }

    fn count(&self, dir: &str) -> usize {
        fs::read_dir(self.root.join(dir)).unwrap().count()
    }
}

impl Drop for TestDirs {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn write_face(dir: &Path, name: &str, rgb: [u8; 3]) {
    VideoFrame::filled(16, 16, rgb, 0)
        .save_png(dir.join(format!("{name}.png")))
        .unwrap();
}

fn face_box() -> BoundingBox {
    BoundingBox::new(100, 300, 300, 100).unwrap()
}

#[test]
fn test_open_loads_known_and_purges_staging() {
    let dirs = TestDirs::new();
    let config = dirs.config();
    write_face(&config.known_dir, "alice", [255, 0, 0]);
    write_face(&config.known_dir, "bob", [0, 255, 0]);
    fs::write(config.staging_dir.join("leftover.png"), b"stale").unwrap();

    let store = FaceStore::open(config, &mut ColourRecognizer).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.known().names(), &["alice".to_string(), "bob".to_string()]);
    assert_eq!(dirs.count("staging"), 0);
    assert_eq!(
        store.known().identify(&array![1.0, 0.0, 0.0]),
        Label::known("alice")
    );
}

#[test]
fn test_open_skips_images_without_face() {
    let dirs = TestDirs::new();
    let config = dirs.config();
    write_face(&config.known_dir, "alice", [255, 0, 0]);
    write_face(&config.known_dir, "nobody", [0, 0, 0]);

    let store = FaceStore::open(config, &mut ColourRecognizer).unwrap();
    assert_eq!(store.len(), 1);
    assert!(!store.known().contains("nobody"));
}

#[test]
fn test_enroll_promotes_usable_capture() {
    let dirs = TestDirs::new();
    let mut store = FaceStore::open(dirs.config(), &mut ColourRecognizer).unwrap();
    let frame = VideoFrame::filled(960, 720, [0, 0, 255], 1);

    let outcome = store.enroll(&frame, &face_box(), &mut ColourRecognizer).unwrap();

    let EnrollOutcome::Promoted(label) = outcome.clone() else {
        panic!("expected promotion, got {outcome:?}");
    };
    assert_eq!(store.len(), 1);
    assert!(dirs.root.join("known").join(format!("{label}.png")).exists());
    assert_eq!(
        store.known().identify(&array![0.0, 0.0, 1.0]),
        Label::Known(label.clone())
    );

    let promoted = image::open(dirs.root.join("known").join(format!("{label}.png")))
        .unwrap()
        .to_rgb8();
    assert_eq!(promoted.dimensions(), (200, 200));
    assert_eq!(dirs.count("staging"), 0);
}

#[test]
fn test_failed_promotion_cleans_staging() {
    let dirs = TestDirs::new();
    let mut store = FaceStore::open(dirs.config(), &mut ColourRecognizer).unwrap();
    fs::remove_dir_all(dirs.root.join("known")).unwrap();
    let frame = VideoFrame::filled(960, 720, [0, 0, 255], 1);

    let result = store.enroll(&frame, &face_box(), &mut ColourRecognizer);

    assert!(matches!(result, Err(FaceIdError::Io(_))));
    assert!(store.is_empty());
    assert_eq!(dirs.count("staging"), 0);
}

#[test]
fn test_failed_enrollment_leaves_store_unchanged() {
    let dirs = TestDirs::new();
    let config = dirs.config();
    write_face(&config.known_dir, "alice", [255, 0, 0]);
    let mut store = FaceStore::open(config, &mut ColourRecognizer).unwrap();
    let names_before = store.known().names().to_vec();
    let files_before = dirs.count("known");

    let frame = VideoFrame::filled(960, 720, [0, 0, 0], 1);
    let outcome = store.enroll(&frame, &face_box(), &mut ColourRecognizer).unwrap();

    assert_eq!(outcome, EnrollOutcome::Rejected);
    assert_eq!(store.known().names(), names_before.as_slice());
    assert_eq!(dirs.count("known"), files_before);
    assert_eq!(dirs.count("staging"), 0);
}

#[test]
fn test_enroll_outside_frame_is_an_error() {
    let dirs = TestDirs::new();
    let mut store = FaceStore::open(dirs.config(), &mut ColourRecognizer).unwrap();
    let frame = VideoFrame::filled(100, 100, [0, 0, 255], 1);

    let result = store.enroll(&frame, &face_box(), &mut ColourRecognizer);
    assert!(matches!(result, Err(FaceIdError::Store(_))));
    assert!(store.is_empty());
}

#[test]
fn test_promoted_face_survives_reopen() {
    let dirs = TestDirs::new();
    let mut store = FaceStore::open(dirs.config(), &mut ColourRecognizer).unwrap();
    let frame = VideoFrame::filled(960, 720, [0, 200, 200], 1);
    let EnrollOutcome::Promoted(label) = store.enroll(&frame, &face_box(), &mut ColourRecognizer).unwrap() else {
        panic!("expected promotion");
    };
    drop(store);

    let reopened = FaceStore::open(dirs.config(), &mut ColourRecognizer).unwrap();
    assert!(reopened.known().contains(&label));
    assert_eq!(dirs.count("staging"), 0);
}
