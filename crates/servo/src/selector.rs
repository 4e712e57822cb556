//! Target selection
//!
//! Picks at most one detection to act on. Detections are scanned in detector
//! order and the first match wins; nothing is re-sorted by size or score.

use crate::state::Mode;
use face_id::{Detection, Label};

/// Selection result: the chosen detection plus everything seen this cycle
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub target: Option<&'a Detection>,
    pub detections: &'a [Detection],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TargetSelector;

impl TargetSelector {
    pub fn new() -> Self {
        Self
    }

    fn matches(mode: Mode, target_name: Option<&str>, label: &Label) -> bool {
        match (mode, target_name) {
            (Mode::Enroll, _) => label.is_unknown(),
            (Mode::Autonomous, Some(name)) => label.name() == Some(name),
            (Mode::Autonomous, None) => !label.is_unknown(),
            (Mode::ManualOverride, _) => false,
        }
    }

    /// `target_name` must already have empty names mapped to `None`
    pub fn select<'a>(
        &self,
        detections: &'a [Detection],
        mode: Mode,
        target_name: Option<&str>,
    ) -> Selection<'a> {
        let target = detections
            .iter()
            .find(|d| Self::matches(mode, target_name, &d.label));
        Selection { target, detections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_id::BoundingBox;

    fn det(cx: i32, label: Label) -> Detection {
        Detection::new(BoundingBox::from_center(cx, 360, 100, 100).unwrap(), label)
    }

    fn scene() -> Vec<Detection> {
        vec![
            det(100, Label::Unknown),
            det(300, Label::known("bob")),
            det(500, Label::known("alice")),
            det(700, Label::Unknown),
        ]
    }

    #[test]
    fn test_enroll_picks_first_unknown() {
        let dets = scene();
        let sel = TargetSelector::new().select(&dets, Mode::Enroll, Some("alice"));
        assert_eq!(sel.target, Some(&dets[0]));
        assert_eq!(sel.detections.len(), 4);
    }

    #[test]
    fn test_named_target() {
        let dets = scene();
        let sel = TargetSelector::new().select(&dets, Mode::Autonomous, Some("alice"));
        assert_eq!(sel.target, Some(&dets[2]));
    }

    #[test]
    fn test_any_known_face_in_detector_order() {
        let dets = scene();
        let sel = TargetSelector::new().select(&dets, Mode::Autonomous, None);
        assert_eq!(sel.target, Some(&dets[1]));
    }

    #[test]
    fn test_no_match() {
        let dets = vec![det(100, Label::Unknown)];
        let selector = TargetSelector::new();
        assert!(selector.select(&dets, Mode::Autonomous, None).target.is_none());
        assert!(selector.select(&dets, Mode::Autonomous, Some("carol")).target.is_none());
        assert!(selector.select(&[], Mode::Enroll, None).target.is_none());
    }

    #[test]
    fn test_manual_override_ignores_detections() {
        let dets = scene();
        assert!(TargetSelector::new()
            .select(&dets, Mode::ManualOverride, None)
            .target
            .is_none());
    }
}
