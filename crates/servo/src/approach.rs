//! Proportional approach controller
//!
//! Turns the selected face box into yaw, vertical and forward commands.
//! Every axis is recomputed from the box alone each cycle; the controller
//! keeps no integral or derivative state.

use crate::command::{to_axis, VelocityCommand};
use crate::config::{ApproachConfig, FrameConfig, ServoConfig};
use face_id::BoundingBox;
use tracing::debug;

/// Map an error in `[-span, span]` linearly onto `[-1, 1]`, clamping first.
pub fn normalize(error: f64, span: f64) -> f64 {
    error.clamp(-span, span) / span
}

/// Result of one approach computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachOutput {
    pub yaw: i32,
    pub up_down: i32,
    pub forward_back: i32,
    /// Box centre within the aim tolerances on both axes
    pub aimed: bool,
    /// Box size within the standoff band on both dimensions
    pub at_depth: bool,
    /// Signed horizontal offset of the box centre from the frame centre
    pub horizontal_error: f64,
}

impl ApproachOutput {
    pub fn reached(&self) -> bool {
        self.aimed && self.at_depth
    }
}

/// Pure proportional controller over box position and size
#[derive(Debug, Clone)]
pub struct ApproachController {
    frame: FrameConfig,
    config: ApproachConfig,
    limit: i32,
}

impl ApproachController {
    pub fn new(config: &ServoConfig) -> Self {
        Self {
            frame: config.frame,
            config: config.approach.clone(),
            limit: config.command_limit,
        }
    }

    fn frame_center(&self) -> (f64, f64) {
        (
            f64::from(self.frame.width) / 2.0,
            f64::from(self.frame.height) / 2.0,
        )
    }

    fn center_error(&self, bbox: &BoundingBox) -> (f64, f64) {
        let (cx, cy) = bbox.center();
        let (fx, fy) = self.frame_center();
        (cx - fx, cy - fy)
    }

    /// Lateral and vertical alignment test
    pub fn is_aimed(&self, bbox: &BoundingBox) -> bool {
        let (ex, ey) = self.center_error(bbox);
        ex.abs() <= f64::from(self.config.tolerance_x) && ey.abs() <= f64::from(self.config.tolerance_y)
    }

    /// Standoff distance test on both box dimensions
    pub fn is_at_depth(&self, bbox: &BoundingBox) -> bool {
        let reference = 2 * self.config.depth_box_size;
        (bbox.width() - reference).abs() <= self.config.depth_tolerance
            && (bbox.height() - reference).abs() <= self.config.depth_tolerance
    }

    /// Box is already close but not aimed: hold distance instead of closing in
    fn is_oversized(&self, bbox: &BoundingBox) -> bool {
        f64::from(bbox.width()) > self.config.oversize_factor * f64::from(self.config.depth_box_size)
    }

    pub fn compute(&self, bbox: &BoundingBox) -> ApproachOutput {
        let (ex, ey) = self.center_error(bbox);
        let aimed = self.is_aimed(bbox);
        let at_depth = self.is_at_depth(bbox);

        let (yaw, up_down) = if aimed {
            (0, 0)
        } else {
            let gain = self.config.gain_yaw;
            (
                to_axis(gain * normalize(ex, f64::from(self.frame.width)), self.limit),
                -to_axis(gain * normalize(ey, f64::from(self.frame.height)), self.limit),
            )
        };

        let forward_back = if at_depth || (!aimed && self.is_oversized(bbox)) {
            0
        } else {
            let span = f64::from(self.config.depth_box_size);
            let depth_error = f64::from(bbox.width() - 2 * self.config.depth_box_size);
            -to_axis(self.config.gain_forward * normalize(depth_error, span), self.limit)
        };

        debug!(
            "approach: err=({:.1}, {:.1}) w={} aimed={} at_depth={} -> yaw={} ud={} fb={}",
            ex,
            ey,
            bbox.width(),
            aimed,
            at_depth,
            yaw,
            up_down,
            forward_back
        );

        ApproachOutput {
            yaw,
            up_down,
            forward_back,
            aimed,
            at_depth,
            horizontal_error: ex,
        }
    }

    /// Overwrite the three controller-driven axes of `command`; lateral is left alone.
    pub fn apply(&self, bbox: &BoundingBox, command: &mut VelocityCommand) -> ApproachOutput {
        let output = self.compute(bbox);
        command.yaw = output.yaw;
        command.up_down = output.up_down;
        command.forward_back = output.forward_back;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn controller() -> ApproachController {
        ApproachController::new(&ServoConfig::default())
    }

    fn centred(size: i32) -> BoundingBox {
        BoundingBox::from_center(480, 360, size, size).unwrap()
    }

    #[test]
    fn test_centred_reference_box_is_reached() {
        let out = controller().compute(&centred(300));
        assert!(out.reached());
        assert_eq!((out.yaw, out.up_down, out.forward_back), (0, 0, 0));
    }

    #[test]
    fn test_yaw_turns_toward_face() {
        let ctl = controller();
        let right = ctl.compute(&BoundingBox::from_center(531, 360, 300, 300).unwrap());
        assert!(!right.aimed);
        assert_eq!(right.yaw, 5);

        let left = ctl.compute(&BoundingBox::from_center(429, 360, 300, 300).unwrap());
        assert_eq!(left.yaw, -5);
    }

    #[test]
    fn test_vertical_sign_is_inverted() {
        // Face above centre (smaller row) must command up
        let out = controller().compute(&BoundingBox::from_center(480, 200, 300, 300).unwrap());
        assert!(out.up_down > 0);
        assert_eq!(out.up_down, 22);
    }

    #[test]
    fn test_aim_tolerance_is_inclusive() {
        let ctl = controller();
        assert!(ctl.is_aimed(&BoundingBox::from_center(530, 410, 300, 300).unwrap()));
        assert!(!ctl.is_aimed(&BoundingBox::from_center(531, 360, 300, 300).unwrap()));
    }

    #[test]
    fn test_small_box_moves_forward() {
        let out = controller().compute(&centred(100));
        // depth error -200 clamps to -150 => normalize -1 => forward +15
        assert_eq!(out.forward_back, 15);
        assert_eq!((out.yaw, out.up_down), (0, 0));
    }

    #[test]
    fn test_large_aimed_box_backs_off() {
        let out = controller().compute(&centred(400));
        assert_eq!(out.forward_back, -10);
    }

    #[test]
    fn test_oversized_unaimed_box_holds_distance() {
        let out = controller().compute(&BoundingBox::from_center(800, 360, 240, 240).unwrap());
        assert!(!out.aimed);
        assert!(!out.at_depth);
        assert_eq!(out.forward_back, 0);
        assert!(out.yaw > 0);
    }

    #[test]
    fn test_small_unaimed_box_still_approaches() {
        let out = controller().compute(&BoundingBox::from_center(800, 360, 100, 100).unwrap());
        assert_eq!(out.forward_back, 15);
    }

    #[test]
    fn test_apply_leaves_lateral_axis() {
        let mut cmd = VelocityCommand {
            left_right: 7,
            ..Default::default()
        };
        controller().apply(&centred(100), &mut cmd);
        assert_eq!(cmd.left_right, 7);
        assert_eq!(cmd.forward_back, 15);
    }

    #[test]
    fn test_normalize_endpoints() {
        assert_eq!(normalize(150.0, 150.0), 1.0);
        assert_eq!(normalize(-150.0, 150.0), -1.0);
        assert_eq!(normalize(0.0, 150.0), 0.0);
        assert_eq!(normalize(10_000.0, 150.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_odd_and_bounded(e in -1e6f64..1e6, span in 1.0f64..5000.0) {
            let n = normalize(e, span);
            prop_assert_eq!(normalize(-e, span), -n);
            prop_assert!((-1.0..=1.0).contains(&n));
        }

        #[test]
        fn prop_reached_within_tolerance(
            dx in -50i32..=50,
            dy in -50i32..=50,
            dw in -25i32..=25,
            dh in -25i32..=25,
        ) {
            // from_center halves the size with integer division, so keep sizes even
            let bbox = BoundingBox::from_center(480 + dx, 360 + dy, 300 + 2 * dw, 300 + 2 * dh).unwrap();
            let out = controller().compute(&bbox);
            prop_assert!(out.reached());
            prop_assert_eq!((out.yaw, out.up_down, out.forward_back), (0, 0, 0));
        }

        #[test]
        fn prop_outputs_within_limit(
            cx in -2000i32..3000,
            cy in -2000i32..3000,
            w in 1i32..2000,
            h in 1i32..2000,
        ) {
            let out = controller().compute(&BoundingBox::from_center(cx, cy, w, h).unwrap());
            for axis in [out.yaw, out.up_down, out.forward_back] {
                prop_assert!((-100..=100).contains(&axis));
            }
        }
    }
}
