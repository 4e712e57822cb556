//! Face bounding box in pixel coordinates

use crate::FaceIdError;
use serde::{Deserialize, Serialize};

/// Axis-aligned face box. Always satisfies `right > left` and `bottom > top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    top: i32,
    right: i32,
    bottom: i32,
    left: i32,
}

impl BoundingBox {
    /// Create a box from its edges (detector order: top, right, bottom, left)
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Result<Self, FaceIdError> {
        if right <= left || bottom <= top {
            return Err(FaceIdError::InvalidBox {
                top,
                right,
                bottom,
                left,
            });
        }
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Create a box of the given size centred on (cx, cy)
    pub fn from_center(cx: i32, cy: i32, width: i32, height: i32) -> Result<Self, FaceIdError> {
        let left = cx - width / 2;
        let top = cy - height / 2;
        Self::new(top, left + width, top + height, left)
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Box centre in pixels
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.left + self.right) / 2.0,
            f64::from(self.top + self.bottom) / 2.0,
        )
    }

    /// Scale every edge by `factor`, truncating toward zero.
    ///
    /// Used to map boxes found on a downscaled detection frame back to
    /// full-frame coordinates (factor = 1 / detection scale).
    pub fn rescale(&self, factor: f64) -> Result<Self, FaceIdError> {
        let scale = |v: i32| (f64::from(v) * factor) as i32;
        Self::new(
            scale(self.top),
            scale(self.right),
            scale(self.bottom),
            scale(self.left),
        )
    }
}
