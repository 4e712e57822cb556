//! Video frame types and processing

use crate::CameraError;
use std::path::Path;
use tracing::debug;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create a frame filled with a single colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u32) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::new(data, width, height, 0, sequence)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Crop a region of the frame
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<VideoFrame> {
        if w == 0 || h == 0 || x + w > self.width || y + h > self.height {
            return None;
        }

        let mut cropped = Vec::with_capacity((w * h * 3) as usize);
        for row in y..(y + h) {
            let start = ((row * self.width + x) * 3) as usize;
            let end = start + (w * 3) as usize;
            cropped.extend_from_slice(self.data.get(start..end)?);
        }

        Some(VideoFrame {
            data: cropped,
            width: w,
            height: h,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        })
    }

    /// Crop the region spanned by pixel edges, clipped to the frame.
    ///
    /// Returns `None` when nothing of the region lies inside the frame.
    pub fn crop_edges(&self, left: i32, top: i32, right: i32, bottom: i32) -> Option<VideoFrame> {
        let x0 = left.clamp(0, self.width as i32) as u32;
        let y0 = top.clamp(0, self.height as i32) as u32;
        let x1 = right.clamp(0, self.width as i32) as u32;
        let y1 = bottom.clamp(0, self.height as i32) as u32;

        if x1 <= x0 || y1 <= y0 {
            debug!(
                "Crop region ({}, {})-({}, {}) lies outside {}x{} frame",
                left, top, right, bottom, self.width, self.height
            );
            return None;
        }
        self.crop(x0, y0, x1 - x0, y1 - y0)
    }

    /// Resize frame using nearest neighbour sampling
    pub fn resize(&self, new_width: u32, new_height: u32) -> VideoFrame {
        let mut resized = Vec::with_capacity((new_width * new_height * 3) as usize);

        let x_ratio = self.width as f32 / new_width as f32;
        let y_ratio = self.height as f32 / new_height as f32;

        for y in 0..new_height {
            for x in 0..new_width {
                let src_x = (x as f32 * x_ratio).floor() as u32;
                let src_y = (y as f32 * y_ratio).floor() as u32;

                let pixel = self
                    .get_pixel(
                        src_x.min(self.width.saturating_sub(1)),
                        src_y.min(self.height.saturating_sub(1)),
                    )
                    .unwrap_or([0, 0, 0]);
                resized.extend_from_slice(&pixel);
            }
        }

        VideoFrame {
            data: resized,
            width: new_width,
            height: new_height,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        }
    }

    /// Uniformly scale the frame by `factor` (0.5 halves both dimensions)
    pub fn scale(&self, factor: f32) -> VideoFrame {
        let new_width = ((self.width as f32 * factor).round() as u32).max(1);
        let new_height = ((self.height as f32 * factor).round() as u32).max(1);
        self.resize(new_width, new_height)
    }

    /// Convert into an `image` buffer
    pub fn to_rgb_image(&self) -> Result<image::RgbImage, CameraError> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CameraError::Format(format!(
                "{} bytes do not form a {}x{} RGB image",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Build a frame from an `image` buffer
    pub fn from_rgb_image(img: image::RgbImage, sequence: u32) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 0, sequence)
    }

    /// Encode the frame as a PNG file
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        self.to_rgb_image()?
            .save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        debug!("Wrote {}x{} frame to {}", self.width, self.height, path.as_ref().display());
        Ok(())
    }
}
