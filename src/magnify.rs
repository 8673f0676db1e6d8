//! Digital zoom: center crop followed by an aspect-preserving resize.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::camera::Frame;

/// A rectangle inside a frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Bottom-right corner (exclusive).
    pub fn end(&self) -> (u32, u32) {
        (self.x + self.width, self.y + self.height)
    }
}

/// Centered crop of `⌊width/zoom⌋ × ⌊height/zoom⌋`.
///
/// A zoom of 1.0 or less keeps the whole frame. Returns `None` when the crop
/// would have a zero dimension.
pub fn crop_region(width: u32, height: u32, zoom: f64) -> Option<CropRegion> {
    if width == 0 || height == 0 || zoom.is_nan() {
        return None;
    }
    if zoom <= 1.0 {
        return Some(CropRegion {
            x: 0,
            y: 0,
            width,
            height,
        });
    }

    let crop_w = (width as f64 / zoom).floor() as u32;
    let crop_h = (height as f64 / zoom).floor() as u32;
    if crop_w == 0 || crop_h == 0 {
        return None;
    }

    Some(CropRegion {
        x: (width - crop_w) / 2,
        y: (height - crop_h) / 2,
        width: crop_w,
        height: crop_h,
    })
}

/// Height that keeps the aspect ratio at `display_width`: `⌊h * dw / w⌋`.
///
/// Returns `None` for a zero frame width or a zero result.
pub fn output_height(frame_width: u32, frame_height: u32, display_width: u32) -> Option<u32> {
    if frame_width == 0 {
        return None;
    }
    let height = frame_height as u64 * display_width as u64 / frame_width as u64;
    match u32::try_from(height) {
        Ok(0) | Err(_) => None,
        Ok(h) => Some(h),
    }
}

/// Crop `frame` around its center by `zoom` and resize it to `display_width`
/// with linear interpolation.
///
/// Returns `None` when the geometry degenerates; the caller skips the frame.
pub fn magnify(frame: Frame, zoom: f64, display_width: u32) -> Option<Frame> {
    if display_width == 0 {
        return None;
    }
    let region = crop_region(frame.width, frame.height, zoom)?;
    let height = output_height(region.width, region.height, display_width)?;

    let timestamp = frame.timestamp;
    let image = RgbImage::from_raw(frame.width, frame.height, frame.data)?;

    let cropped = if region.width == image.width() && region.height == image.height() {
        image
    } else {
        imageops::crop_imm(&image, region.x, region.y, region.width, region.height).to_image()
    };

    let resized = if cropped.width() == display_width && cropped.height() == height {
        cropped
    } else {
        imageops::resize(&cropped, display_width, height, FilterType::Triangle)
    };

    let mut out = Frame::from_rgb(resized.into_raw(), display_width, height)?;
    out.timestamp = timestamp;
    Some(out)
}
