//! Generic USB video device backend (nokhwa).

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::{query, Camera};

use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraError, CameraInfo, CameraSettings, Frame, Resolution};

/// List the USB video devices nokhwa can see, sorted by index.
///
/// The Pi camera module is not listed; it is probed when a source opens.
/// No devices is an empty list, not an error.
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let mut devices: Vec<CameraInfo> = query(ApiBackend::Auto)
        .map_err(|e| CameraError::QueryFailed(e.to_string()))?
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect();
    devices.sort_by_key(|d| d.index);
    Ok(devices)
}

/// An open USB camera with a running stream.
///
/// Reads are synchronous: `read` blocks until the device delivers the next
/// buffer and reports success or failure per frame.
pub struct UsbCamera {
    camera: Option<Camera>,
    mirror: bool,
    resolution: Resolution,
}

impl std::fmt::Debug for UsbCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbCamera")
            .field("resolution", &self.resolution)
            .field("open", &self.camera.is_some())
            .finish_non_exhaustive()
    }
}

impl UsbCamera {
    /// Open the device at `settings.device_index` and start streaming.
    pub fn open(settings: &CameraSettings) -> Result<Self, CameraError> {
        let index = CameraIndex::Index(settings.device_index);
        let mut camera = open_with_format_fallback(&index, settings)?;

        camera
            .open_stream()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        let res = camera.resolution();
        let resolution = Resolution {
            width: res.width(),
            height: res.height(),
        };
        log::info!(
            "USB camera {} streaming at {}x{} @ {} fps",
            settings.device_index,
            resolution.width,
            resolution.height,
            camera.frame_rate()
        );

        Ok(Self {
            camera: Some(camera),
            mirror: settings.mirror,
            resolution,
        })
    }

    /// Resolution negotiated with the device.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Read and decode the next frame.
    pub fn read(&mut self) -> Result<Frame, CameraError> {
        let camera = self.camera.as_mut().ok_or(CameraError::Released)?;
        let raw = camera
            .frame()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;
        let mut frame = convert_to_rgb(&raw)
            .ok_or_else(|| CameraError::ReadFailed("could not decode frame".to_string()))?;
        if self.mirror {
            mirror_horizontal(&mut frame);
        }
        Ok(frame)
    }

    /// Stop the stream and drop the device handle. Safe to call twice.
    pub fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop USB camera stream: {}", e);
            }
        }
    }
}

impl Drop for UsbCamera {
    fn drop(&mut self) {
        self.release();
    }
}

/// Try the requested size in MJPEG, then YUYV, then whatever the device offers.
fn open_with_format_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    let wanted =
        nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);
    let format_attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::YUYV,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
    ];

    let mut last_error = String::from("no formats tried");
    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                log::debug!("USB camera format attempt failed: {}", e);
                last_error = e.to_string();
            }
        }
    }

    Err(CameraError::OpenFailed(last_error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_does_not_error() {
        assert!(list_devices().is_ok());
    }

    #[test]
    fn test_open_missing_device_fails() {
        let settings = CameraSettings {
            device_index: 999,
            ..CameraSettings::default()
        };
        assert!(UsbCamera::open(&settings).is_err());
    }
}
