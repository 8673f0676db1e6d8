//! Camera source selection.

use super::picam::PiCamera;
use super::types::{Backend, CameraError, CameraSettings, Frame, Resolution};
use super::usb::UsbCamera;

/// Anything the capture loop can pull frames from.
pub trait FrameSource {
    /// Backend actually in use (never `Auto`).
    fn backend(&self) -> Backend;

    /// Block until the next frame is available.
    fn acquire(&mut self) -> Result<Frame, CameraError>;

    /// Release the underlying device. Further `acquire` calls fail with
    /// [`CameraError::Released`].
    fn release(&mut self);
}

/// The camera chosen at startup.
#[derive(Debug)]
pub enum CameraSource {
    PiCamera(PiCamera),
    Usb(UsbCamera),
}

impl CameraSource {
    /// Open the camera named by `settings.backend`.
    ///
    /// With [`Backend::Auto`] the Pi camera is tried first and any failure
    /// falls back to the USB device. If both fail the error carries both
    /// reasons.
    pub fn open(settings: &CameraSettings) -> Result<Self, CameraError> {
        match settings.backend {
            Backend::PiCamera => PiCamera::open(settings).map(CameraSource::PiCamera),
            Backend::Usb => UsbCamera::open(settings).map(CameraSource::Usb),
            Backend::Auto => open_with_fallback(
                || PiCamera::open(settings).map(CameraSource::PiCamera),
                || UsbCamera::open(settings).map(CameraSource::Usb),
            ),
        }
    }

    /// Resolution delivered by the active backend.
    pub fn resolution(&self) -> Resolution {
        match self {
            CameraSource::PiCamera(cam) => cam.resolution(),
            CameraSource::Usb(cam) => cam.resolution(),
        }
    }
}

impl FrameSource for CameraSource {
    fn backend(&self) -> Backend {
        match self {
            CameraSource::PiCamera(_) => Backend::PiCamera,
            CameraSource::Usb(_) => Backend::Usb,
        }
    }

    fn acquire(&mut self) -> Result<Frame, CameraError> {
        match self {
            CameraSource::PiCamera(cam) => cam.capture(),
            CameraSource::Usb(cam) => cam.read(),
        }
    }

    fn release(&mut self) {
        match self {
            CameraSource::PiCamera(cam) => cam.release(),
            CameraSource::Usb(cam) => cam.release(),
        }
    }
}

/// Try `primary`, then `secondary`. Both failing yields [`CameraError::NoSource`].
pub fn open_with_fallback<T>(
    primary: impl FnOnce() -> Result<T, CameraError>,
    secondary: impl FnOnce() -> Result<T, CameraError>,
) -> Result<T, CameraError> {
    let picamera = match primary() {
        Ok(source) => return Ok(source),
        Err(e) => {
            log::warn!("Pi camera unavailable ({}), falling back to USB device", e);
            e.to_string()
        }
    };

    secondary().map_err(|e| CameraError::NoSource {
        picamera,
        usb: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_prefers_primary() {
        let mut secondary_called = false;
        let result = open_with_fallback(
            || Ok("pi"),
            || {
                secondary_called = true;
                Ok("usb")
            },
        );
        assert_eq!(result.unwrap(), "pi");
        assert!(!secondary_called);
    }

    #[test]
    fn test_fallback_uses_secondary_on_failure() {
        let result = open_with_fallback(
            || Err(CameraError::OpenFailed("no module".to_string())),
            || Ok("usb"),
        );
        assert_eq!(result.unwrap(), "usb");
    }

    #[test]
    fn test_both_failing_reports_both() {
        let result: Result<(), _> = open_with_fallback(
            || Err(CameraError::OpenFailed("no module".to_string())),
            || Err(CameraError::OpenFailed("no device".to_string())),
        );
        match result {
            Err(CameraError::NoSource { picamera, usb }) => {
                assert!(picamera.contains("no module"));
                assert!(usb.contains("no device"));
            }
            other => panic!("Expected NoSource, got {:?}", other),
        }
    }
}
