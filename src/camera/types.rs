//! Camera types and data structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Information about an available USB camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 640x480
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// 1280x720, the default capture size
    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD
    }
}

/// Which capture backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Pi camera first, USB device as fallback
    #[default]
    Auto,
    /// Raspberry Pi camera module only
    #[value(name = "picamera")]
    PiCamera,
    /// Generic USB video device only
    Usb,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Auto => write!(f, "auto"),
            Backend::PiCamera => write!(f, "picamera"),
            Backend::Usb => write!(f, "usb"),
        }
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Wrap a packed RGB buffer. Returns `None` if the buffer length does not
    /// match `width * height * 3`.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if data.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        })
    }

    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }
}

/// Settings for camera capture.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Backend preference
    pub backend: Backend,
    /// USB device index
    pub device_index: u32,
    /// Requested capture resolution
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
    /// Mirror horizontally
    pub mirror: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            device_index: 0,
            resolution: Resolution::default(),
            fps: 30,
            mirror: false,
        }
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug)]
pub enum CameraError {
    /// Failed to query camera devices
    QueryFailed(String),
    /// Failed to open camera
    OpenFailed(String),
    /// Failed to start video stream
    StreamFailed(String),
    /// A single frame could not be read
    ReadFailed(String),
    /// Neither the Pi camera nor the USB device could be opened
    NoSource { picamera: String, usb: String },
    /// The source was already released
    Released,
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::QueryFailed(msg) => write!(f, "Failed to query cameras: {}", msg),
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::StreamFailed(msg) => write!(f, "Failed to start camera stream: {}", msg),
            CameraError::ReadFailed(msg) => write!(f, "Failed to read frame: {}", msg),
            CameraError::NoSource { picamera, usb } => {
                write!(
                    f,
                    "No camera available.\n  Pi camera: {}\n  USB device: {}\n\nRun 'magnifier list-cameras' to see USB devices",
                    picamera, usb
                )
            }
            CameraError::Released => write!(f, "Camera was already released"),
        }
    }
}

impl std::error::Error for CameraError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_info_display() {
        let info = CameraInfo {
            index: 0,
            name: "Test Camera".to_string(),
            description: "USB".to_string(),
        };
        assert_eq!(format!("{}", info), "[0] Test Camera (USB)");
    }

    #[test]
    fn test_resolution_default() {
        assert_eq!(Resolution::default(), Resolution::HD);
        assert_eq!(Resolution::HD.width, 1280);
        assert_eq!(Resolution::HD.height, 720);
    }

    #[test]
    fn test_camera_settings_default() {
        let settings = CameraSettings::default();
        assert_eq!(settings.backend, Backend::Auto);
        assert_eq!(settings.device_index, 0);
        assert_eq!(settings.resolution, Resolution::HD);
        assert_eq!(settings.fps, 30);
        assert!(!settings.mirror);
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Auto.to_string(), "auto");
        assert_eq!(Backend::PiCamera.to_string(), "picamera");
        assert_eq!(Backend::Usb.to_string(), "usb");
    }

    #[test]
    fn test_camera_error_display() {
        assert_eq!(
            format!("{}", CameraError::OpenFailed("test".to_string())),
            "Failed to open camera: test"
        );
        assert_eq!(
            format!("{}", CameraError::ReadFailed("timeout".to_string())),
            "Failed to read frame: timeout"
        );
        let msg = format!(
            "{}",
            CameraError::NoSource {
                picamera: "rpicam-vid not found".to_string(),
                usb: "no device 0".to_string(),
            }
        );
        assert!(msg.contains("rpicam-vid not found"));
        assert!(msg.contains("no device 0"));
    }

    #[test]
    fn test_frame_from_rgb_checks_length() {
        assert!(Frame::from_rgb(vec![0; 6], 2, 1).is_some());
        assert!(Frame::from_rgb(vec![0; 5], 2, 1).is_none());
        let frame = Frame::from_rgb(vec![0; 12], 2, 2).unwrap();
        assert_eq!(frame.bytes_per_pixel(), 3);
    }
}
