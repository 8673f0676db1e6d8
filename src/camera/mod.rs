//! Camera capture: backend selection and per-frame acquisition.
//!
//! - Pi camera module via [`PiCamera`] (raw YUV420 from `rpicam-vid`)
//! - Generic USB video device via [`UsbCamera`] (nokhwa)
//! - Startup selection with fallback via [`CameraSource::open`]

mod frame_utils;
mod picam;
mod source;
mod types;
mod usb;

pub use frame_utils::{i420_frame_len, i420_to_rgb, mirror_horizontal};
pub use picam::{capture_args, PiCamera};
pub use source::{open_with_fallback, CameraSource, FrameSource};
pub use types::{Backend, CameraError, CameraInfo, CameraSettings, Frame, FrameFormat, Resolution};
pub use usb::{list_devices, UsbCamera};
