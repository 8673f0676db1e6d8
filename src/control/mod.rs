//! Control surfaces: the inputs that drive zoom, quit and wake.
//!
//! Input handlers never touch loop state directly. Every press becomes a
//! [`ControlEvent`] sent over an mpsc channel, and the capture loop drains
//! that channel once per iteration.

mod gpio;
mod keyboard;
mod setup;

use std::fmt;
use std::sync::mpsc::Sender;

pub use gpio::{GpioPins, GpioSurface, PinBinding, ToggleButton};
pub use keyboard::action_for_key;
pub use setup::{SetupLayout, SetupSurface};

/// Environment variable that switches to deployment mode.
pub const PROD_ENV: &str = "PROD";

/// What an input asks the loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    ZoomIn,
    ZoomOut,
    Quit,
    /// Turn the display back on / reset its blank timer
    Wake,
}

/// Where an event came from, for the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Gpio(u8),
    /// Ctrl+C / SIGINT
    Signal,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Keyboard => write!(f, "keyboard"),
            InputSource::Gpio(pin) => write!(f, "GPIO{}", pin),
            InputSource::Signal => write!(f, "signal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub action: ControlAction,
    pub source: InputSource,
}

impl ControlEvent {
    pub fn new(action: ControlAction, source: InputSource) -> Self {
        Self { action, source }
    }
}

/// Sending half handed to control surfaces.
pub type EventSender = Sender<ControlEvent>;

/// Errors raised while binding inputs.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("GPIO support not compiled in (rebuild with --features gpio on a Raspberry Pi)")]
    GpioUnavailable,

    #[error("GPIO pin {pin}: {message}")]
    Gpio { pin: u8, message: String },

    #[error("Setup window failed: {0}")]
    Window(String),

    #[error("No display width presets configured")]
    NoPresets,

    #[error("Display width presets must be at least 1")]
    ZeroPreset,
}

/// Which control scheme to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// On-screen buttons and keyboard shortcuts
    #[default]
    Dev,
    /// Physical GPIO buttons
    Prod,
}

impl Mode {
    /// Interpret the value of the `PROD` variable.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Mode::Prod,
            _ => Mode::Dev,
        }
    }

    /// Read `PROD` from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(PROD_ENV).ok().as_deref())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Dev => write!(f, "development"),
            Mode::Prod => write!(f, "deployment"),
        }
    }
}

/// An input scheme selected once at startup.
pub trait ControlSurface {
    /// Short name for the log.
    fn name(&self) -> &'static str;

    /// Decide the display width before the loop starts.
    ///
    /// `Ok(None)` means the user backed out and the program should exit.
    fn select_display_width(&mut self, configured: u32) -> Result<Option<u32>, ControlError>;

    /// Start delivering events on `events`. Inputs stay live until the
    /// surface is dropped.
    fn bind(&mut self, events: EventSender) -> Result<(), ControlError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(Mode::from_env_value(None), Mode::Dev);
        assert_eq!(Mode::from_env_value(Some("")), Mode::Dev);
        assert_eq!(Mode::from_env_value(Some("0")), Mode::Dev);
        assert_eq!(Mode::from_env_value(Some("false")), Mode::Dev);
        assert_eq!(Mode::from_env_value(Some("1")), Mode::Prod);
        assert_eq!(Mode::from_env_value(Some("TRUE")), Mode::Prod);
        assert_eq!(Mode::from_env_value(Some(" yes ")), Mode::Prod);
        assert_eq!(Mode::from_env_value(Some("on")), Mode::Prod);
    }

    #[test]
    fn test_input_source_display() {
        assert_eq!(InputSource::Keyboard.to_string(), "keyboard");
        assert_eq!(InputSource::Gpio(17).to_string(), "GPIO17");
        assert_eq!(InputSource::Signal.to_string(), "signal");
    }

    #[test]
    fn test_events_cross_threads() {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = std::thread::spawn(move || {
            tx.send(ControlEvent::new(ControlAction::ZoomIn, InputSource::Gpio(17)))
                .unwrap();
        });
        handle.join().unwrap();
        let event = rx.recv().unwrap();
        assert_eq!(event.action, ControlAction::ZoomIn);
        assert_eq!(event.source, InputSource::Gpio(17));
    }
}
