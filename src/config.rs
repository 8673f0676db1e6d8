//! Configuration file handling for magnifier.
//!
//! Loads configuration from `~/.config/magnifier/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{Backend, CameraSettings, Resolution};
use crate::control::GpioPins;
use crate::event_loop::LoopSettings;
use crate::zoom::ZoomState;

/// Configuration file structure for magnifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub zoom: ZoomConfig,
    pub capture: CaptureConfig,
    pub gpio: GpioConfig,
    pub logging: LoggingConfig,
    pub power: PowerConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub backend: Backend,
    pub device: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            device: 0,
            width: Resolution::HD.width,
            height: Resolution::HD.height,
            fps: 30,
            mirror: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Output width used in deployment mode
    pub width: u32,
    /// Widths offered by the setup window in development mode
    pub presets: Vec<u32>,
    pub title: String,
    pub frame_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            presets: vec![480, 640, 800, 1024],
            title: "Magnifier".to_string(),
            frame_interval_ms: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub initial: f64,
    pub step: f64,
    /// Upper bound (0 = unbounded)
    pub max: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            step: 0.1,
            max: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub retry_delay_ms: u64,
    pub max_consecutive_failures: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 100,
            max_consecutive_failures: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub zoom_in: u8,
    pub zoom_out: u8,
    pub quit: u8,
    pub wake: u8,
    /// Pin watched by `service watch`
    pub toggle: u8,
    pub debounce_ms: u64,
}

impl Default for GpioConfig {
    fn default() -> Self {
        let pins = GpioPins::default();
        Self {
            zoom_in: pins.zoom_in,
            zoom_out: pins.zoom_out,
            quit: pins.quit,
            wake: pins.wake,
            toggle: pins.wake,
            debounce_ms: pins.debounce.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rotated log files (development mode)
    pub dir: Option<PathBuf>,
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_files: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Set the screen blank timeout at start and restore it on exit
    pub manage: bool,
    pub screen_timeout_secs: u32,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            manage: false,
            screen_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub unit: String,
    /// Use the per-user systemd instance
    pub user: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            unit: "magnifier.service".to_string(),
            user: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed or fails
    /// [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config =
            Self::parse(&content).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes that would leave nothing to capture or display.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.width == 0 {
            return Err(ConfigError::Invalid(
                "[display] width must be at least 1".to_string(),
            ));
        }
        if self.display.presets.contains(&0) {
            return Err(ConfigError::Invalid(
                "[display] presets must all be at least 1".to_string(),
            ));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "[camera] size {}x{} must be at least 1x1",
                self.camera.width, self.camera.height
            )));
        }
        Ok(())
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|e| format!("# failed to render: {}\n", e))
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            backend: self.camera.backend,
            device_index: self.camera.device,
            resolution: Resolution {
                width: self.camera.width,
                height: self.camera.height,
            },
            fps: self.camera.fps,
            mirror: self.camera.mirror,
        }
    }

    pub fn loop_settings(&self, display_width: u32) -> LoopSettings {
        LoopSettings {
            display_width,
            frame_interval: Duration::from_millis(self.display.frame_interval_ms),
            retry_delay: Duration::from_millis(self.capture.retry_delay_ms),
            max_consecutive_failures: self.capture.max_consecutive_failures,
        }
    }

    pub fn zoom_state(&self) -> ZoomState {
        let max = (self.zoom.max > 0.0).then_some(self.zoom.max);
        ZoomState::new(self.zoom.initial, self.zoom.step, max)
    }

    pub fn gpio_pins(&self) -> GpioPins {
        GpioPins {
            zoom_in: self.gpio.zoom_in,
            zoom_out: self.gpio.zoom_out,
            quit: self.gpio.quit,
            wake: self.gpio.wake,
            debounce: Duration::from_millis(self.gpio.debounce_ms),
        }
    }

    /// Log directory, falling back to the platform data directory.
    pub fn log_dir(&self) -> PathBuf {
        self.logging.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("magnifier")
                .join("logs")
        })
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("magnifier").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/magnifier/config.toml")
        })
}

/// Commented default config written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# magnifier configuration

[camera]
# auto = Pi camera first, then USB device; or "picamera" / "usb"
backend = "auto"
# USB device index (see `magnifier list-cameras`)
device = 0
width = 1280
height = 720
fps = 30
mirror = false

[display]
# Output width in deployment mode
width = 640
# Buttons offered by the setup window in development mode
presets = [480, 640, 800, 1024]
title = "Magnifier"
frame_interval_ms = 10

[zoom]
initial = 1.0
step = 0.1
# Largest zoom factor (0 = unbounded)
max = 8.0

[capture]
# Pause before retrying a failed frame read
retry_delay_ms = 100
# Give up after this many failures in a row (0 = never)
max_consecutive_failures = 50

[gpio]
# BCM pin numbers, buttons wired to ground
zoom_in = 17
zoom_out = 27
quit = 22
wake = 23
toggle = 23
debounce_ms = 50

[logging]
# dir = "/var/log/magnifier"
max_files = 5

[power]
manage = false
screen_timeout_secs = 300

[service]
unit = "magnifier.service"
user = false
"#;

/// Write [`DEFAULT_CONFIG`] to `path`, creating parent directories.
pub fn init_file(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, DEFAULT_CONFIG).map_err(write_err)
}
