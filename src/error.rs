//! Top-level error type.

use crate::camera::CameraError;
use crate::config::ConfigError;
use crate::control::ControlError;
use crate::event_loop::LoopError;
use crate::logging::LoggingError;
use crate::service::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
