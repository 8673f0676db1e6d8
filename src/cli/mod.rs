//! Command-line interface definitions and helpers.

mod args;
mod commands;

pub use args::{Args, Command, ConfigAction, ServiceAction};
pub use commands::{handle_config_action, handle_service_action, list_cameras};
