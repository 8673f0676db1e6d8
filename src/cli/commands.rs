//! Subcommand handlers for list-cameras, config and service actions.

use std::path::Path;

use super::args::{ConfigAction, ServiceAction};
use crate::app::watch_service;
use crate::camera;
use crate::config::{default_path, init_file, Config};
use crate::error::AppError;
use crate::service::ServiceController;

/// List available USB cameras and print them to stdout.
pub fn list_cameras() -> Result<(), AppError> {
    let devices = camera::list_devices()?;
    if devices.is_empty() {
        println!("No USB cameras found.");
        println!();
        println!("Make sure the camera is connected and /dev/video* is readable.");
        println!("The Pi camera module is not listed; it is probed on start.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    path: Option<&Path>,
) -> Result<(), AppError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            if config_path.exists() {
                println!("# Config file: {} (exists)", config_path.display());
            } else {
                println!("# Config file: {} (not found, defaults)", config_path.display());
            }
            println!();
            print!("{}", config.to_toml());
        }
        ConfigAction::Init => {
            init_file(&config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}

/// Handle service subcommand actions.
pub fn handle_service_action(action: ServiceAction, config: &Config) -> Result<(), AppError> {
    let service = ServiceController::new(config.service.unit.clone(), config.service.user);
    match action {
        ServiceAction::Start => {
            service.start()?;
            println!("Started {}", service.unit());
        }
        ServiceAction::Stop => {
            service.stop()?;
            println!("Stopped {}", service.unit());
        }
        ServiceAction::Toggle => {
            let outcome = service.toggle()?;
            println!("{}: {:?}", service.unit(), outcome);
        }
        ServiceAction::Watch => watch_service(config)?,
    }
    Ok(())
}
