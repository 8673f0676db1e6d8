//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::camera::Backend;
use crate::config::Config;
use crate::control::Mode;

/// Digital magnifier: camera feed with center zoom in a window
#[derive(Parser, Debug)]
#[command(name = "magnifier")]
#[command(version, about = "Camera magnifier with digital zoom", long_about = None)]
#[command(after_help = "CONTROLS:
    I / + / Up      zoom in
    O / - / Down    zoom out
    W               wake display
    Q / Esc         quit

Set PROD=1 (environment or .env) to use GPIO buttons instead of the setup window.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output width in pixels (deployment mode; dev mode picks it on screen)
    #[arg(long, short, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// USB camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Capture backend
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Control mode, overriding the PROD environment variable
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Zoom change per button press
    #[arg(long)]
    pub zoom_step: Option<f64>,

    /// Mirror camera horizontally
    #[arg(long)]
    pub mirror: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(width) = self.width {
            config.display.width = width;
        }
        if let Some(camera) = self.camera {
            config.camera.device = camera;
        }
        if let Some(backend) = self.backend {
            config.camera.backend = backend;
        }
        if let Some(step) = self.zoom_step {
            config.zoom.step = step;
        }
        if self.mirror {
            config.camera.mirror = true;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available USB cameras
    ListCameras,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Control the magnifier's systemd service
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    /// Stop if running, start otherwise
    Toggle,
    /// Toggle the service from a GPIO button until Ctrl+C
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["magnifier"]);
        assert!(args.width.is_none());
        assert!(args.camera.is_none());
        assert!(args.backend.is_none());
        assert!(args.mode.is_none());
        assert!(args.zoom_step.is_none());
        assert!(!args.mirror);
        assert!(args.config.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_args_width_must_be_positive() {
        assert!(Args::try_parse_from(["magnifier", "--width", "0"]).is_err());
        let args = Args::parse_from(["magnifier", "-w", "800"]);
        assert_eq!(args.width, Some(800));
    }

    #[test]
    fn test_args_backend_values() {
        let args = Args::parse_from(["magnifier", "--backend", "picamera"]);
        assert_eq!(args.backend, Some(Backend::PiCamera));

        let args = Args::parse_from(["magnifier", "--backend", "usb"]);
        assert_eq!(args.backend, Some(Backend::Usb));

        assert!(Args::try_parse_from(["magnifier", "--backend", "webcam"]).is_err());
    }

    #[test]
    fn test_args_mode_values() {
        let args = Args::parse_from(["magnifier", "--mode", "prod"]);
        assert_eq!(args.mode, Some(Mode::Prod));

        let args = Args::parse_from(["magnifier", "--mode", "dev"]);
        assert_eq!(args.mode, Some(Mode::Dev));
    }

    #[test]
    fn test_args_width_short_flag() {
        let args = Args::parse_from(["magnifier", "-w", "800"]);
        assert_eq!(args.width, Some(800));
    }

    #[test]
    fn test_args_config_option() {
        let args = Args::parse_from(["magnifier", "--config", "/tmp/config.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/config.toml")));

        let args = Args::parse_from(["magnifier", "-c", "/tmp/test.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
    }

    #[test]
    fn test_args_list_cameras_subcommand() {
        let args = Args::parse_from(["magnifier", "list-cameras"]);
        assert!(matches!(args.command, Some(Command::ListCameras)));
    }

    #[test]
    fn test_args_config_subcommands() {
        let args = Args::parse_from(["magnifier", "config", "show"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));

        let args = Args::parse_from(["magnifier", "config", "init"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn test_args_service_subcommands() {
        for (name, action) in [
            ("start", ServiceAction::Start),
            ("stop", ServiceAction::Stop),
            ("toggle", ServiceAction::Toggle),
            ("watch", ServiceAction::Watch),
        ] {
            let args = Args::parse_from(["magnifier", "service", name]);
            match args.command {
                Some(Command::Service { action: parsed }) => assert_eq!(parsed, action),
                other => panic!("Expected service subcommand, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = Args::parse_from([
            "magnifier",
            "--width",
            "1024",
            "--camera",
            "2",
            "--backend",
            "usb",
            "--zoom-step",
            "0.5",
            "--mirror",
        ]);
        let mut config = Config::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.display.width, 1024);
        assert_eq!(config.camera.device, 2);
        assert_eq!(config.camera.backend, Backend::Usb);
        assert_eq!(config.zoom.step, 0.5);
        assert!(config.camera.mirror);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let args = Args::parse_from(["magnifier"]);
        let mut config = Config::default();
        args.apply_overrides(&mut config);
        assert_eq!(config, Config::default());
    }
}
