use clap::Parser;

use magnifier::app;
use magnifier::cli::{self, Args, Command};
use magnifier::config::Config;
use magnifier::control::Mode;
use magnifier::error::AppError;
use magnifier::logging;

fn main() {
    // .env is optional; existing variables win
    let _ = dotenv::dotenv();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;
    let mode = args.mode.unwrap_or_else(Mode::from_env);

    match args.command {
        Some(Command::ListCameras) => return cli::list_cameras(),
        Some(Command::Config { action }) => {
            return cli::handle_config_action(action, &config, args.config.as_deref())
        }
        _ => {}
    }

    let _log_guard = logging::init(mode, &config.log_dir(), config.logging.max_files)?;

    match args.command {
        Some(Command::Service { action }) => cli::handle_service_action(action, &config),
        _ => {
            if let Some(summary) = app::run_magnifier(mode, &config)? {
                log::info!("Final zoom {:.2}x", summary.final_zoom);
            }
            Ok(())
        }
    }
}
