//! Startup wiring: control surface, camera, window and the capture loop.

use std::sync::mpsc::{self, Sender};

use crate::camera::{CameraSource, FrameSource};
use crate::config::Config;
use crate::control::{
    ControlAction, ControlEvent, ControlSurface, GpioSurface, InputSource, Mode, SetupSurface,
    ToggleButton,
};
use crate::display::WindowSink;
use crate::error::AppError;
use crate::event_loop::{Magnifier, RunSummary};
use crate::power::DisplayPower;
use crate::service::ServiceController;

/// Route Ctrl+C into the loop as a `Quit` event.
fn install_signal_handler(events: Sender<ControlEvent>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let _ = events.send(ControlEvent::new(ControlAction::Quit, InputSource::Signal));
    })
}

/// The control surface for a mode.
pub fn control_surface(mode: Mode, config: &Config) -> Box<dyn ControlSurface> {
    match mode {
        Mode::Dev => Box::new(SetupSurface::new(
            config.display.presets.clone(),
            config.display.title.clone(),
        )),
        Mode::Prod => Box::new(GpioSurface::new(config.gpio_pins())),
    }
}

/// Run the magnifier until quit. `Ok(None)` if the setup window was closed
/// without choosing a width.
pub fn run_magnifier(mode: Mode, config: &Config) -> Result<Option<RunSummary>, AppError> {
    let mut surface = control_surface(mode, config);
    log::info!("Starting in {} mode ({})", mode, surface.name());

    let Some(width) = surface.select_display_width(config.display.width)? else {
        return Ok(None);
    };

    let (tx, rx) = mpsc::channel();
    surface.bind(tx.clone())?;
    install_signal_handler(tx)?;

    let power = DisplayPower::new(config.power.manage, config.power.screen_timeout_secs);
    power.apply();

    let camera = match CameraSource::open(&config.camera_settings()) {
        Ok(camera) => camera,
        Err(e) => {
            log::error!("{}", e);
            power.restore();
            return Err(e.into());
        }
    };
    let resolution = camera.resolution();
    log::info!(
        "Camera backend {} at {}x{}",
        camera.backend(),
        resolution.width,
        resolution.height
    );

    let sink = WindowSink::new(config.display.title.clone(), mode == Mode::Prod);
    let wake_power = power.clone();
    let result = Magnifier::new(
        camera,
        sink,
        rx,
        config.zoom_state(),
        config.loop_settings(width),
    )
    .with_wake_handler(move || wake_power.wake())
    .run();

    power.restore();
    drop(surface);

    match result {
        Ok(summary) => Ok(Some(summary)),
        Err(e) => {
            log::error!("{}", e);
            Err(e.into())
        }
    }
}

enum WatchEvent {
    Pressed,
    Quit,
}

/// Companion toggle mode: each press of the toggle pin starts or stops
/// the service. Runs until Ctrl+C.
pub fn watch_service(config: &Config) -> Result<(), AppError> {
    let service = ServiceController::new(config.service.unit.clone(), config.service.user);
    let (tx, rx) = mpsc::channel();

    let press_tx = tx.clone();
    let button = ToggleButton::watch(
        config.gpio.toggle,
        config.gpio_pins().debounce,
        move || {
            let _ = press_tx.send(WatchEvent::Pressed);
        },
    )?;
    ctrlc::set_handler(move || {
        let _ = tx.send(WatchEvent::Quit);
    })?;
    log::info!(
        "Watching GPIO{} to toggle {}",
        button.pin(),
        service.unit()
    );

    for event in rx {
        match event {
            WatchEvent::Pressed => match service.toggle() {
                Ok(outcome) => log::info!("{} {:?}", service.unit(), outcome),
                Err(e) => log::error!("{}", e),
            },
            WatchEvent::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_per_mode() {
        let config = Config::default();
        assert_eq!(control_surface(Mode::Dev, &config).name(), "on-screen buttons");
        assert_eq!(control_surface(Mode::Prod, &config).name(), "GPIO buttons");
    }

    #[test]
    fn test_prod_surface_uses_configured_width() {
        let mut config = Config::default();
        config.display.width = 1024;
        let mut surface = control_surface(Mode::Prod, &config);
        assert_eq!(
            surface.select_display_width(config.display.width).unwrap(),
            Some(1024)
        );
    }
}
