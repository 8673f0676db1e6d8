//! Deployment-mode physical buttons on Raspberry Pi GPIO pins.
//!
//! Each button pulls its pin to ground, so a press is a falling edge on a
//! pin with the internal pull-up enabled. Interrupts are handled on rppal's
//! own threads; the callbacks only send events.

use std::time::Duration;

use super::{ControlAction, ControlError, ControlSurface, EventSender};

/// One pin and the action its press triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinBinding {
    pub pin: u8,
    pub action: ControlAction,
}

/// BCM pin numbers of the control buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioPins {
    pub zoom_in: u8,
    pub zoom_out: u8,
    pub quit: u8,
    pub wake: u8,
    pub debounce: Duration,
}

impl Default for GpioPins {
    fn default() -> Self {
        Self {
            zoom_in: 17,
            zoom_out: 27,
            quit: 22,
            wake: 23,
            debounce: Duration::from_millis(50),
        }
    }
}

impl GpioPins {
    pub fn bindings(&self) -> [PinBinding; 4] {
        [
            PinBinding {
                pin: self.zoom_in,
                action: ControlAction::ZoomIn,
            },
            PinBinding {
                pin: self.zoom_out,
                action: ControlAction::ZoomOut,
            },
            PinBinding {
                pin: self.quit,
                action: ControlAction::Quit,
            },
            PinBinding {
                pin: self.wake,
                action: ControlAction::Wake,
            },
        ]
    }
}

/// Button panel wired to GPIO pins.
pub struct GpioSurface {
    pins: GpioPins,
    #[cfg(all(feature = "gpio", target_os = "linux"))]
    inputs: Vec<rppal::gpio::InputPin>,
}

impl std::fmt::Debug for GpioSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpioSurface")
            .field("pins", &self.pins)
            .finish_non_exhaustive()
    }
}

impl GpioSurface {
    pub fn new(pins: GpioPins) -> Self {
        Self {
            pins,
            #[cfg(all(feature = "gpio", target_os = "linux"))]
            inputs: Vec::new(),
        }
    }

    pub fn pins(&self) -> &GpioPins {
        &self.pins
    }
}

impl ControlSurface for GpioSurface {
    fn name(&self) -> &'static str {
        "GPIO buttons"
    }

    fn select_display_width(&mut self, configured: u32) -> Result<Option<u32>, ControlError> {
        Ok(Some(configured))
    }

    #[cfg(all(feature = "gpio", target_os = "linux"))]
    fn bind(&mut self, events: EventSender) -> Result<(), ControlError> {
        use super::{ControlEvent, InputSource};

        let gpio = rppal::gpio::Gpio::new().map_err(|e| ControlError::Gpio {
            pin: self.pins.zoom_in,
            message: e.to_string(),
        })?;

        for binding in self.pins.bindings() {
            let tx = events.clone();
            let input = watch_pin(&gpio, binding.pin, self.pins.debounce, move || {
                let event = ControlEvent::new(binding.action, InputSource::Gpio(binding.pin));
                // receiver gone means the loop already exited
                let _ = tx.send(event);
            })?;
            log::info!("GPIO{} bound to {:?}", binding.pin, binding.action);
            self.inputs.push(input);
        }
        Ok(())
    }

    #[cfg(not(all(feature = "gpio", target_os = "linux")))]
    fn bind(&mut self, _events: EventSender) -> Result<(), ControlError> {
        Err(ControlError::GpioUnavailable)
    }
}

/// A single button used by the companion toggle mode.
pub struct ToggleButton {
    pin: u8,
    #[cfg(all(feature = "gpio", target_os = "linux"))]
    _input: rppal::gpio::InputPin,
}

impl ToggleButton {
    /// Call `on_press` from the interrupt thread on every press of `pin`.
    #[cfg(all(feature = "gpio", target_os = "linux"))]
    pub fn watch<F>(pin: u8, debounce: Duration, on_press: F) -> Result<Self, ControlError>
    where
        F: FnMut() + Send + 'static,
    {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| ControlError::Gpio {
            pin,
            message: e.to_string(),
        })?;
        let input = watch_pin(&gpio, pin, debounce, on_press)?;
        Ok(Self { pin, _input: input })
    }

    #[cfg(not(all(feature = "gpio", target_os = "linux")))]
    pub fn watch<F>(_pin: u8, _debounce: Duration, _on_press: F) -> Result<Self, ControlError>
    where
        F: FnMut() + Send + 'static,
    {
        Err(ControlError::GpioUnavailable)
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

#[cfg(all(feature = "gpio", target_os = "linux"))]
fn watch_pin<F>(
    gpio: &rppal::gpio::Gpio,
    pin: u8,
    debounce: Duration,
    mut on_press: F,
) -> Result<rppal::gpio::InputPin, ControlError>
where
    F: FnMut() + Send + 'static,
{
    use rppal::gpio::Trigger;

    let gpio_err = |e: rppal::gpio::Error| ControlError::Gpio {
        pin,
        message: e.to_string(),
    };
    let mut input = gpio.get(pin).map_err(gpio_err)?.into_input_pullup();
    input
        .set_async_interrupt(Trigger::FallingEdge, Some(debounce), move |_event| {
            on_press()
        })
        .map_err(gpio_err)?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pins() {
        let pins = GpioPins::default();
        let bindings = pins.bindings();
        assert_eq!(
            bindings[0],
            PinBinding {
                pin: 17,
                action: ControlAction::ZoomIn
            }
        );
        assert_eq!(bindings[1].pin, 27);
        assert_eq!(bindings[2].action, ControlAction::Quit);
        assert_eq!(bindings[2].pin, 22);
        assert_eq!(bindings[3].pin, 23);
        assert_eq!(pins.debounce, Duration::from_millis(50));
    }

    #[test]
    fn test_width_comes_from_config() {
        let mut surface = GpioSurface::new(GpioPins::default());
        assert_eq!(surface.select_display_width(800).unwrap(), Some(800));
    }

    #[cfg(not(all(feature = "gpio", target_os = "linux")))]
    #[test]
    fn test_bind_without_gpio_support() {
        let (tx, _rx) = std::sync::mpsc::channel();
        let mut surface = GpioSurface::new(GpioPins::default());
        assert!(matches!(
            surface.bind(tx),
            Err(ControlError::GpioUnavailable)
        ));
    }
}
