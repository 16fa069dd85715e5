//! Raspberry Pi adapters: the WS281x strip and the push-button.
//!
//! Only built with the `hardware` feature, since both crates need the Pi's
//! peripherals (and root for DMA).

use crate::driver::StripDriver;
use crate::scheduler::Input;
use crate::{ButtonConfig, Color, Error, StripConfig};
use rppal::gpio::{Gpio, InputPin, Trigger};
use rs_ws281x::{ChannelBuilder, Controller, ControllerBuilder, StripType};
use std::sync::mpsc::Sender;
use std::time::Instant;

const SIGNAL_FREQ_HZ: u32 = 800_000;
const CHANNEL: usize = 0;

// ── Strip ────────────────────────────────────────────────────────────

/// A WS2812 strip driven through `rs_ws281x`.
pub struct Ws281xStrip {
    controller: Controller,
}

/// Create the strip controller configured for our hardware.
///
/// # Rust concept: Result and the ? operator
/// Initialization fails when not running as root or when the pin/DMA
/// combination is unavailable. We wrap the driver error and let the
/// caller decide.
pub fn create_strip(config: StripConfig) -> Result<Ws281xStrip, Error> {
    let channel = ChannelBuilder::new()
        .pin(config.pin)
        .count(config.driver_led_count()?)
        .strip_type(StripType::Ws2811Grb)
        .invert(false)
        .brightness(config.brightness)
        .build();

    let controller = ControllerBuilder::new()
        .freq(SIGNAL_FREQ_HZ)
        .dma(config.dma)
        .channel(CHANNEL, channel)
        .build()
        .map_err(Error::Strip)?;

    Ok(Ws281xStrip { controller })
}

impl StripDriver for Ws281xStrip {
    fn pixel_count(&self) -> usize {
        self.controller.leds(CHANNEL).len()
    }

    fn push(&mut self, pixels: &[Color]) {
        // The driver stores each LED as little-endian 0x00RRGGBB: [b, g, r, w]
        for (led, c) in self.controller.leds_mut(CHANNEL).iter_mut().zip(pixels) {
            *led = [c.b, c.g, c.r, 0];
        }

        if let Err(e) = self.controller.render() {
            tracing::warn!("Failed to render strip: {}", e);
        }
    }
}

// ── Button ───────────────────────────────────────────────────────────

/// Watch the button pin and send a timestamped `Input::Press` per falling edge.
///
/// The returned pin must be kept alive; dropping it stops the interrupt.
pub fn bind_button(config: ButtonConfig, tx: Sender<Input>) -> Result<InputPin, Error> {
    let gpio_err = |source| Error::Button {
        pin: config.pin,
        source,
    };

    let mut pin = Gpio::new()
        .and_then(|gpio| gpio.get(config.pin))
        .map_err(gpio_err)?
        .into_input_pullup();

    pin.set_async_interrupt(Trigger::FallingEdge, Some(config.debounce), move |_event| {
        if tx.send(Input::Press(Instant::now())).is_err() {
            tracing::warn!("Render thread gone, dropping button press");
        }
    })
    .map_err(gpio_err)?;

    tracing::info!("Button bound to GPIO {}", config.pin);
    Ok(pin)
}
