//! Shared types for the LED strip relay.
//!
//! This module provides what every other part of the crate builds on:
//! - Device configuration collected from the command line
//! - The strip `Color` type and the two palettes the animations use
//! - Signal handling for clean shutdown
//!
//! The pieces of the controller live in their own modules:
//! `clicks` (burst aggregation), `engine` and `pattern` (animations),
//! `router` (event routing), `scheduler` (the polling loop) and `mqtt`
//! (broker adapter). Hardware adapters are behind the `hardware` feature.

pub mod clicks;
pub mod driver;
pub mod engine;
pub mod error;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod message;
pub mod mqtt;
pub mod pattern;
pub mod router;
pub mod scheduler;

pub use error::{Error, MqttError};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinError;

// ── Device configuration ───────────────────────────────────────────

/// Settings for the strip hardware.
///
/// # Rust concept: derive macros
/// `Clone, Copy` make this cheaply copyable (it's just a few integers).
/// Passing it by value keeps configuration explicit instead of global.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripConfig {
    /// Number of pixels on the strip
    pub led_count: usize,
    /// BCM GPIO pin carrying the data signal
    pub pin: i32,
    /// DMA channel used by the driver
    pub dma: i32,
    /// Global driver brightness (0-255)
    pub brightness: u8,
}

impl StripConfig {
    /// The LED count as the driver's C `int`.
    pub fn driver_led_count(&self) -> Result<i32, Error> {
        i32::try_from(self.led_count).map_err(|_| Error::InvalidLedCount(self.led_count))
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            led_count: 19,
            pin: 12,
            dma: 10,
            brightness: 128,
        }
    }
}

/// Settings for the push-button and click aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonConfig {
    /// BCM GPIO pin of the button (pulled up, pressed = low)
    pub pin: u8,
    pub debounce: Duration,
    /// Silence that ends a burst of clicks
    pub click_timeout: Duration,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            pin: 2,
            debounce: Duration::from_millis(50),
            click_timeout: Duration::from_secs(2),
        }
    }
}

/// Everything the controller needs to know about this unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Identity used to tag outbound messages and drop our own echoes
    pub device_id: String,
    pub strip: StripConfig,
    pub button: ButtonConfig,
    /// Sleep between two polls of the render loop
    pub poll_interval: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "DEVICE2".to_string(),
            strip: StripConfig::default(),
            button: ButtonConfig::default(),
            poll_interval: Duration::from_millis(1),
        }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// Our own color type, decoupled from the hardware crate.
///
/// This lets us test rendering anywhere without `rs_ws281x`.
/// At the hardware boundary, the driver converts it to raw bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Magenta-pink at the given brightness (0-255).
    ///
    /// Only the luminance changes, the hue stays fixed at (255, 20, 147).
    pub fn pink(brightness: u8) -> Self {
        Self {
            r: brightness,
            g: scale_rounded(20, brightness),
            b: scale_rounded(147, brightness),
        }
    }

    /// Map a position on the color wheel (0-255) to a fully saturated color.
    ///
    /// # Rust concept: match with ranges
    /// The wheel has three 85-wide bands: red→green, green→blue, blue→red.
    /// Range patterns make each band explicit and the compiler checks
    /// that every `u8` lands in one of them.
    pub fn wheel(position: u8) -> Self {
        match position {
            0..=84 => {
                let p = position * 3;
                Self::new(p, 255 - p, 0)
            }
            85..=169 => {
                let q = (position - 85) * 3;
                Self::new(255 - q, 0, q)
            }
            170..=255 => {
                let q = (position - 170) * 3;
                Self::new(0, q, 255 - q)
            }
        }
    }
}

/// `round(channel * brightness / 255)` in integer arithmetic.
fn scale_rounded(channel: u8, brightness: u8) -> u8 {
    ((u16::from(channel) * u16::from(brightness) + 127) / 255) as u8
}

// ── Shutdown ───────────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
///
/// # Rust concept: Arc and AtomicBool
/// The flag is shared between the render loop and the signal handler.
/// `Arc` gives both of them ownership, `AtomicBool` makes the flag
/// thread-safe without a mutex.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone(); // Clone the Arc, not the bool

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(Error::SignalHandler)?;

    Ok(running)
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

/// Combine how the render thread and the MQTT task ended into the exit result.
///
/// A render failure wins over an MQTT failure; a panic in either task is an
/// error, never a clean exit.
pub fn exit_status(
    render: Result<Result<(), Error>, JoinError>,
    mqtt: Result<Result<(), MqttError>, JoinError>,
) -> Result<(), Error> {
    let mqtt = match mqtt {
        Ok(result) => result.map_err(Error::from),
        Err(source) => Err(Error::TaskPanicked { task: "MQTT", source }),
    };
    if let Err(e) = &mqtt {
        tracing::error!("MQTT task ended with error: {}", e);
    }

    match render {
        Ok(Ok(())) => mqtt,
        Ok(Err(e)) => Err(e),
        Err(source) => {
            tracing::error!("Render thread panicked: {}", source);
            Err(Error::TaskPanicked { task: "Render", source })
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // ── Config tests ───────────────────────────────────────────────

    #[test]
    fn default_strip_matches_reference_device() {
        let strip = StripConfig::default();
        assert_eq!(strip.led_count, 19);
        assert_eq!(strip.pin, 12);
        assert_eq!(strip.dma, 10);
        assert_eq!(strip.brightness, 128);
    }

    #[test]
    fn default_click_timeout_is_two_seconds() {
        assert_eq!(
            ButtonConfig::default().click_timeout,
            Duration::from_secs(2)
        );
    }

    #[rstest]
    #[case(19, Some(19))]
    #[case(i32::MAX as usize, Some(i32::MAX))]
    #[case(i32::MAX as usize + 1, None)]
    #[case(usize::MAX, None)]
    fn driver_led_count_rejects_what_does_not_fit(
        #[case] led_count: usize,
        #[case] expected: Option<i32>,
    ) {
        let strip = StripConfig {
            led_count,
            ..StripConfig::default()
        };
        match (strip.driver_led_count(), expected) {
            (Ok(got), Some(want)) => assert_eq!(got, want),
            (Err(Error::InvalidLedCount(got)), None) => assert_eq!(got, led_count),
            (got, want) => panic!("expected {want:?}, got {got:?}"),
        }
    }

    // ── Color tests ────────────────────────────────────────────────

    #[rstest]
    #[case(255, Color::new(255, 20, 147))]
    #[case(192, Color::new(192, 15, 111))]
    #[case(128, Color::new(128, 10, 74))]
    #[case(1, Color::new(1, 0, 1))]
    #[case(0, Color::BLACK)]
    fn pink_scales_luminance(#[case] brightness: u8, #[case] expected: Color) {
        assert_eq!(Color::pink(brightness), expected);
    }

    #[rstest]
    #[case(0, Color::new(0, 255, 0))]
    #[case(84, Color::new(252, 3, 0))]
    #[case(85, Color::new(255, 0, 0))]
    #[case(169, Color::new(3, 0, 252))]
    #[case(170, Color::new(0, 0, 255))]
    #[case(255, Color::new(0, 255, 0))]
    fn wheel_band_edges(#[case] position: u8, #[case] expected: Color) {
        assert_eq!(Color::wheel(position), expected);
    }

    #[test]
    fn wheel_is_fully_saturated_everywhere() {
        for position in 0..=255u8 {
            let c = Color::wheel(position);
            let sum = u16::from(c.r) + u16::from(c.g) + u16::from(c.b);
            assert_eq!(sum, 255, "position {position}");
        }
    }

    #[test]
    fn running_flag_reads_current_value() {
        let flag = AtomicBool::new(true);
        assert!(is_running(&flag));
        flag.store(false, Ordering::SeqCst);
        assert!(!is_running(&flag));
    }

    // ── Exit status tests ──────────────────────────────────────────

    async fn panicked() -> JoinError {
        tokio::spawn(async { panic!("boom") })
            .await
            .expect_err("task should panic")
    }

    #[tokio::test]
    async fn clean_tasks_exit_cleanly() {
        assert!(exit_status(Ok(Ok(())), Ok(Ok(()))).is_ok());
    }

    #[tokio::test]
    async fn render_panic_is_an_error() {
        let result = exit_status(Err(panicked().await), Ok(Ok(())));
        assert!(matches!(result, Err(Error::TaskPanicked { task: "Render", .. })));
    }

    #[tokio::test]
    async fn mqtt_panic_is_an_error() {
        let result = exit_status(Ok(Ok(())), Err(panicked().await));
        assert!(matches!(result, Err(Error::TaskPanicked { task: "MQTT", .. })));
    }

    #[tokio::test]
    async fn mqtt_failure_is_propagated() {
        let (client, eventloop) =
            rumqttc::AsyncClient::new(rumqttc::MqttOptions::new("test", "localhost", 1883), 1);
        drop(eventloop);
        let publish_error = client
            .try_publish("t", rumqttc::QoS::AtMostOnce, false, "x")
            .expect_err("event loop is gone");

        let result = exit_status(Ok(Ok(())), Ok(Err(MqttError::Publishing(publish_error))));
        assert!(matches!(result, Err(Error::Mqtt(MqttError::Publishing(_)))));
    }

    #[tokio::test]
    async fn render_failure_wins_over_mqtt_failure() {
        let result = exit_status(
            Ok(Err(Error::InvalidLedCount(usize::MAX))),
            Err(panicked().await),
        );
        assert!(matches!(result, Err(Error::InvalidLedCount(usize::MAX))));
    }
}
