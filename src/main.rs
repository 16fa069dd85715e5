//! LED strip relay
//!
//! Plays short light animations on a WS281x strip. Clicking the button one,
//! two or three times picks an animation; the click count is also published
//! over MQTT so every other device on the topic plays the same one.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the strip, the click counter and
//!   the animation engine, polls them every millisecond
//! - **Button interrupt** (rppal): sends presses to the render thread
//! - **MQTT task** (tokio/rumqttc): forwards inbound messages to the render
//!   thread, publishes outbound ones
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/led-strip-relay --broker 192.168.1.10 --device-id DEVICE2
//! ```

#[cfg(not(feature = "hardware"))]
fn main() {
    eprintln!("This binary requires the 'hardware' feature (rs_ws281x, rppal).");
    eprintln!("Build with: cargo build --release");
    eprintln!("Tests can run without it: cargo test --no-default-features");
    std::process::exit(1);
}

#[cfg(feature = "hardware")]
fn main() -> Result<(), led_strip_relay::Error> {
    hardware_main()
}

#[cfg(feature = "hardware")]
#[tokio::main(flavor = "current_thread")]
async fn hardware_main() -> Result<(), led_strip_relay::Error> {
    use clap::Parser;
    use led_strip_relay::clicks::ClickAggregator;
    use led_strip_relay::engine::AnimationEngine;
    use led_strip_relay::mqtt::{self, MqttConfig};
    use led_strip_relay::router::EventRouter;
    use led_strip_relay::scheduler::{Scheduler, render_loop};
    use led_strip_relay::{
        ButtonConfig, DeviceConfig, StripConfig, exit_status, hardware, setup_signal_handler,
    };
    use std::sync::mpsc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tracing_subscriber::EnvFilter;

    /// LED strip relay
    #[derive(Parser)]
    #[command(name = "led-strip-relay")]
    #[command(about = "Button and MQTT driven animations for a WS281x LED strip")]
    #[command(version)]
    struct Args {
        /// Identity of this unit, used as MQTT client id and message prefix
        #[arg(long, default_value = "DEVICE2")]
        device_id: String,

        /// MQTT broker host
        #[arg(long, default_value = "localhost")]
        broker: String,

        /// MQTT broker port
        #[arg(long, default_value = "1883")]
        port: u16,

        /// Topic shared by all devices
        #[arg(long, default_value = "led_control_channel")]
        topic: String,

        /// MQTT keep-alive in seconds
        #[arg(long, default_value = "60")]
        keep_alive_secs: u64,

        /// Number of LEDs on the strip
        #[arg(long, default_value = "19")]
        led_count: usize,

        /// BCM GPIO pin driving the strip
        #[arg(long, default_value = "12")]
        led_pin: i32,

        /// DMA channel for the strip driver
        #[arg(long, default_value = "10")]
        led_dma: i32,

        /// Global strip brightness (0-255)
        #[arg(long, default_value = "128")]
        led_brightness: u8,

        /// BCM GPIO pin of the button
        #[arg(long, default_value = "2")]
        button_pin: u8,

        /// Button debounce in milliseconds
        #[arg(long, default_value = "50")]
        debounce_ms: u64,

        /// Silence in milliseconds that ends a burst of clicks
        #[arg(long, default_value = "2000")]
        click_timeout_ms: u64,

        /// Render loop sleep in microseconds
        #[arg(long, default_value = "1000")]
        poll_interval_us: u64,
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let config = DeviceConfig {
        device_id: args.device_id,
        strip: StripConfig {
            led_count: args.led_count,
            pin: args.led_pin,
            dma: args.led_dma,
            brightness: args.led_brightness,
        },
        button: ButtonConfig {
            pin: args.button_pin,
            debounce: Duration::from_millis(args.debounce_ms),
            click_timeout: Duration::from_millis(args.click_timeout_ms),
        },
        poll_interval: Duration::from_micros(args.poll_interval_us),
    };
    let mqtt_config = MqttConfig {
        host: args.broker,
        port: args.port,
        client_id: config.device_id.clone(),
        topic: args.topic,
        keep_alive: Duration::from_secs(args.keep_alive_secs),
    };

    tracing::info!("LED strip relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Device: {}", config.device_id);
    tracing::info!(
        "Strip: {} LEDs on GPIO {} (DMA {}, brightness {})",
        config.strip.led_count,
        config.strip.pin,
        config.strip.dma,
        config.strip.brightness
    );
    tracing::info!("Broker: {}:{} topic {}", mqtt_config.host, mqtt_config.port, mqtt_config.topic);

    let running = setup_signal_handler()?;

    // Button and MQTT both feed the render thread through this channel.
    let (input_tx, input_rx) = mpsc::channel();
    // The router publishes through this one without ever blocking.
    let (outbound_tx, outbound_rx) = tokio::sync::mpsc::unbounded_channel();

    let _button = hardware::bind_button(config.button, input_tx.clone())?;

    let cancellation_token = CancellationToken::new();
    let mqtt_task = tokio::task::spawn(mqtt::run(
        mqtt_config,
        cancellation_token.clone(),
        input_tx,
        outbound_rx,
    ));

    // The strip driver is not thread-safe, so it is created on the render
    // thread and never leaves it. We wait for that thread without blocking
    // the runtime the MQTT task lives on.
    let render = tokio::task::spawn_blocking(move || {
        let strip = hardware::create_strip(config.strip)?;
        let scheduler = Scheduler::new(
            ClickAggregator::new(config.button.click_timeout),
            AnimationEngine::new(strip),
            EventRouter::new(config.device_id, outbound_tx),
        );
        render_loop(scheduler, input_rx, &running, config.poll_interval);
        Ok::<(), led_strip_relay::Error>(())
    });

    tracing::info!("Device ready, press Ctrl+C to exit");

    let render = render.await;
    cancellation_token.cancel();
    let result = exit_status(render, mqtt_task.await);

    if result.is_ok() {
        tracing::info!("Shut down cleanly");
    }
    result
}
