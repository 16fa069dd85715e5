//! Error types.
//!
//! `InvalidPattern` and `MalformedMessage` are the two conditions the
//! controller reports at runtime. Both are logged and dropped by the render
//! loop. The remaining variants occur during startup or when a background
//! task ends, and are propagated to `main`.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid pattern id {0}, expected 1, 2 or 3")]
    InvalidPattern(u32),

    #[error("Malformed message: {0:?}")]
    MalformedMessage(String),

    #[error("Failed to set Ctrl-C handler")]
    SignalHandler(#[source] ctrlc::Error),

    #[error("LED count {0} does not fit the strip driver")]
    InvalidLedCount(usize),

    #[error("MQTT task failed")]
    Mqtt(#[from] MqttError),

    #[error("{task} task panicked")]
    TaskPanicked {
        task: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },

    #[cfg(feature = "hardware")]
    #[error("Failed to initialize LED strip")]
    Strip(#[source] rs_ws281x::WS2811Error),

    #[cfg(feature = "hardware")]
    #[error("Failed to set up button on GPIO {pin}")]
    Button {
        pin: u8,
        #[source]
        source: rppal::gpio::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    #[error("Failed to subscribe")]
    Subscribing(#[source] rumqttc::ClientError),

    #[error("Failed to publish")]
    Publishing(#[source] rumqttc::ClientError),
}
