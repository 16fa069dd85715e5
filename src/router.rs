//! Event router: decides what a finished burst or an inbound message does.
//!
//! Local bursts are announced to the other devices and played here.
//! Messages from other devices are played here too. Our own messages come
//! back through the broker and are dropped, otherwise every burst would
//! start twice.

use crate::driver::StripDriver;
use crate::engine::AnimationEngine;
use crate::message::{self, ClickMessage};
use crate::pattern::PatternKind;
use crate::Error;
use std::time::Instant;

/// Outbound side of the message channel.
///
/// Publishing must not block the render loop, so implementations hand the
/// payload off (to a queue, a task, ...) and return immediately.
pub trait Publisher {
    fn publish(&self, payload: String);
}

impl Publisher for tokio::sync::mpsc::UnboundedSender<String> {
    fn publish(&self, payload: String) {
        if let Err(e) = self.send(payload) {
            tracing::warn!("Dropping outbound message {:?}: MQTT task gone", e.0);
        }
    }
}

/// What happened to an inbound message that was not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// Another device asked for this pattern and it is now playing
    Started(PatternKind),
    /// The message was our own, echoed back by the broker
    Echo,
}

pub struct EventRouter<P: Publisher> {
    device_id: String,
    publisher: P,
}

impl<P: Publisher> EventRouter<P> {
    pub fn new(device_id: impl Into<String>, publisher: P) -> Self {
        Self {
            device_id: device_id.into(),
            publisher,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Announce a finished local burst, then play it.
    ///
    /// The count is published even when it names no pattern; only the
    /// local start is rejected in that case.
    pub fn on_burst_complete<D: StripDriver>(
        &self,
        count: u32,
        engine: &mut AnimationEngine<D>,
        now: Instant,
    ) -> Result<PatternKind, Error> {
        let payload = ClickMessage {
            device_id: &self.device_id,
            count,
        }
        .to_string();
        tracing::info!("Publishing {}", payload);
        self.publisher.publish(payload);

        engine.start(count, now)
    }

    /// Play the pattern another device asked for.
    pub fn on_remote_message<D: StripDriver>(
        &self,
        text: &str,
        engine: &mut AnimationEngine<D>,
        now: Instant,
    ) -> Result<Inbound, Error> {
        if message::is_from(&self.device_id, text) {
            tracing::debug!("Ignoring own message {:?}", text);
            return Ok(Inbound::Echo);
        }

        let id = message::parse_pattern_id(text)?;
        engine.start(id, now).map(Inbound::Started)
    }
}
