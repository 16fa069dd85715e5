//! MQTT adapter: connects to the broker and shuttles messages both ways.
//!
//! Inbound publishes on the control topic are forwarded to the render thread
//! as `Input::Remote`. Outbound payloads arrive from the router over an
//! unbounded channel, so the render loop never waits on the network.
//!
//! Connection handling stays with `rumqttc`: after an error the event loop
//! reconnects on the next `poll()`. We only pause briefly in between and
//! subscribe again on every `ConnAck`.
//!
//! Requests go through `try_publish`/`try_subscribe`: while the broker is
//! unreachable the request queue is not drained, and an awaiting send
//! would stop this loop from polling the event loop or the cancellation
//! token.

use crate::error::MqttError;
use crate::message;
use crate::scheduler::Input;
use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

/// Capacity of the client's request queue; outbound messages beyond it are dropped.
const REQUEST_QUEUE: usize = 100;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// Also used as the MQTT client id
    pub client_id: String,
    /// Topic used for both publishing and subscribing
    pub topic: String,
    pub keep_alive: Duration,
}

pub async fn run(
    config: MqttConfig,
    cancellation_token: CancellationToken,
    inbound: Sender<Input>,
    mut outbound: UnboundedReceiver<String>,
) -> Result<(), MqttError> {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(config.keep_alive);

    let (client, mut eventloop) = AsyncClient::new(options, REQUEST_QUEUE);
    tracing::info!("Connecting to broker {}:{}...", config.host, config.port);

    // Set on every ConnAck, cleared once the SUBSCRIBE is queued.
    let mut subscribe_pending = false;

    loop {
        tokio::select! {
            () = cancellation_token.cancelled() => {
                tracing::info!("Cancelled, shutting down MQTT processing");
                break;
            }

            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("Connected to MQTT broker");
                    subscribe_pending = true;
                }

                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    tracing::debug!(topic = ?publish.topic, payload = ?publish.payload, "Received payload");
                    forward(&publish.payload, &inbound);
                }

                Ok(_) => {
                    // pings, acks and our own outgoing packets
                }

                Err(error) => {
                    tracing::warn!("MQTT connection error: {}, retrying", error);
                    if cancellation_token
                        .run_until_cancelled(tokio::time::sleep(RECONNECT_DELAY))
                        .await
                        .is_none()
                    {
                        break;
                    }
                }
            },

            Some(payload) = outbound.recv() => {
                match client.try_publish(&config.topic, QoS::AtMostOnce, false, payload) {
                    Ok(()) => {}
                    Err(ClientError::TryRequest(_)) => {
                        tracing::warn!("MQTT request queue full, dropping outbound message");
                    }
                    Err(e) => return Err(MqttError::Publishing(e)),
                }
            }
        }

        if subscribe_pending {
            match client.try_subscribe(&config.topic, QoS::AtMostOnce) {
                Ok(()) => {
                    subscribe_pending = false;
                    tracing::info!("Subscribed to {}", config.topic);
                }
                // retried after the event loop drains the queue
                Err(ClientError::TryRequest(_)) => {}
                Err(e) => return Err(MqttError::Subscribing(e)),
            }
        }
    }

    disconnect(&client, &mut eventloop).await;
    Ok(())
}

/// Hand an inbound payload to the render thread.
fn forward(payload: &[u8], inbound: &Sender<Input>) {
    let text = match message::decode_payload(payload) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Discarding message: {}", e);
            return;
        }
    };

    if inbound.send(Input::Remote(text)).is_err() {
        tracing::error!("Render thread gone, dropping inbound message");
    }
}

/// Send DISCONNECT and give the event loop a moment to flush it.
async fn disconnect(client: &AsyncClient, eventloop: &mut EventLoop) {
    if let Err(e) = client.try_disconnect() {
        tracing::warn!("Failed to queue disconnect: {}", e);
        return;
    }

    let flush = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };

    if tokio::time::timeout(DISCONNECT_TIMEOUT, flush).await.is_err() {
        tracing::warn!("Timed out waiting for broker disconnect");
    } else {
        tracing::info!("Disconnected from MQTT broker");
    }
}
