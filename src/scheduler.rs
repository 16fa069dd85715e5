//! The render loop: one thread that owns all controller state.
//!
//! Button presses and inbound messages arrive from other threads as `Input`
//! values over an `mpsc` channel. The loop drains the channel without
//! blocking, checks the click deadline, advances the animation, then sleeps
//! for the poll interval. Everything that touches the pixel buffer or the
//! click count happens here, so none of it needs a lock.
//!
//! ## Rust concepts
//! - `try_recv()` for non-blocking channel reads
//! - Disjoint field borrows (`self.router` and `&mut self.engine` at once)
//! - Generic structs bounded by the `StripDriver` and `Publisher` traits

use crate::clicks::ClickAggregator;
use crate::driver::StripDriver;
use crate::engine::AnimationEngine;
use crate::is_running;
use crate::router::{EventRouter, Inbound, Publisher};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

/// Events delivered to the render thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// A debounced button press, stamped when the edge was seen
    Press(Instant),
    /// Text of a message received from the broker
    Remote(String),
}

pub struct Scheduler<D: StripDriver, P: Publisher> {
    clicks: ClickAggregator,
    engine: AnimationEngine<D>,
    router: EventRouter<P>,
}

impl<D: StripDriver, P: Publisher> Scheduler<D, P> {
    pub fn new(clicks: ClickAggregator, engine: AnimationEngine<D>, router: EventRouter<P>) -> Self {
        Self {
            clicks,
            engine,
            router,
        }
    }

    /// Apply one input. Bad messages are logged and dropped.
    pub fn handle(&mut self, input: Input, now: Instant) {
        match input {
            Input::Press(at) => self.clicks.on_press(at),
            Input::Remote(text) => {
                match self.router.on_remote_message(&text, &mut self.engine, now) {
                    Ok(Inbound::Started(kind)) => {
                        tracing::info!("Remote request for {}", kind);
                    }
                    Ok(Inbound::Echo) => {}
                    Err(e) => tracing::warn!("Discarding message: {}", e),
                }
            }
        }
    }

    /// One pass of the loop body: close a finished burst, advance the animation.
    pub fn poll(&mut self, now: Instant) {
        if let Some(count) = self.clicks.poll(now) {
            if let Err(e) = self.router.on_burst_complete(count, &mut self.engine, now) {
                tracing::warn!("Burst of {} clicks not played: {}", count, e);
            }
        }

        self.engine.tick(now);
    }

    /// Forget any pending burst and blank the strip.
    pub fn shutdown(&mut self) {
        self.clicks.cancel();
        self.engine.stop();
    }

    pub fn clicks(&self) -> &ClickAggregator {
        &self.clicks
    }

    pub fn engine(&self) -> &AnimationEngine<D> {
        &self.engine
    }
}

/// Main render loop. Runs until `running` is cleared, then blanks the strip.
///
/// The scheduler is handed back so the caller can inspect its final state.
pub fn render_loop<D: StripDriver, P: Publisher>(
    mut scheduler: Scheduler<D, P>,
    rx: Receiver<Input>,
    running: &AtomicBool,
    poll_interval: Duration,
) -> Scheduler<D, P> {
    let mut inputs_open = true;

    tracing::info!("Render loop started");

    while is_running(running) {
        loop {
            match rx.try_recv() {
                Ok(input) => scheduler.handle(input, Instant::now()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if inputs_open {
                        tracing::warn!("All input sources closed, animations keep running");
                        inputs_open = false;
                    }
                    break;
                }
            }
        }

        scheduler.poll(Instant::now());
        thread::sleep(poll_interval);
    }

    tracing::info!("Render loop stopping, clearing strip");
    scheduler.shutdown();
    scheduler
}
