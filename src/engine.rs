//! Animation engine: owns the pixel buffer and the running pattern.
//!
//! The engine is driven by polling. `tick()` may be called as often as the
//! caller likes; each pattern only renders when its frame interval has
//! passed since its last rendered frame, so animation speed does not depend
//! on how fast the loop spins.
//!
//! The caller supplies the current time (`now: Instant`) to every call.

use crate::driver::StripDriver;
use crate::pattern::{Animation, Frame, PatternKind, rainbow_phase};
use crate::{Color, Error};
use std::time::{Duration, Instant, SystemTime};

/// The pattern currently playing and when it last drew a frame.
#[derive(Debug, Clone, Copy)]
struct Active {
    animation: Animation,
    last_frame: Instant,
}

pub struct AnimationEngine<D: StripDriver> {
    driver: D,
    pixels: Vec<Color>,
    active: Option<Active>,
    /// A monotonic instant and the wall-clock time it corresponds to
    wall_anchor: (Instant, Duration),
}

impl<D: StripDriver> AnimationEngine<D> {
    /// Create an idle engine with an all-black buffer sized to the strip.
    pub fn new(driver: D) -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        let pixels = vec![Color::BLACK; driver.pixel_count()];

        Self {
            driver,
            pixels,
            active: None,
            wall_anchor: (Instant::now(), since_epoch),
        }
    }

    /// Pin the wall clock: `at` corresponds to `since_epoch` after the Unix epoch.
    ///
    /// The rainbow hue rotates with wall-clock time; tests use this to make
    /// it predictable.
    #[must_use]
    pub fn with_wall_clock(mut self, at: Instant, since_epoch: Duration) -> Self {
        self.wall_anchor = (at, since_epoch);
        self
    }

    /// Start the pattern with the given id, replacing whatever was playing.
    ///
    /// Unknown ids return `Error::InvalidPattern` and leave the engine as it was.
    pub fn start(&mut self, id: u32, now: Instant) -> Result<PatternKind, Error> {
        let kind = PatternKind::try_from(id)?;

        self.active = Some(Active {
            animation: Animation::new(kind),
            last_frame: now,
        });
        self.clear();
        tracing::info!("Starting animation: {}", kind);

        Ok(kind)
    }

    /// Advance the running pattern by at most one frame.
    ///
    /// Returns `true` if a frame was rendered and pushed. Calls that come
    /// before the pattern's frame interval has elapsed do nothing.
    pub fn tick(&mut self, now: Instant) -> bool {
        let phase = rainbow_phase(self.wall_clock(now));
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let kind = active.animation.kind();
        if now.saturating_duration_since(active.last_frame) < kind.frame_interval() {
            return false;
        }

        match active.animation.advance(&mut self.pixels, phase) {
            Frame::Rendered => {
                active.last_frame = now;
                self.driver.push(&self.pixels);
            }
            Frame::Last => {
                self.driver.push(&self.pixels);
                self.finish(kind);
            }
            Frame::Finished => self.finish(kind),
        }

        true
    }

    /// Stop any running pattern and blank the strip.
    pub fn stop(&mut self) {
        self.active = None;
        self.clear();
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn pattern(&self) -> Option<PatternKind> {
        self.active.map(|a| a.animation.kind())
    }

    /// The running pattern's progress, if any.
    pub fn animation(&self) -> Option<&Animation> {
        self.active.as_ref().map(|a| &a.animation)
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn finish(&mut self, kind: PatternKind) {
        self.active = None;
        self.clear();
        tracing::debug!("Animation finished: {}", kind);
    }

    fn clear(&mut self) {
        self.pixels.fill(Color::BLACK);
        self.driver.push(&self.pixels);
    }

    fn wall_clock(&self, now: Instant) -> Duration {
        let (at, since_epoch) = self.wall_anchor;
        since_epoch + now.saturating_duration_since(at)
    }
}
