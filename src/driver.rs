//! The seam between the animation engine and the LED hardware.
//!
//! The engine only ever needs two things from a strip: how many pixels it
//! has, and a way to show a finished buffer. `MemoryStrip` implements it
//! in memory, `hardware::Ws281xStrip` on the device.

use crate::Color;

/// A strip of addressable pixels.
///
/// `push` is fire-and-forget: implementations deal with their own
/// hardware errors (usually by logging them).
pub trait StripDriver {
    fn pixel_count(&self) -> usize;

    fn push(&mut self, pixels: &[Color]);
}

/// In-memory strip that remembers every pushed frame.
#[derive(Debug, Clone, Default)]
pub struct MemoryStrip {
    pixel_count: usize,
    frames: Vec<Vec<Color>>,
}

impl MemoryStrip {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixel_count,
            frames: Vec::new(),
        }
    }

    /// All frames pushed so far, oldest first.
    pub fn frames(&self) -> &[Vec<Color>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[Color]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn push_count(&self) -> usize {
        self.frames.len()
    }
}

impl StripDriver for MemoryStrip {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn push(&mut self, pixels: &[Color]) {
        self.frames.push(pixels.to_vec());
    }
}
