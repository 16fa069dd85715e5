//! The three lighting patterns and their per-frame behavior.
//!
//! ## Rust concepts
//! - `enum` variants carrying their own progress (tagged unions)
//! - `TryFrom` for validated conversions from raw ids
//! - `checked_sub` to skip trail pixels that would fall off the strip

use crate::{Color, Error};
use std::fmt;
use std::time::Duration;

/// Which pattern to play, as numbered on the wire (1, 2, 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    /// Whole strip breathes pink up and down once
    Pulse,
    /// A pink dot with a fading tail runs along the strip
    PinkRunner,
    /// A rainbow dot with hue-shifted tail runs along the strip
    RainbowRunner,
}

impl PatternKind {
    pub fn id(self) -> u32 {
        match self {
            Self::Pulse => 1,
            Self::PinkRunner => 2,
            Self::RainbowRunner => 3,
        }
    }

    /// Minimum time between two rendered frames.
    pub fn frame_interval(self) -> Duration {
        match self {
            Self::Pulse => Duration::from_millis(15),
            Self::PinkRunner => Duration::from_millis(30),
            Self::RainbowRunner => Duration::from_millis(40),
        }
    }
}

impl TryFrom<u32> for PatternKind {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::Pulse),
            2 => Ok(Self::PinkRunner),
            3 => Ok(Self::RainbowRunner),
            other => Err(Error::InvalidPattern(other)),
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pulse => "pulse",
            Self::PinkRunner => "pink runner",
            Self::RainbowRunner => "rainbow runner",
        };
        write!(f, "{name} ({})", self.id())
    }
}

/// Color scheme of a runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    Pink,
    Rainbow,
}

/// Pink tail brightness: head, then 75% and 50%.
const PINK_TRAIL: [u8; 3] = [255, 192, 128];

/// Hue offsets of the rainbow tail, in wheel steps behind the head.
const RAINBOW_TRAIL: [u8; 3] = [0, 8, 16];

/// Result of advancing an animation by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    /// The buffer holds a new frame to show
    Rendered,
    /// The buffer holds the final frame; show it, then clear
    Last,
    /// The pattern reached its end without a new frame; clear
    Finished,
}

/// A running pattern together with its progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Animation {
    Pulse { level: u8, rising: bool },
    Runner { palette: Palette, cursor: usize },
}

impl Animation {
    /// Fresh state for `kind`, positioned before its first frame.
    pub fn new(kind: PatternKind) -> Self {
        match kind {
            PatternKind::Pulse => Self::Pulse {
                level: 0,
                rising: true,
            },
            PatternKind::PinkRunner => Self::Runner {
                palette: Palette::Pink,
                cursor: 0,
            },
            PatternKind::RainbowRunner => Self::Runner {
                palette: Palette::Rainbow,
                cursor: 0,
            },
        }
    }

    pub fn kind(&self) -> PatternKind {
        match self {
            Self::Pulse { .. } => PatternKind::Pulse,
            Self::Runner {
                palette: Palette::Pink,
                ..
            } => PatternKind::PinkRunner,
            Self::Runner {
                palette: Palette::Rainbow,
                ..
            } => PatternKind::RainbowRunner,
        }
    }

    /// Render the next frame into `pixels`.
    ///
    /// `phase` is the slowly rotating hue offset (see [`rainbow_phase`]);
    /// only the rainbow runner uses it.
    pub fn advance(&mut self, pixels: &mut [Color], phase: u8) -> Frame {
        match self {
            Self::Pulse { level, rising } => {
                if *rising {
                    *level = level.saturating_add(1);
                    if *level == u8::MAX {
                        *rising = false;
                    }
                } else {
                    *level = level.saturating_sub(1);
                    if *level == 0 {
                        return Frame::Finished;
                    }
                }

                pixels.fill(Color::pink(*level));
                Frame::Rendered
            }

            Self::Runner { palette, cursor } => {
                let count = pixels.len();
                if *cursor >= count {
                    return Frame::Finished;
                }

                pixels.fill(Color::BLACK);
                let trail = match palette {
                    Palette::Pink => PINK_TRAIL.map(Color::pink),
                    Palette::Rainbow => {
                        let head = ((*cursor * 256 / count) as u32 + u32::from(phase)) % 256;
                        let head = head as u8;
                        RAINBOW_TRAIL.map(|behind| Color::wheel(head.wrapping_sub(behind)))
                    }
                };
                paint_trail(pixels, *cursor, &trail);

                *cursor += 1;
                if *cursor >= count {
                    Frame::Last
                } else {
                    Frame::Rendered
                }
            }
        }
    }
}

/// Paint `trail[0]` at `head`, `trail[1]` one pixel behind it, and so on.
fn paint_trail(pixels: &mut [Color], head: usize, trail: &[Color]) {
    for (behind, color) in trail.iter().enumerate() {
        if let Some(pixel) = head.checked_sub(behind).and_then(|i| pixels.get_mut(i)) {
            *pixel = *color;
        }
    }
}

/// Hue offset that turns at 100 wheel steps per second of wall-clock time.
pub fn rainbow_phase(since_epoch: Duration) -> u8 {
    ((since_epoch.as_millis() / 10) % 256) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1, PatternKind::Pulse)]
    #[case(2, PatternKind::PinkRunner)]
    #[case(3, PatternKind::RainbowRunner)]
    fn known_ids_map_to_patterns(#[case] id: u32, #[case] expected: PatternKind) {
        let kind = PatternKind::try_from(id).unwrap();
        assert_eq!(kind, expected);
        assert_eq!(kind.id(), id);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[case(7)]
    #[case(u32::MAX)]
    fn unknown_ids_are_invalid(#[case] id: u32) {
        let err = PatternKind::try_from(id).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern(got) if got == id));
    }

    #[rstest]
    #[case(PatternKind::Pulse, 15)]
    #[case(PatternKind::PinkRunner, 30)]
    #[case(PatternKind::RainbowRunner, 40)]
    fn frame_intervals(#[case] kind: PatternKind, #[case] millis: u64) {
        assert_eq!(kind.frame_interval(), Duration::from_millis(millis));
    }

    #[test]
    fn new_animation_reports_its_kind() {
        for kind in [
            PatternKind::Pulse,
            PatternKind::PinkRunner,
            PatternKind::RainbowRunner,
        ] {
            assert_eq!(Animation::new(kind).kind(), kind);
        }
    }

    // ── Pulse ──────────────────────────────────────────────────────

    #[test]
    fn pulse_first_frame_is_level_one() {
        let mut pixels = [Color::BLACK; 4];
        let mut pulse = Animation::new(PatternKind::Pulse);

        assert_eq!(pulse.advance(&mut pixels, 0), Frame::Rendered);
        assert_eq!(pixels, [Color::pink(1); 4]);
    }

    #[test]
    fn pulse_flips_at_full_brightness_and_finishes_at_zero() {
        let mut pixels = [Color::BLACK; 3];
        let mut pulse = Animation::new(PatternKind::Pulse);

        for _ in 0..255 {
            assert_eq!(pulse.advance(&mut pixels, 0), Frame::Rendered);
        }
        assert_eq!(
            pulse,
            Animation::Pulse {
                level: 255,
                rising: false
            }
        );
        assert_eq!(pixels, [Color::pink(255); 3]);

        for _ in 0..254 {
            assert_eq!(pulse.advance(&mut pixels, 0), Frame::Rendered);
        }
        assert_eq!(pixels, [Color::pink(1); 3]);
        assert_eq!(pulse.advance(&mut pixels, 0), Frame::Finished);
    }

    // ── Runners ────────────────────────────────────────────────────

    #[test]
    fn pink_runner_draws_fading_tail() {
        let mut pixels = [Color::pink(50); 6];
        let mut runner = Animation::new(PatternKind::PinkRunner);

        runner.advance(&mut pixels, 0);
        assert_eq!(
            pixels,
            [
                Color::pink(255),
                Color::BLACK,
                Color::BLACK,
                Color::BLACK,
                Color::BLACK,
                Color::BLACK
            ]
        );

        runner.advance(&mut pixels, 0);
        runner.advance(&mut pixels, 0);
        runner.advance(&mut pixels, 0);
        assert_eq!(
            pixels,
            [
                Color::BLACK,
                Color::pink(128),
                Color::pink(192),
                Color::pink(255),
                Color::BLACK,
                Color::BLACK
            ]
        );
    }

    #[test]
    fn runner_finishes_after_one_frame_per_pixel() {
        let mut pixels = [Color::BLACK; 19];
        let mut runner = Animation::new(PatternKind::PinkRunner);

        for _ in 0..18 {
            assert_eq!(runner.advance(&mut pixels, 0), Frame::Rendered);
        }
        assert_eq!(runner.advance(&mut pixels, 0), Frame::Last);
        assert_eq!(
            runner,
            Animation::Runner {
                palette: Palette::Pink,
                cursor: 19
            }
        );
        assert_eq!(
            pixels[16..].to_vec(),
            vec![Color::pink(128), Color::pink(192), Color::pink(255)]
        );

        assert_eq!(runner.advance(&mut pixels, 0), Frame::Finished);
    }

    #[test]
    fn runner_on_empty_strip_finishes_immediately() {
        let mut pixels: [Color; 0] = [];
        let mut runner = Animation::new(PatternKind::RainbowRunner);
        assert_eq!(runner.advance(&mut pixels, 0), Frame::Finished);
    }

    #[test]
    fn rainbow_runner_tail_is_hue_shifted() {
        let mut pixels = [Color::BLACK; 8];
        let mut runner = Animation::new(PatternKind::RainbowRunner);

        // cursor 0..=2, 8 pixels: head hue = cursor * 32 + phase
        for _ in 0..3 {
            runner.advance(&mut pixels, 100);
        }
        let head = 2 * 32 + 100;
        assert_eq!(pixels[2], Color::wheel(head));
        assert_eq!(pixels[1], Color::wheel(head - 8));
        assert_eq!(pixels[0], Color::wheel(head - 16));
        assert!(pixels[3..].iter().all(|p| *p == Color::BLACK));
    }

    #[test]
    fn rainbow_hue_wraps_around_the_wheel() {
        let mut pixels = [Color::BLACK; 4];
        let mut runner = Animation::new(PatternKind::RainbowRunner);

        runner.advance(&mut pixels, 250);
        runner.advance(&mut pixels, 250);
        // cursor 1 of 4: 64 + 250 = 314 -> 58
        assert_eq!(pixels[1], Color::wheel(58));
        assert_eq!(pixels[0], Color::wheel(50));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(10, 1)]
    #[case(2_550, 255)]
    #[case(2_560, 0)]
    #[case(1_700_000_000_123, 12)]
    fn rainbow_phase_turns_100_steps_per_second(#[case] millis: u64, #[case] expected: u8) {
        assert_eq!(rainbow_phase(Duration::from_millis(millis)), expected);
    }
}
