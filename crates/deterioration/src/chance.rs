//! Per-frame chance rolls that keep their expected rate at any frame rate.
//!
//! Every chance in the engine is written as a probability per *reference*
//! frame at a configured reference rate (60 Hz by default). A frame that lasts `k` reference frames accepts
//! with `1 - (1 - p)^k`, which is exactly `p` at the reference rate and keeps
//! the expected events per second constant at any other rate.

use rand::Rng;

pub const DEFAULT_REFERENCE_RATE: f64 = 60.0;

#[derive(Debug, Clone, Copy)]
pub struct FrameChance {
    /// Length of the current frame in reference frames.
    reference_frames: f64,
    frame_rate_independent: bool,
}

impl FrameChance {
    /// Chance for a frame of `dt` seconds, with per-frame probabilities defined
    /// at `reference_rate` Hz.
    pub fn new(dt: f32, reference_rate: f64, frame_rate_independent: bool) -> Self {
        Self {
            reference_frames: f64::from(dt.max(0.0)) * reference_rate.max(0.0),
            frame_rate_independent,
        }
    }

    /// A frame exactly one reference frame long.
    pub fn reference_frame() -> Self {
        Self {
            reference_frames: 1.0,
            frame_rate_independent: true,
        }
    }

    /// Probability that an event with per-reference-frame probability `per_frame`
    /// happens during this frame.
    pub fn probability(&self, per_frame: f64) -> f64 {
        let p = if per_frame.is_nan() { 0.0 } else { per_frame.clamp(0.0, 1.0) };
        if !self.frame_rate_independent || p >= 1.0 {
            return p;
        }
        let frames = self.reference_frames.max(0.0);
        (1.0 - (1.0 - p).powf(frames)).clamp(0.0, 1.0)
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, per_frame: f64) -> bool {
        rng.gen_bool(self.probability(per_frame))
    }

    /// "1 in `denominator`" per reference frame.
    pub fn one_in<R: Rng + ?Sized>(&self, rng: &mut R, denominator: u32) -> bool {
        if denominator == 0 {
            return false;
        }
        self.roll(rng, 1.0 / f64::from(denominator))
    }

    /// `percent`% per reference frame.
    pub fn percent<R: Rng + ?Sized>(&self, rng: &mut R, percent: f64) -> bool {
        self.roll(rng, percent / 100.0)
    }
}
