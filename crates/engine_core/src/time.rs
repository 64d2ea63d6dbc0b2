//! Time management for the frame loop.

use std::time::{Duration, Instant};

/// Manages frame timing and delta time calculation.
///
/// A host with a real clock calls [`Time::update`] once per frame. Headless
/// drivers (tests, the simulation binary) step time explicitly with
/// [`Time::advance`] so runs are reproducible.
#[derive(Debug)]
pub struct Time {
    /// Time of the last real-clock frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Update timing from the wall clock at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.step(delta);
    }

    /// Step time by a fixed amount (seconds) without consulting the wall clock.
    pub fn advance(&mut self, seconds: f32) {
        self.step(Duration::from_secs_f32(seconds.max(0.0)));
    }

    fn step(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (averaged over last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}
