//! Short timed effect sequences, advanced once per frame.
//!
//! Each sequence runs at most once at a time: triggering while active is
//! ignored. `cancel` stops a run immediately and puts back whatever it changed.

use rand::Rng;

use crate::presentation::{AudioCue, Presentation, ShakeKind};

pub const VISOR_FLASH_WEIGHT: f32 = 0.6;
pub const VISOR_PULSE_SECONDS: f32 = 0.15;

/// Cough/visor impact: a brief flash plus a small shake.
#[derive(Debug, Clone, Default)]
pub struct VisorPulse {
    remaining: Option<f32>,
}

impl VisorPulse {
    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    pub fn trigger(&mut self, presentation: &mut dyn Presentation) -> bool {
        if self.is_active() {
            return false;
        }
        presentation.set_flash_weight(VISOR_FLASH_WEIGHT);
        presentation.shake_camera(ShakeKind::Small);
        self.remaining = Some(VISOR_PULSE_SECONDS);
        true
    }

    pub fn advance(&mut self, dt: f32, presentation: &mut dyn Presentation) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.cancel(presentation);
            }
        }
    }

    pub fn cancel(&mut self, presentation: &mut dyn Presentation) {
        if self.remaining.take().is_some() {
            presentation.set_flash_weight(0.0);
        }
    }
}

#[derive(Debug, Clone)]
struct FlickerRun {
    elapsed: f32,
    duration: f32,
    interval: f32,
    until_next_step: f32,
    original_alpha: f32,
}

/// HUD hallucination: the inventory and player-info panels blink in and out.
#[derive(Debug, Clone, Default)]
pub struct UiFlicker {
    run: Option<FlickerRun>,
}

impl UiFlicker {
    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// Start flickering. Longer and faster when `terminal`. Does nothing without a HUD.
    pub fn trigger<R: Rng + ?Sized>(
        &mut self,
        terminal: bool,
        presentation: &mut dyn Presentation,
        rng: &mut R,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(original_alpha) = presentation.hud_alpha() else {
            log::debug!("HUD unavailable, UI flicker skipped");
            return false;
        };
        let (duration, interval) = if terminal { (2.5, 0.02) } else { (1.25, 0.04) };
        self.run = Some(FlickerRun {
            elapsed: 0.0,
            duration,
            interval,
            until_next_step: interval,
            original_alpha,
        });
        Self::step(presentation, rng);
        true
    }

    /// Visible two times out of three.
    fn step<R: Rng + ?Sized>(presentation: &mut dyn Presentation, rng: &mut R) {
        let alpha = if rng.gen_range(0..3) > 0 { 1.0 } else { 0.0 };
        presentation.set_hud_alpha(alpha);
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, presentation: &mut dyn Presentation, rng: &mut R) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.elapsed += dt;
        if run.elapsed >= run.duration {
            self.cancel(presentation);
            return;
        }
        run.until_next_step -= dt;
        while run.until_next_step <= 0.0 {
            run.until_next_step += run.interval;
            Self::step(presentation, rng);
        }
    }

    pub fn cancel(&mut self, presentation: &mut dyn Presentation) {
        if let Some(run) = self.run.take() {
            presentation.set_hud_alpha(run.original_alpha);
        }
    }
}

pub const HEARTBEAT_PITCH: f32 = 0.7;
pub const HEARTBEAT_DISTORTION_SECONDS: f32 = 0.5;
pub const HEARTBEAT_TAIL_SECONDS: f32 = 1.5;

#[derive(Debug, Clone)]
struct HeartbeatRun {
    elapsed: f32,
    duration: f32,
    /// Chromatic aberration to put back once the distortion pulse ends.
    saved_chromatic: Option<f32>,
}

/// Severe hallucination: long shake, low heartbeat, a burst of full chromatic aberration.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatHallucination {
    run: Option<HeartbeatRun>,
}

impl HeartbeatHallucination {
    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// True while the chromatic aberration override is in force.
    pub fn is_distorting(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.saved_chromatic.is_some())
    }

    pub fn trigger(&mut self, presentation: &mut dyn Presentation) -> bool {
        if self.is_active() {
            return false;
        }
        presentation.shake_camera(ShakeKind::Long);
        if let Some(audio) = presentation.audio() {
            audio.set_pitch(AudioCue::Heartbeat, HEARTBEAT_PITCH);
            if let Err(e) = audio.play(AudioCue::Heartbeat) {
                log::debug!("Heartbeat cue not played: {}", e);
            }
        }
        let saved_chromatic = presentation.chromatic_aberration();
        let duration = match saved_chromatic {
            Some(_) => {
                presentation.override_chromatic_aberration(1.0);
                HEARTBEAT_DISTORTION_SECONDS + HEARTBEAT_TAIL_SECONDS
            }
            None => HEARTBEAT_TAIL_SECONDS,
        };
        self.run = Some(HeartbeatRun { elapsed: 0.0, duration, saved_chromatic });
        true
    }

    pub fn advance(&mut self, dt: f32, presentation: &mut dyn Presentation) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.elapsed += dt;
        if run.elapsed >= HEARTBEAT_DISTORTION_SECONDS {
            if let Some(original) = run.saved_chromatic.take() {
                presentation.override_chromatic_aberration(original);
            }
        }
        if run.elapsed >= run.duration {
            self.run = None;
        }
    }

    pub fn cancel(&mut self, presentation: &mut dyn Presentation) {
        if let Some(run) = self.run.take() {
            if let Some(original) = run.saved_chromatic {
                presentation.override_chromatic_aberration(original);
            }
            if let Some(audio) = presentation.audio() {
                audio.stop(AudioCue::Heartbeat);
            }
        }
    }
}
