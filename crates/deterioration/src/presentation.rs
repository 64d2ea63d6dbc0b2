//! Presentation-layer collaborator: post-processing, camera shake, HUD and audio.
//!
//! The engine only pushes target values and play/stop signals; it never owns
//! the effects themselves.

use std::collections::HashMap;

use crate::error::DeteriorationError;

/// Named camera-shake magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShakeKind {
    Small,
    Big,
    Long,
}

/// Post-process targets. `None` leaves that effect untouched this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostProcessLevels {
    pub chromatic_aberration: Option<f32>,
    pub film_grain: Option<f32>,
    pub saturation: Option<f32>,
    pub vignette: Option<f32>,
}

impl PostProcessLevels {
    /// Levels for a visual distortion multiplier. Only values that actually
    /// distort (positive intensities, negative saturation) are set.
    pub fn from_multiplier(multiplier: f32) -> Self {
        let chromatic = (0.05 * multiplier).clamp(0.0, 1.0);
        let grain = (0.08 * multiplier).clamp(0.0, 1.0);
        let saturation = (-10.0 * multiplier).clamp(-80.0, 0.0);
        let vignette = (0.1 * (multiplier - 1.0)).clamp(0.0, 1.0);
        Self {
            chromatic_aberration: (chromatic > 0.0).then_some(chromatic),
            film_grain: (grain > 0.0).then_some(grain),
            saturation: (saturation < 0.0).then_some(saturation),
            vignette: (vignette > 0.0).then_some(vignette),
        }
    }
}

/// Audio cues the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// Looping high-pitched ring, ramped in from the critical milestone.
    Tinnitus,
    /// One-shot heartbeat for the severe hallucination.
    Heartbeat,
}

impl AudioCue {
    pub fn name(self) -> &'static str {
        match self {
            AudioCue::Tinnitus => "tinnitus",
            AudioCue::Heartbeat => "heartbeat",
        }
    }

    pub fn looping(self) -> bool {
        matches!(self, AudioCue::Tinnitus)
    }

    /// A cue with no sound behind it is an absent collaborator, not a backend fault.
    pub fn not_loaded(self) -> DeteriorationError {
        DeteriorationError::MissingCollaborator(self.name())
    }
}

pub trait AudioOut {
    fn play(&mut self, cue: AudioCue) -> Result<(), DeteriorationError>;
    fn stop(&mut self, cue: AudioCue);
    fn is_playing(&self, cue: AudioCue) -> bool;
    fn volume(&self, cue: AudioCue) -> f32;
    fn set_volume(&mut self, cue: AudioCue, volume: f32);
    fn set_pitch(&mut self, cue: AudioCue, pitch: f32);
}

impl AudioOut for audio::AudioSystem {
    fn play(&mut self, cue: AudioCue) -> Result<(), DeteriorationError> {
        if !self.has_sound(cue.name()) {
            return Err(cue.not_loaded());
        }
        audio::AudioSystem::play(self, cue.name(), cue.looping())
            .map_err(|e| DeteriorationError::Audio(e.to_string()))
    }

    fn stop(&mut self, cue: AudioCue) {
        audio::AudioSystem::stop(self, cue.name());
    }

    fn is_playing(&self, cue: AudioCue) -> bool {
        audio::AudioSystem::is_playing(self, cue.name())
    }

    fn volume(&self, cue: AudioCue) -> f32 {
        audio::AudioSystem::volume(self, cue.name()) as f32
    }

    fn set_volume(&mut self, cue: AudioCue, volume: f32) {
        audio::AudioSystem::set_volume(self, cue.name(), f64::from(volume));
    }

    fn set_pitch(&mut self, cue: AudioCue, pitch: f32) {
        audio::AudioSystem::set_pitch(self, cue.name(), f64::from(pitch));
    }
}

/// Everything the engine pushes to the screen and speakers.
///
/// Getters return `None` when the underlying effect or widget does not exist;
/// callers skip the affected step.
pub trait Presentation {
    fn set_post_process(&mut self, levels: PostProcessLevels);
    /// Zero and disable every post-process effect.
    fn reset_post_process(&mut self);
    fn chromatic_aberration(&self) -> Option<f32>;
    fn override_chromatic_aberration(&mut self, intensity: f32);
    fn shake_camera(&mut self, kind: ShakeKind);
    /// Weight of the full-screen flash filter (0 = off).
    fn set_flash_weight(&mut self, weight: f32);
    /// Alpha of the inventory/player-info HUD groups.
    fn hud_alpha(&self) -> Option<f32>;
    fn set_hud_alpha(&mut self, alpha: f32);
    fn audio(&mut self) -> Option<&mut dyn AudioOut>;
}

/// Audio output that plays nothing and remembers everything.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    playing: HashMap<AudioCue, bool>,
    volumes: HashMap<AudioCue, f32>,
    pitches: HashMap<AudioCue, f32>,
    /// Every play request, in order.
    pub plays: Vec<AudioCue>,
    /// Cues that behave as if no sound was loaded for them.
    pub unloaded: Vec<AudioCue>,
}

impl RecordingAudio {
    pub fn pitch(&self, cue: AudioCue) -> Option<f32> {
        self.pitches.get(&cue).copied()
    }
}

impl AudioOut for RecordingAudio {
    fn play(&mut self, cue: AudioCue) -> Result<(), DeteriorationError> {
        if self.unloaded.contains(&cue) {
            return Err(cue.not_loaded());
        }
        self.plays.push(cue);
        self.playing.insert(cue, true);
        Ok(())
    }

    fn stop(&mut self, cue: AudioCue) {
        self.playing.insert(cue, false);
    }

    fn is_playing(&self, cue: AudioCue) -> bool {
        self.playing.get(&cue).copied().unwrap_or(false)
    }

    fn volume(&self, cue: AudioCue) -> f32 {
        self.volumes.get(&cue).copied().unwrap_or(0.0)
    }

    fn set_volume(&mut self, cue: AudioCue, volume: f32) {
        self.volumes.insert(cue, volume);
    }

    fn set_pitch(&mut self, cue: AudioCue, pitch: f32) {
        self.pitches.insert(cue, pitch);
    }
}

/// Headless presentation used by the simulation binary and tests.
#[derive(Debug, Clone)]
pub struct RecordingPresentation {
    /// Last applied levels, merged field by field.
    pub post_process: PostProcessLevels,
    pub post_process_resets: u32,
    pub shakes: Vec<ShakeKind>,
    pub flash_weight: f32,
    /// `None` simulates a missing HUD.
    pub hud: Option<f32>,
    pub audio: Option<RecordingAudio>,
}

impl Default for RecordingPresentation {
    fn default() -> Self {
        Self {
            post_process: PostProcessLevels::default(),
            post_process_resets: 0,
            shakes: Vec::new(),
            flash_weight: 0.0,
            hud: Some(1.0),
            audio: Some(RecordingAudio::default()),
        }
    }
}

impl RecordingPresentation {
    /// A presentation with no HUD and no audio device.
    pub fn bare() -> Self {
        Self {
            hud: None,
            audio: None,
            ..Self::default()
        }
    }
}

impl Presentation for RecordingPresentation {
    fn set_post_process(&mut self, levels: PostProcessLevels) {
        let current = &mut self.post_process;
        current.chromatic_aberration = levels.chromatic_aberration.or(current.chromatic_aberration);
        current.film_grain = levels.film_grain.or(current.film_grain);
        current.saturation = levels.saturation.or(current.saturation);
        current.vignette = levels.vignette.or(current.vignette);
    }

    fn reset_post_process(&mut self) {
        self.post_process = PostProcessLevels::default();
        self.post_process_resets += 1;
    }

    fn chromatic_aberration(&self) -> Option<f32> {
        Some(self.post_process.chromatic_aberration.unwrap_or(0.0))
    }

    fn override_chromatic_aberration(&mut self, intensity: f32) {
        self.post_process.chromatic_aberration = Some(intensity);
    }

    fn shake_camera(&mut self, kind: ShakeKind) {
        self.shakes.push(kind);
    }

    fn set_flash_weight(&mut self, weight: f32) {
        self.flash_weight = weight;
    }

    fn hud_alpha(&self) -> Option<f32> {
        self.hud
    }

    fn set_hud_alpha(&mut self, alpha: f32) {
        if let Some(hud) = self.hud.as_mut() {
            *hud = alpha;
        }
    }

    fn audio(&mut self) -> Option<&mut dyn AudioOut> {
        self.audio.as_mut().map(|a| a as &mut dyn AudioOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_multiplier_has_no_vignette() {
        let levels = PostProcessLevels::from_multiplier(1.0);
        assert_eq!(levels.vignette, None);
        assert!((levels.chromatic_aberration.unwrap() - 0.05).abs() < 1e-6);
        assert!((levels.saturation.unwrap() + 10.0).abs() < 1e-6);
    }

    #[test]
    fn terminal_multiplier_clamps_saturation() {
        let levels = PostProcessLevels::from_multiplier(8.0);
        assert_eq!(levels.saturation, Some(-80.0));
        assert!((levels.film_grain.unwrap() - 0.64).abs() < 1e-5);
        assert!((levels.vignette.unwrap() - 0.7).abs() < 1e-5);
    }

    #[test]
    fn zero_multiplier_sets_nothing() {
        assert_eq!(PostProcessLevels::from_multiplier(0.0), PostProcessLevels::default());
    }

    #[test]
    fn bare_presentation_has_no_hud_or_audio() {
        let mut p = RecordingPresentation::bare();
        assert!(p.hud_alpha().is_none());
        p.set_hud_alpha(0.0);
        assert!(p.hud_alpha().is_none());
        assert!(p.audio().is_none());
    }
}
