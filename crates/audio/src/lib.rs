//! Audio system using Kira for named 2D cues (loops and one-shots).

use anyhow::{anyhow, Result};
use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
    sound::PlaybackState,
    tween::Tween,
};
use std::collections::HashMap;
use std::path::Path;

/// A cue that is currently (or was last) playing, with the parameters we set on it.
struct ActiveCue {
    handle: StaticSoundHandle,
    volume: f64,
}

/// Main audio system managing loaded sounds and one handle per named cue.
pub struct AudioSystem {
    manager: AudioManager,
    sounds: HashMap<String, StaticSoundData>,
    cues: HashMap<String, ActiveCue>,
    /// Volume/pitch requested before a cue started; applied when it plays.
    pending_volume: HashMap<String, f64>,
    pending_pitch: HashMap<String, f64>,
}

impl AudioSystem {
    /// Create a new audio system on the default output device.
    pub fn new() -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;
        Ok(Self {
            manager,
            sounds: HashMap::new(),
            cues: HashMap::new(),
            pending_volume: HashMap::new(),
            pending_pitch: HashMap::new(),
        })
    }

    /// Load a sound from a file.
    pub fn load_sound(&mut self, name: &str, path: &Path) -> Result<()> {
        let sound_data = StaticSoundData::from_file(path)?;
        self.sounds.insert(name.to_string(), sound_data);
        log::info!("Loaded audio cue '{}' from {:?}", name, path);
        Ok(())
    }

    /// True if a sound was loaded under this name.
    pub fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains_key(name)
    }

    /// Start a cue. Looping cues repeat until [`AudioSystem::stop`] is called.
    /// Restarting a cue that is already playing replaces its handle.
    pub fn play(&mut self, name: &str, looping: bool) -> Result<()> {
        let sound_data = self
            .sounds
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("audio cue '{}' is not loaded", name))?;
        let volume = self.pending_volume.get(name).copied().unwrap_or(1.0);
        let pitch = self.pending_pitch.get(name).copied().unwrap_or(1.0);
        let mut settings = StaticSoundSettings::new().volume(volume).playback_rate(pitch);
        if looping {
            settings = settings.loop_region(0.0..);
        }
        let handle = self.manager.play(sound_data.with_settings(settings))?;
        if let Some(mut old) = self.cues.insert(name.to_string(), ActiveCue { handle, volume }) {
            let _ = old.handle.stop(Tween::default());
        }
        Ok(())
    }

    /// Stop a cue if it is playing.
    pub fn stop(&mut self, name: &str) {
        if let Some(mut cue) = self.cues.remove(name) {
            let _ = cue.handle.stop(Tween::default());
        }
    }

    /// True while the cue's handle has not reached the stopped state.
    pub fn is_playing(&self, name: &str) -> bool {
        self.cues
            .get(name)
            .map(|cue| cue.handle.state() != PlaybackState::Stopped)
            .unwrap_or(false)
    }

    /// Last volume set on a cue (0.0 if it never played).
    pub fn volume(&self, name: &str) -> f64 {
        self.cues
            .get(name)
            .map(|cue| cue.volume)
            .or_else(|| self.pending_volume.get(name).copied())
            .unwrap_or(0.0)
    }

    /// Set cue volume (amplitude, 0.0 to 1.0).
    pub fn set_volume(&mut self, name: &str, volume: f64) {
        self.pending_volume.insert(name.to_string(), volume);
        if let Some(cue) = self.cues.get_mut(name) {
            cue.volume = volume;
            let _ = cue.handle.set_volume(volume, Tween::default());
        }
    }

    /// Set cue playback rate (1.0 = normal pitch).
    pub fn set_pitch(&mut self, name: &str, pitch: f64) {
        self.pending_pitch.insert(name.to_string(), pitch);
        if let Some(cue) = self.cues.get_mut(name) {
            let _ = cue.handle.set_playback_rate(pitch, Tween::default());
        }
    }

    /// Drop handles of cues that finished on their own.
    pub fn cleanup(&mut self) {
        self.cues
            .retain(|_, cue| cue.handle.state() != PlaybackState::Stopped);
    }

    /// Stop all sounds.
    pub fn stop_all(&mut self) {
        for cue in self.cues.values_mut() {
            let _ = cue.handle.stop(Tween::default());
        }
        self.cues.clear();
    }
}

// Re-export for convenience
pub use kira;
