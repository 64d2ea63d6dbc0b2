//! Engine and demo settings. Loaded from deterioration.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DeteriorationError;

pub const CONFIG_FILE: &str = "deterioration.ron";

/// Engine tuning plus the parameters of the headless demo session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeteriorationConfig {
    /// Frame rate at which every per-frame chance is defined.
    #[serde(default = "default_reference_frame_rate")]
    pub reference_frame_rate: f64,
    /// Convert per-frame chances to the actual frame time. When false, each frame
    /// samples the raw chance whatever its length.
    #[serde(default = "default_true")]
    pub frame_rate_independent: bool,
    /// Fixed RNG seed for reproducible runs. Entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub audio: AudioCueConfig,
}

/// Scripted session driven by `deterioration-sim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Simulated seconds per round.
    #[serde(default = "default_round_seconds")]
    pub round_seconds: f32,
    /// Fixed simulation step in seconds.
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,
    /// Chance the subject dies during a round (rolled once per round).
    #[serde(default = "default_death_chance")]
    pub death_chance: f64,
}

/// Sound files for the audio cues. Missing entries play nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioCueConfig {
    #[serde(default)]
    pub tinnitus: Option<PathBuf>,
    #[serde(default)]
    pub heartbeat: Option<PathBuf>,
}

fn default_reference_frame_rate() -> f64 {
    60.0
}
fn default_true() -> bool {
    true
}
fn default_rounds() -> u32 {
    24
}
fn default_round_seconds() -> f32 {
    90.0
}
fn default_fixed_dt() -> f32 {
    1.0 / 60.0
}
fn default_death_chance() -> f64 {
    0.55
}

impl Default for DeteriorationConfig {
    fn default() -> Self {
        Self {
            reference_frame_rate: default_reference_frame_rate(),
            frame_rate_independent: default_true(),
            seed: None,
            demo: DemoConfig::default(),
            audio: AudioCueConfig::default(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            round_seconds: default_round_seconds(),
            fixed_dt: default_fixed_dt(),
            death_chance: default_death_chance(),
        }
    }
}

impl DeteriorationConfig {
    /// Load from `deterioration.ron`. If the file is missing or invalid, returns the defaults.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Load from an explicit path, failing on missing or malformed files.
    pub fn load_from(path: &Path) -> Result<Self, DeteriorationError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_ron(&data)
    }

    pub fn from_ron(data: &str) -> Result<Self, DeteriorationError> {
        Ok(ron::from_str(data)?)
    }

    /// Save to `deterioration.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Err(e) = self.save_to(&path) {
            log::warn!("Could not write config to {:?}: {}", path, e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), DeteriorationError> {
        let data = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// True when `deterioration.ron` exists in the current directory.
    pub fn file_exists() -> bool {
        config_path().exists()
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_struct_uses_defaults() {
        let config = DeteriorationConfig::from_ron("()").unwrap();
        assert_eq!(config, DeteriorationConfig::default());
        assert_eq!(config.reference_frame_rate, 60.0);
        assert!(config.frame_rate_independent);
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = DeteriorationConfig::from_ron(
            "(seed: Some(42), frame_rate_independent: false, demo: (rounds: 3), audio: (tinnitus: Some(\"ring.ogg\")))",
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(!config.frame_rate_independent);
        assert_eq!(config.demo.rounds, 3);
        assert_eq!(config.demo.fixed_dt, default_fixed_dt());
        assert_eq!(config.audio.tinnitus, Some(PathBuf::from("ring.ogg")));
        assert_eq!(config.audio.heartbeat, None);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            DeteriorationConfig::from_ron("(seed: \"nope\")"),
            Err(DeteriorationError::Config(_))
        ));
    }

    #[test]
    fn saved_config_loads_back() {
        let path = std::env::temp_dir().join(format!("deterioration-config-{}.ron", std::process::id()));
        let config = DeteriorationConfig {
            reference_frame_rate: 30.0,
            seed: Some(9),
            demo: DemoConfig { rounds: 5, ..Default::default() },
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = DeteriorationConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DeteriorationConfig::load_from(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, DeteriorationError::Io(_)));
    }
}
