//! Error taxonomy for per-frame deterioration steps.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeteriorationError {
    /// A collaborator the step needs (HUD, audio, post-process volume) is absent.
    #[error("collaborator unavailable: {0}")]
    MissingCollaborator(&'static str),
    #[error("entity no longer exists")]
    MissingEntity(#[from] hecs::NoSuchEntity),
    #[error("component lookup failed: {0}")]
    Component(#[from] hecs::ComponentError),
    #[error("unrecognized clock text {0:?}")]
    ClockFormat(String),
    #[error("audio backend error: {0}")]
    Audio(String),
    #[error("invalid config: {0}")]
    Config(#[from] ron::error::SpannedError),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeteriorationError {
    /// Environment-lookup failures skip a sub-step silently; everything else is worth an error log.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingCollaborator(_) | Self::MissingEntity(_) | Self::Component(_)
        )
    }
}

/// Log a failed sub-step at a level matching its kind. The frame continues either way.
pub(crate) fn report(step: &str, result: Result<(), DeteriorationError>) {
    if let Err(e) = result {
        if e.is_lookup_failure() {
            log::debug!("Skipping deterioration step '{}': {}", step, e);
        } else {
            log::error!("Deterioration step '{}' failed: {}", step, e);
        }
    }
}
