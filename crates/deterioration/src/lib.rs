//! Milestone-driven deterioration for a game subject.
//!
//! Each death of the locally controlled subject raises a failure count. As the
//! count crosses fixed thresholds the engine unlocks sticky milestones that
//! degrade the subject's stats, distort the screen and audio, corrupt world and
//! UI text, skew the HUD clock and, at the top, sabotage vehicle controls.
//! Surviving rounds slowly takes failures back; a session reset undoes it all.
//!
//! The host owns a `hecs::World` (see [`host`]) and a [`Presentation`]
//! implementation, and drives a [`DeteriorationEngine`] once per frame.

pub mod chance;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod exhaustion;
pub mod hazard;
pub mod host;
pub mod milestones;
pub mod presentation;
pub mod sequences;
pub mod session;
pub mod store;
pub mod text_corruption;
pub mod time_distortion;
pub mod vehicle;

pub use config::DeteriorationConfig;
pub use engine::{DeteriorationEngine, FrameSummary};
pub use error::DeteriorationError;
pub use milestones::{Milestone, MilestoneFlags, SeverityState, Tunables};
pub use presentation::{AudioCue, AudioOut, PostProcessLevels, Presentation, RecordingPresentation, ShakeKind};
pub use session::{RoundOutcome, SessionCounter};
