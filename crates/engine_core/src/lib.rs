//! Core engine types shared by the deterioration workspace.
//!
//! This crate provides the foundational types used across all members:
//! - Frame time management (real-time and fixed-step headless driving)
//! - Common component types for the host ECS world

pub mod components;
pub mod time;

pub use components::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{Vec2, Vec3};
pub use hecs::{Entity, World};
