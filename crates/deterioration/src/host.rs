//! Host world components the engine reads and mutates.
//!
//! The host simulation lives in a `hecs::World`. Every piece of content the
//! engine touches is addressed by its `Entity`, which stays valid (and is never
//! reused while alive) across frames, so it doubles as the corruption-store key.

use engine_core::{Damage, Health};
use glam::Vec3;
use hecs::{Entity, World};

/// A scannable world label (header text shown when scanned).
#[derive(Debug, Clone)]
pub struct WorldLabel {
    pub header: String,
}

/// A free-standing UI or world text element.
#[derive(Debug, Clone)]
pub struct TextElement {
    pub name: String,
    pub text: String,
}

impl TextElement {
    /// Heuristic for poster/advert/sign text: long enough, and either named
    /// like signage or carrying advertising vocabulary.
    pub fn is_signage(&self) -> bool {
        if self.text.chars().count() <= 10 {
            return false;
        }
        let name = self.name.to_lowercase();
        name.contains("ad")
            || name.contains("poster")
            || name.contains("sign")
            || self.text.contains("Company")
            || self.text.contains("Buy")
            || self.text.contains("Sale")
    }
}

/// Item definition shared by every instance of an item.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub name: String,
    pub tooltips: Vec<String>,
}

impl ItemDef {
    pub fn new(name: impl Into<String>, tooltips: &[&str]) -> Self {
        Self {
            name: name.into(),
            tooltips: tooltips.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Items the subject is carrying (entities holding an [`ItemDef`]).
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub slots: Vec<Option<Entity>>,
}

/// The controlled player entity's mutable stats.
#[derive(Debug, Clone)]
pub struct Subject {
    pub movement_speed: f32,
    /// Seconds of sprint the stamina pool allows.
    pub sprint_time: f32,
    /// Impairment level (0..1), drives wobbly movement and camera sway.
    pub drunkness: f32,
    /// Set when something raised drunkness this frame so the host does not decay it.
    pub increasing_drunkness: bool,
    pub insanity: f32,
    pub limp: bool,
    /// Local position of the held-item anchor.
    pub item_holder: Vec3,
    pub is_sprinting: bool,
    /// Remaining sprint resource (0..1).
    pub sprint_meter: f32,
    pub alive: bool,
    pub locally_controlled: bool,
    /// True while the subject is in the enter/drive animation of a vehicle.
    pub in_vehicle_animation: bool,
}

impl Subject {
    pub fn new(movement_speed: f32, sprint_time: f32) -> Self {
        Self {
            movement_speed,
            sprint_time,
            drunkness: 0.0,
            increasing_drunkness: false,
            insanity: 0.0,
            limp: false,
            item_holder: Vec3::ZERO,
            is_sprinting: false,
            sprint_meter: 1.0,
            alive: true,
            locally_controlled: true,
            in_vehicle_animation: false,
        }
    }

    /// Only an alive, locally controlled subject is deteriorated.
    pub fn is_active(&self) -> bool {
        self.alive && self.locally_controlled
    }

    /// Sprinting with stamina left to spend.
    pub fn is_exerting(&self) -> bool {
        self.is_sprinting && self.sprint_meter > 0.0
    }
}

/// Damage events received this frame, in order. The host drains it.
#[derive(Debug, Clone, Default)]
pub struct DamageLog {
    pub events: Vec<Damage>,
}

/// One frame of vehicle control input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleInput {
    /// -1.0 (full left) to 1.0 (full right).
    pub steering: f32,
    pub throttle: bool,
    pub brake: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Vehicle {
    pub driver: Option<Entity>,
    /// What the driver actually pressed this frame. Written by the host.
    pub input: VehicleInput,
    /// What the vehicle acts on this frame. Rebuilt from `input` every frame.
    pub effective: VehicleInput,
    /// Current speed in m/s.
    pub speed: f32,
}

/// The HUD time display.
#[derive(Debug, Clone)]
pub struct HudClock {
    pub text: String,
}

/// Spawn a locally controlled subject with full health and an empty inventory.
pub fn spawn_subject(world: &mut World, movement_speed: f32, sprint_time: f32) -> Entity {
    world.spawn((
        Subject::new(movement_speed, sprint_time),
        Health::new(crate::engine::BASE_MAX_HEALTH),
        Inventory::default(),
        DamageLog::default(),
    ))
}

/// The locally controlled subject, if any.
pub fn find_local_subject(world: &World) -> Option<Entity> {
    world
        .query::<&Subject>()
        .iter()
        .find(|(_, subject)| subject.locally_controlled)
        .map(|(entity, _)| entity)
}

/// The vehicle the given entity is driving, if any.
pub fn vehicle_driven_by(world: &World, driver: Entity) -> Option<Entity> {
    world
        .query::<&Vehicle>()
        .iter()
        .find(|(_, vehicle)| vehicle.driver == Some(driver))
        .map(|(entity, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signage_heuristic() {
        let poster = TextElement { name: "Poster_Left".into(), text: "Work hard, rest later".into() };
        let sale = TextElement { name: "Label".into(), text: "Big Sale this week only".into() };
        let short = TextElement { name: "sign".into(), text: "EXIT".into() };
        let plain = TextElement { name: "Label".into(), text: "Just some long words here".into() };
        assert!(poster.is_signage());
        assert!(sale.is_signage());
        assert!(!short.is_signage());
        assert!(!plain.is_signage());
    }

    #[test]
    fn finds_local_subject_and_vehicle() {
        let mut world = World::new();
        let mut remote = Subject::new(4.0, 10.0);
        remote.locally_controlled = false;
        world.spawn((remote,));
        let local = spawn_subject(&mut world, 4.6, 11.0);
        let car = world.spawn((Vehicle { driver: Some(local), ..Default::default() },));
        world.spawn((Vehicle::default(),));

        assert_eq!(find_local_subject(&world), Some(local));
        assert_eq!(vehicle_driven_by(&world, local), Some(car));
    }
}
