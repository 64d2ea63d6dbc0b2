//! Per-frame hazard evaluation: intrinsic damage, cough/visor pulses and hallucinations.

use engine_core::{Damage, Health};
use hecs::{Entity, World};
use rand::Rng;

use crate::chance::FrameChance;
use crate::error::{report, DeteriorationError};
use crate::host::DamageLog;
use crate::milestones::{Milestone, SeverityState};
use crate::presentation::Presentation;
use crate::sequences::{HeartbeatHallucination, UiFlicker, VisorPulse};

pub const MINOR_EVENT_CHANCE: u32 = 7500;
pub const HALLUCINATION_CHANCE: u32 = 10_000;
pub const HEARTBEAT_HALLUCINATION_CHANCE: u32 = 15_000;
pub const HALLUCINATION_COOLDOWN: f32 = 20.0;

/// Countdown timers that gate one-shot events. All decay toward zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HazardTimers {
    pub hallucination_cooldown: f32,
    pub winded_timer: f32,
    pub sprint_duration: f32,
}

/// What a single hazard tick triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HazardOutcome {
    pub damage: Option<Damage>,
    pub minor_event: bool,
    pub hallucination: bool,
    pub severe_hallucination: bool,
}

/// Timed sequences the hazard trials start, owned per subject.
#[derive(Debug, Clone, Default)]
pub struct HazardEngine {
    pub(crate) visor: VisorPulse,
    pub(crate) flicker: UiFlicker,
    pub(crate) heartbeat: HeartbeatHallucination,
}

impl HazardEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flicker_active(&self) -> bool {
        self.flicker.is_active()
    }

    pub fn heartbeat_active(&self) -> bool {
        self.heartbeat.is_active()
    }

    /// True while the severe hallucination owns chromatic aberration.
    pub fn overriding_chromatic(&self) -> bool {
        self.heartbeat.is_distorting()
    }

    /// Run one frame of hazard trials. Callers only tick once the first milestone is reached.
    ///
    /// The trials are independent: a failure in one is logged and the rest still run.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        timers: &mut HazardTimers,
        severity: &SeverityState,
        world: &World,
        subject: Entity,
        presentation: &mut dyn Presentation,
        chance: FrameChance,
        dt: f32,
        rng: &mut R,
    ) -> HazardOutcome {
        let mut outcome = HazardOutcome::default();
        let tunables = severity.tunables();

        if timers.hallucination_cooldown > 0.0 {
            timers.hallucination_cooldown = (timers.hallucination_cooldown - dt).max(0.0);
        }

        if chance.one_in(rng, tunables.tick_chance_denominator) {
            let damage = Damage::intrinsic(tunables.damage_per_tick as f32);
            let result = apply_damage(world, subject, damage);
            if result.is_ok() {
                log::debug!("Intrinsic damage tick: {}", damage.amount);
                outcome.damage = Some(damage);
            }
            report("damage tick", result);
        }

        if chance.one_in(rng, MINOR_EVENT_CHANCE) {
            outcome.minor_event = self.visor.trigger(presentation);
        }

        if severity.is_set(Milestone::Severe)
            && timers.hallucination_cooldown <= 0.0
            && chance.one_in(rng, HALLUCINATION_CHANCE)
        {
            timers.hallucination_cooldown = HALLUCINATION_COOLDOWN;
            let terminal = severity.is_set(Milestone::Terminal);
            outcome.hallucination = self.flicker.trigger(terminal, presentation, rng);
            log::debug!("UI hallucination triggered (started: {})", outcome.hallucination);
        }

        if severity.is_set(Milestone::Terminal)
            && timers.hallucination_cooldown <= 0.0
            && chance.one_in(rng, HEARTBEAT_HALLUCINATION_CHANCE)
        {
            timers.hallucination_cooldown = HALLUCINATION_COOLDOWN;
            outcome.severe_hallucination = self.heartbeat.trigger(presentation);
            log::debug!("Severe hallucination triggered (started: {})", outcome.severe_hallucination);
        }

        outcome
    }

    /// Request a visor pulse outside the random trial (damage feedback).
    pub fn pulse_visor(&mut self, presentation: &mut dyn Presentation) -> bool {
        self.visor.trigger(presentation)
    }

    /// Advance every running sequence by one frame.
    pub fn advance_sequences<R: Rng + ?Sized>(&mut self, dt: f32, presentation: &mut dyn Presentation, rng: &mut R) {
        self.visor.advance(dt, presentation);
        self.flicker.advance(dt, presentation, rng);
        self.heartbeat.advance(dt, presentation);
    }

    /// Stop every running sequence and undo what it changed.
    pub fn cancel_all(&mut self, presentation: &mut dyn Presentation) {
        self.visor.cancel(presentation);
        self.flicker.cancel(presentation);
        self.heartbeat.cancel(presentation);
    }
}

/// Apply damage to an entity's health and record it in its damage log, if it has one.
pub fn apply_damage(world: &World, target: Entity, damage: Damage) -> Result<(), DeteriorationError> {
    world.get::<&mut Health>(target)?.take_damage(damage.amount);
    if let Ok(mut log) = world.get::<&mut DamageLog>(target) {
        log.events.push(damage);
    }
    Ok(())
}
