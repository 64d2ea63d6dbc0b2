//! The per-frame driver tying every deterioration system together.

use engine_core::{Damage, DamageType, Health, Time};
use glam::Vec3;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chance::{FrameChance, DEFAULT_REFERENCE_RATE};
use crate::config::DeteriorationConfig;
use crate::error::{report, DeteriorationError};
use crate::exhaustion::{apply_winded_feedback, ExhaustionMonitor};
use crate::hazard::{HazardEngine, HazardOutcome, HazardTimers};
use crate::host::{find_local_subject, Subject};
use crate::milestones::{Milestone, SeverityState, Tunables};
use crate::presentation::{AudioCue, PostProcessLevels, Presentation};
use crate::session::{RoundOutcome, SessionCounter};
use crate::store::CorruptionStore;
use crate::text_corruption::TextCorruptor;
use crate::time_distortion::TimeDistortion;
use crate::vehicle::{clear_driven_vehicle, update_driven_vehicle, VehicleCorruption};

pub const BASE_MAX_HEALTH: f32 = 100.0;
pub const MIN_MAX_HEALTH: f32 = 10.0;
pub const MAX_HEALTH_LOSS_PER_FAILURE: f32 = 5.0;
/// Movement speed and sprint time are multiplied by this once per failure.
pub const STAT_RETENTION_PER_FAILURE: f32 = 0.97;
pub const INSANITY_PER_FAILURE: f32 = 1.5;
/// Failure count from which intrinsic damage also pulses the visor.
pub const DAMAGE_FEEDBACK_MIN_FAILURES: u32 = 3;

pub fn max_health_for(failure_count: u32) -> f32 {
    (BASE_MAX_HEALTH - MAX_HEALTH_LOSS_PER_FAILURE * failure_count as f32).max(MIN_MAX_HEALTH)
}

/// Tinnitus volume for a visual distortion multiplier.
pub fn tinnitus_target(multiplier: f32) -> f32 {
    (0.1 * (multiplier - 2.0)).clamp(0.0, 1.0) * 0.5
}

/// Subject stats as they were before any deterioration was applied.
#[derive(Debug, Clone, Copy)]
struct SubjectBinding {
    entity: Entity,
    movement_speed: f32,
    sprint_time: f32,
    item_holder: Vec3,
}

/// What happened during one [`DeteriorationEngine::update`].
#[derive(Debug, Clone, Default)]
pub struct FrameSummary {
    /// False when there was no alive, locally controlled subject to deteriorate.
    pub ran: bool,
    pub unlocked: Vec<Milestone>,
    pub hazards: HazardOutcome,
    pub became_winded: bool,
    pub world_text_corrupted: bool,
    pub tooltips_corrupted: bool,
}

/// Owns the failure counter, the milestone state and every per-subject effect.
///
/// The host calls [`update`](Self::update) once per frame for the local subject,
/// [`update_vehicle`](Self::update_vehicle) once per vehicle frame, and forwards
/// deaths, round completions and session teardown.
pub struct DeteriorationEngine {
    session: SessionCounter,
    severity: SeverityState,
    applied_count: Option<u32>,
    binding: Option<SubjectBinding>,
    timers: HazardTimers,
    hazards: HazardEngine,
    exhaustion: ExhaustionMonitor,
    text: TextCorruptor,
    store: CorruptionStore,
    clock: TimeDistortion,
    reference_frame_rate: f64,
    frame_rate_independent: bool,
    rng: StdRng,
}

impl DeteriorationEngine {
    pub fn new(config: &DeteriorationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let reference_frame_rate = if config.reference_frame_rate > 0.0 {
            config.reference_frame_rate
        } else {
            log::warn!(
                "Ignoring non-positive reference frame rate {}, using {}",
                config.reference_frame_rate,
                DEFAULT_REFERENCE_RATE
            );
            DEFAULT_REFERENCE_RATE
        };
        Self {
            session: SessionCounter::new(),
            severity: SeverityState::new(),
            applied_count: None,
            binding: None,
            timers: HazardTimers::default(),
            hazards: HazardEngine::new(),
            exhaustion: ExhaustionMonitor::default(),
            text: TextCorruptor::default(),
            store: CorruptionStore::new(),
            clock: TimeDistortion::default(),
            reference_frame_rate,
            frame_rate_independent: config.frame_rate_independent,
            rng,
        }
    }

    /// Engine with default settings and a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(&DeteriorationConfig { seed: Some(seed), ..Default::default() })
    }

    pub fn failure_count(&self) -> u32 {
        self.session.failure_count()
    }

    pub fn session(&self) -> &SessionCounter {
        &self.session
    }

    pub fn severity(&self) -> &SeverityState {
        &self.severity
    }

    pub fn tunables(&self) -> &Tunables {
        self.severity.tunables()
    }

    pub fn store(&self) -> &CorruptionStore {
        &self.store
    }

    pub fn is_winded(&self) -> bool {
        self.exhaustion.is_winded()
    }

    pub fn clock_offset_minutes(&self) -> i32 {
        self.clock.offset_minutes()
    }

    /// The local subject died.
    pub fn on_subject_death(&mut self) -> u32 {
        self.session.record_death()
    }

    /// A round finished. Returns the reduced failure count if recovery kicked in.
    pub fn on_round_complete(&mut self, outcome: RoundOutcome) -> Option<u32> {
        self.session.record_round(outcome)
    }

    /// Feedback for damage the local subject received from any source.
    pub fn on_subject_damaged(&mut self, damage: Damage, presentation: &mut dyn Presentation) -> bool {
        damage.damage_type == DamageType::Intrinsic
            && self.session.failure_count() >= DAMAGE_FEEDBACK_MIN_FAILURES
            && self.hazards.pulse_visor(presentation)
    }

    /// Run one frame for the locally controlled subject.
    ///
    /// Every sub-step is isolated: a failure is logged and the rest of the frame still runs.
    pub fn update(&mut self, world: &World, presentation: &mut dyn Presentation, time: &Time) -> FrameSummary {
        let mut summary = FrameSummary::default();
        let Some(subject) = find_local_subject(world) else {
            return summary;
        };
        match world.get::<&Subject>(subject) {
            Ok(s) if s.is_active() => {}
            _ => return summary,
        }
        summary.ran = true;
        self.bind(world, subject);

        let failures = self.session.failure_count();
        let dt = time.delta_seconds();
        let chance = self.frame_chance(time);

        report("health cap", enforce_health_cap(world, subject));

        if self.applied_count != Some(failures) {
            report("apply deterioration level", self.apply_level(world, subject, failures));
            summary.unlocked = self.severity.apply_severity(failures);
            self.applied_count = Some(failures);
        }

        if self.severity.is_set(Milestone::Onset) {
            summary.hazards = self.hazards.tick(
                &mut self.timers,
                &self.severity,
                world,
                subject,
                presentation,
                chance,
                dt,
                &mut self.rng,
            );
            if let Some(damage) = summary.hazards.damage {
                self.on_subject_damaged(damage, presentation);
            }
        }

        if self.severity.is_set(Milestone::Severe) {
            report("exhaustion", self.update_exhaustion(world, subject, failures, dt, &mut summary));
        }

        report("visual effects", self.update_visuals(world, subject, presentation, dt));
        report("audio effects", self.update_audio(presentation, dt));
        report("permanent debuffs", self.update_permanent_debuffs(world, subject, failures));

        summary.world_text_corrupted =
            self.text.update_world_text(world, &mut self.store, failures, dt, &mut self.rng);
        summary.tooltips_corrupted =
            self.text.update_tooltips(world, &mut self.store, subject, failures, dt, &mut self.rng);

        if self.severity.is_set(Milestone::Impairment) {
            self.clock.maybe_redraw(failures, chance, &mut self.rng);
            report("time distortion", self.clock.apply(world));
        }

        self.hazards.advance_sequences(dt, presentation, &mut self.rng);
        summary
    }

    /// Rebuild the effective input of the vehicle the local subject drives,
    /// corrupting it once vehicle controls are compromised.
    pub fn update_vehicle(&mut self, world: &World, time: &Time) -> Option<VehicleCorruption> {
        let subject = find_local_subject(world)?;
        if !self.severity.tunables().vehicle_corruption_enabled {
            report("vehicle passthrough", clear_driven_vehicle(world, subject));
            return None;
        }
        let chance = self.frame_chance(time);
        match update_driven_vehicle(world, subject, self.session.failure_count(), chance, &mut self.rng) {
            Ok(corruption) => corruption,
            Err(e) => {
                report("vehicle corruption", Err(e));
                None
            }
        }
    }

    /// Undo everything: cancel running sequences, restore every corrupted text,
    /// the clock and the subject's stats, silence audio, and zero all counters.
    ///
    /// Safe to call repeatedly.
    pub fn reset(&mut self, world: &World, presentation: &mut dyn Presentation) {
        self.hazards.cancel_all(presentation);

        let restored = self.store.restore_all(world);
        self.clock.restore(world);
        if let Some(binding) = self.binding.take() {
            report("restore subject", restore_subject(world, &binding));
        }

        presentation.reset_post_process();
        if let Some(audio) = presentation.audio() {
            audio.stop(AudioCue::Tinnitus);
            audio.set_volume(AudioCue::Tinnitus, 0.0);
            audio.stop(AudioCue::Heartbeat);
        }

        self.exhaustion.reset(&mut self.timers);
        self.timers = HazardTimers::default();
        self.text.reset();
        self.severity.reset();
        self.session.reset();
        self.applied_count = None;
        log::info!("Deterioration reset ({} texts restored)", restored);
    }

    /// Per-frame chance conversion at the configured reference rate.
    pub fn frame_chance(&self, time: &Time) -> FrameChance {
        FrameChance::new(time.delta_seconds(), self.reference_frame_rate, self.frame_rate_independent)
    }

    fn bind(&mut self, world: &World, subject: Entity) {
        if self.binding.is_some_and(|b| b.entity == subject) {
            return;
        }
        if let Ok(s) = world.get::<&Subject>(subject) {
            self.binding = Some(SubjectBinding {
                entity: subject,
                movement_speed: s.movement_speed,
                sprint_time: s.sprint_time,
                item_holder: s.item_holder,
            });
            self.applied_count = None;
            log::debug!("Bound deterioration to subject {:?}", subject);
        }
    }

    fn base(&self) -> Result<SubjectBinding, DeteriorationError> {
        self.binding.ok_or(DeteriorationError::MissingCollaborator("subject binding"))
    }

    fn apply_level(&self, world: &World, subject: Entity, failures: u32) -> Result<(), DeteriorationError> {
        let base = self.base()?;
        let factor = STAT_RETENTION_PER_FAILURE.powi(failures as i32);
        {
            let mut s = world.get::<&mut Subject>(subject)?;
            s.movement_speed = base.movement_speed * factor;
            s.sprint_time = base.sprint_time * factor;
        }
        let max = max_health_for(failures);
        world.get::<&mut Health>(subject)?.set_max(max);
        log::debug!("Deterioration level {} applied (stats x{:.3}, max health {})", failures, factor, max);
        Ok(())
    }

    fn update_exhaustion(
        &mut self,
        world: &World,
        subject: Entity,
        failures: u32,
        dt: f32,
        summary: &mut FrameSummary,
    ) -> Result<(), DeteriorationError> {
        let s = world.get::<&Subject>(subject)?;
        summary.became_winded = self.exhaustion.update(&mut self.timers, &s, failures, dt);
        Ok(())
    }

    fn update_visuals(
        &mut self,
        world: &World,
        subject: Entity,
        presentation: &mut dyn Presentation,
        dt: f32,
    ) -> Result<(), DeteriorationError> {
        let tunables = *self.severity.tunables();
        {
            let mut s = world.get::<&mut Subject>(subject)?;
            if self.exhaustion.is_winded() {
                apply_winded_feedback(&mut s, presentation, dt);
            }
            if tunables.hand_tremor_intensity > 0.0 {
                let base = self.base()?;
                s.item_holder = base.item_holder + random_in_unit_ball(&mut self.rng) * tunables.hand_tremor_intensity;
            }
        }

        let mut levels = PostProcessLevels::from_multiplier(tunables.visual_distortion_multiplier);
        if self.hazards.overriding_chromatic() {
            levels.chromatic_aberration = None;
        }
        presentation.set_post_process(levels);
        Ok(())
    }

    fn update_audio(&self, presentation: &mut dyn Presentation, dt: f32) -> Result<(), DeteriorationError> {
        let tunables = self.severity.tunables();
        if !tunables.tinnitus {
            return Ok(());
        }
        let target = tinnitus_target(tunables.visual_distortion_multiplier);
        let audio = presentation.audio().ok_or(DeteriorationError::MissingCollaborator("audio"))?;
        let current = audio.volume(AudioCue::Tinnitus);
        let t = (2.0 * dt).min(1.0);
        audio.set_volume(AudioCue::Tinnitus, current + (target - current) * t);
        if target > 0.0 && !audio.is_playing(AudioCue::Tinnitus) {
            audio.play(AudioCue::Tinnitus)?;
        }
        Ok(())
    }

    fn update_permanent_debuffs(&self, world: &World, subject: Entity, failures: u32) -> Result<(), DeteriorationError> {
        let tunables = self.severity.tunables();
        let mut s = world.get::<&mut Subject>(subject)?;
        s.insanity = s.insanity.max(INSANITY_PER_FAILURE * failures as f32);
        if tunables.permanent_debuff_level > 0.0 {
            s.drunkness = s.drunkness.max(tunables.permanent_debuff_level);
            s.increasing_drunkness = true;
        }
        if tunables.limp {
            s.limp = true;
        }
        Ok(())
    }
}

fn enforce_health_cap(world: &World, subject: Entity) -> Result<(), DeteriorationError> {
    world.get::<&mut Health>(subject)?.enforce_cap();
    Ok(())
}

fn restore_subject(world: &World, binding: &SubjectBinding) -> Result<(), DeteriorationError> {
    {
        let mut s = world.get::<&mut Subject>(binding.entity)?;
        s.movement_speed = binding.movement_speed;
        s.sprint_time = binding.sprint_time;
        s.item_holder = binding.item_holder;
        s.limp = false;
        s.drunkness = 0.0;
        s.insanity = 0.0;
    }
    world.get::<&mut Health>(binding.entity)?.set_max(BASE_MAX_HEALTH);
    Ok(())
}

fn random_in_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}
