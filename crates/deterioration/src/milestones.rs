//! Severity ladder: five sticky milestones unlocked by the failure count.

use std::fmt;

/// One of the five ordered severity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Milestone {
    /// Deterioration begins.
    Onset,
    /// Physical impairment.
    Impairment,
    /// Severe symptoms.
    Severe,
    /// Critical: vehicle controls compromised.
    Critical,
    /// Terminal stage.
    Terminal,
}

impl Milestone {
    pub const ALL: [Milestone; 5] = [
        Milestone::Onset,
        Milestone::Impairment,
        Milestone::Severe,
        Milestone::Critical,
        Milestone::Terminal,
    ];

    /// Failure count at which this milestone unlocks.
    pub fn threshold(self) -> u32 {
        match self {
            Milestone::Onset => 2,
            Milestone::Impairment => 5,
            Milestone::Severe => 7,
            Milestone::Critical => 8,
            Milestone::Terminal => 9,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Milestone::Onset => "initial deterioration begins",
            Milestone::Impairment => "physical impairment activated",
            Milestone::Severe => "severe symptoms manifest",
            Milestone::Critical => "critical deterioration, vehicle controls compromised",
            Milestone::Terminal => "terminal stage",
        };
        write!(f, "milestone {} ({})", self.index() + 1, label)
    }
}

/// Which milestones have been reached this session. Flags only go false -> true;
/// [`MilestoneFlags::clear`] is the single way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MilestoneFlags([bool; 5]);

impl MilestoneFlags {
    pub fn is_set(&self, milestone: Milestone) -> bool {
        self.0[milestone.index()]
    }

    /// Set a flag. Returns true if it was newly set.
    fn set(&mut self, milestone: Milestone) -> bool {
        let slot = &mut self.0[milestone.index()];
        let newly = !*slot;
        *slot = true;
        newly
    }

    /// Highest milestone reached.
    pub fn highest(&self) -> Option<Milestone> {
        Milestone::ALL.iter().rev().copied().find(|m| self.is_set(*m))
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|f| **f).count()
    }

    pub fn clear(&mut self) {
        self.0 = [false; 5];
    }
}

pub const BASE_DAMAGE_PER_TICK: u32 = 2;
pub const BASE_TICK_CHANCE: u32 = 9000;

/// Intensity and probability parameters consumed by the other components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub visual_distortion_multiplier: f32,
    /// Floor applied to the subject's drunkness every frame.
    pub permanent_debuff_level: f32,
    pub damage_per_tick: u32,
    /// Hazard damage fires with probability 1/this per reference frame.
    pub tick_chance_denominator: u32,
    pub hand_tremor_intensity: f32,
    pub limp: bool,
    pub hallucinations: bool,
    pub vehicle_corruption_enabled: bool,
    pub tinnitus: bool,
    pub severe_hallucinations: bool,
}

impl Tunables {
    pub const BASELINE: Tunables = Tunables {
        visual_distortion_multiplier: 1.0,
        permanent_debuff_level: 0.0,
        damage_per_tick: BASE_DAMAGE_PER_TICK,
        tick_chance_denominator: BASE_TICK_CHANCE,
        hand_tremor_intensity: 0.0,
        limp: false,
        hallucinations: false,
        vehicle_corruption_enabled: false,
        tinnitus: false,
        severe_hallucinations: false,
    };

    /// Table lookup keyed by the highest milestone reached.
    pub fn for_flags(flags: MilestoneFlags) -> Self {
        let base = Self::BASELINE;
        match flags.highest() {
            None => base,
            Some(Milestone::Onset) => Tunables {
                visual_distortion_multiplier: 1.8,
                permanent_debuff_level: 0.15,
                ..base
            },
            Some(Milestone::Impairment) => Tunables {
                visual_distortion_multiplier: 3.2,
                permanent_debuff_level: 0.35,
                damage_per_tick: BASE_DAMAGE_PER_TICK + 2,
                tick_chance_denominator: BASE_TICK_CHANCE / 2,
                limp: true,
                ..base
            },
            Some(Milestone::Severe) => Tunables {
                visual_distortion_multiplier: 4.5,
                permanent_debuff_level: 0.55,
                damage_per_tick: BASE_DAMAGE_PER_TICK + 2,
                tick_chance_denominator: BASE_TICK_CHANCE / 2,
                hand_tremor_intensity: 0.003,
                limp: true,
                hallucinations: true,
                ..base
            },
            Some(Milestone::Critical) => Tunables {
                visual_distortion_multiplier: 6.0,
                permanent_debuff_level: 0.65,
                damage_per_tick: BASE_DAMAGE_PER_TICK + 4,
                tick_chance_denominator: BASE_TICK_CHANCE / 2,
                hand_tremor_intensity: 0.005,
                limp: true,
                hallucinations: true,
                vehicle_corruption_enabled: true,
                tinnitus: true,
                ..base
            },
            Some(Milestone::Terminal) => Tunables {
                visual_distortion_multiplier: 8.0,
                permanent_debuff_level: 0.75,
                damage_per_tick: BASE_DAMAGE_PER_TICK + 6,
                tick_chance_denominator: BASE_TICK_CHANCE / 4,
                hand_tremor_intensity: 0.008,
                limp: true,
                hallucinations: true,
                vehicle_corruption_enabled: true,
                tinnitus: true,
                severe_hallucinations: true,
            },
        }
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Milestone flags plus the tunables derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeverityState {
    flags: MilestoneFlags,
    tunables: Tunables,
}

impl SeverityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> MilestoneFlags {
        self.flags
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn is_set(&self, milestone: Milestone) -> bool {
        self.flags.is_set(milestone)
    }

    /// Unlock every milestone whose threshold `failure_count` has reached.
    ///
    /// Idempotent: flags only flip false -> true, and a lower count never
    /// clears anything. Returns the milestones unlocked by this call, in order.
    pub fn apply_severity(&mut self, failure_count: u32) -> Vec<Milestone> {
        let mut unlocked = Vec::new();
        for milestone in Milestone::ALL {
            if failure_count >= milestone.threshold() && self.flags.set(milestone) {
                log::info!("Reached {}", milestone);
                unlocked.push(milestone);
            }
        }
        self.tunables = Tunables::for_flags(self.flags);
        unlocked
    }

    /// Back to no milestones and baseline tunables.
    pub fn reset(&mut self) {
        self.flags.clear();
        self.tunables = Tunables::BASELINE;
    }
}
