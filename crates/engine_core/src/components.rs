//! Common ECS components used across the workspace.

/// Health component for damageable entities.
///
/// `max` is a mutable cap: lowering it clamps `current` immediately.
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Set a new cap (never below 1) and clamp current health to it.
    /// Returns true if current health was reduced.
    pub fn set_max(&mut self, max: f32) -> bool {
        self.max = max.max(1.0);
        self.enforce_cap()
    }

    /// Clamp current health to the cap. Returns true if it was over.
    pub fn enforce_cap(&mut self) -> bool {
        if self.current > self.max {
            self.current = self.max;
            true
        } else {
            false
        }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn percentage(&self) -> f32 {
        self.current / self.max
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Source of a damage event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DamageType {
    #[default]
    Unknown,
    Enemy,
    /// Self-inflicted by the deterioration hazard tick. Other systems must not
    /// attribute it to an enemy or the environment.
    Intrinsic,
}

/// One damage event, as recorded on the receiving entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damage {
    pub amount: f32,
    pub damage_type: DamageType,
}

impl Damage {
    pub fn intrinsic(amount: f32) -> Self {
        Self {
            amount,
            damage_type: DamageType::Intrinsic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowering_cap_clamps_current() {
        let mut h = Health::new(100.0);
        assert!(h.set_max(60.0));
        assert_eq!(h.current, 60.0);
        assert!(!h.set_max(80.0));
        assert_eq!(h.current, 60.0);
    }

    #[test]
    fn cap_never_below_one() {
        let mut h = Health::new(100.0);
        h.set_max(-5.0);
        assert_eq!(h.max, 1.0);
        assert_eq!(h.current, 1.0);
    }

    #[test]
    fn damage_floors_at_zero() {
        let mut h = Health::new(10.0);
        h.take_damage(25.0);
        assert!(h.is_dead());
        h.heal(100.0);
        assert_eq!(h.current, 10.0);
    }
}
