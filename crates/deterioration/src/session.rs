//! Failure counter and the round-streak recovery policy.

/// Qualifying rounds needed to take one failure back.
pub const ROUNDS_PER_REDUCTION: u32 = 3;

/// How a round ended, as far as recovery is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Qualifying,
    /// Early or abnormal exit. Breaks the streak without granting anything.
    Anomalous,
}

impl RoundOutcome {
    /// Rounds played on a liquidation level end abnormally.
    pub fn from_level_name(name: &str) -> Self {
        if name.contains("Liquidation") {
            RoundOutcome::Anomalous
        } else {
            RoundOutcome::Qualifying
        }
    }
}

/// Sole owner of the failure count that drives every escalation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCounter {
    failure_count: u32,
    rounds_survived_since_reduction: u32,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn rounds_survived_since_reduction(&self) -> u32 {
        self.rounds_survived_since_reduction
    }

    /// The subject died: one more failure, and the streak starts over.
    pub fn record_death(&mut self) -> u32 {
        self.failure_count += 1;
        self.rounds_survived_since_reduction = 0;
        log::info!("Subject died. Failure count: {}", self.failure_count);
        self.failure_count
    }

    /// A round finished. Returns the new failure count if this round earned a reduction.
    pub fn record_round(&mut self, outcome: RoundOutcome) -> Option<u32> {
        if outcome == RoundOutcome::Anomalous {
            log::debug!("Anomalous round exit, recovery streak reset");
            self.rounds_survived_since_reduction = 0;
            return None;
        }

        self.rounds_survived_since_reduction += 1;
        if self.rounds_survived_since_reduction < ROUNDS_PER_REDUCTION {
            return None;
        }

        self.rounds_survived_since_reduction = 0;
        if self.failure_count == 0 {
            return None;
        }
        self.failure_count -= 1;
        log::info!(
            "Failure count reduced to {} after surviving {} rounds",
            self.failure_count,
            ROUNDS_PER_REDUCTION
        );
        Some(self.failure_count)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_failures(n: u32) -> SessionCounter {
        let mut s = SessionCounter::new();
        for _ in 0..n {
            s.record_death();
        }
        s
    }

    #[test]
    fn three_qualifying_rounds_take_one_back() {
        let mut s = with_failures(5);
        assert_eq!(s.record_round(RoundOutcome::Qualifying), None);
        assert_eq!(s.record_round(RoundOutcome::Qualifying), None);
        assert_eq!(s.record_round(RoundOutcome::Qualifying), Some(4));
        assert_eq!(s.failure_count(), 4);
        assert_eq!(s.rounds_survived_since_reduction(), 0);
    }

    #[test]
    fn anomalous_round_breaks_streak() {
        let mut s = with_failures(5);
        s.record_round(RoundOutcome::Qualifying);
        s.record_round(RoundOutcome::Qualifying);
        assert_eq!(s.record_round(RoundOutcome::Anomalous), None);
        assert_eq!(s.rounds_survived_since_reduction(), 0);
        s.record_round(RoundOutcome::Qualifying);
        assert_eq!(s.failure_count(), 5);
    }

    #[test]
    fn death_resets_streak() {
        let mut s = with_failures(2);
        s.record_round(RoundOutcome::Qualifying);
        s.record_round(RoundOutcome::Qualifying);
        s.record_death();
        assert_eq!(s.failure_count(), 3);
        assert_eq!(s.rounds_survived_since_reduction(), 0);
    }

    #[test]
    fn reduction_floors_at_zero() {
        let mut s = SessionCounter::new();
        for _ in 0..3 {
            s.record_round(RoundOutcome::Qualifying);
        }
        assert_eq!(s.failure_count(), 0);
        assert_eq!(s.rounds_survived_since_reduction(), 0);
    }

    #[test]
    fn liquidation_levels_are_anomalous() {
        assert_eq!(RoundOutcome::from_level_name("LiquidationLevel"), RoundOutcome::Anomalous);
        assert_eq!(RoundOutcome::from_level_name("Experimentation"), RoundOutcome::Qualifying);
    }

    #[test]
    fn reset_clears_both_counters() {
        let mut s = with_failures(6);
        s.record_round(RoundOutcome::Qualifying);
        s.reset();
        assert_eq!(s, SessionCounter::new());
    }
}
