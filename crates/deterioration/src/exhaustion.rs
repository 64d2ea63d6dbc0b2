//! Sprint exhaustion: sustained sprinting leaves the subject winded.

use crate::hazard::HazardTimers;
use crate::host::Subject;
use crate::presentation::{Presentation, ShakeKind};

pub const EXHAUSTION_THRESHOLD_BASE: f32 = 8.0;
pub const EXHAUSTION_THRESHOLD_FLOOR: f32 = 1.0;
pub const WINDED_COOLDOWN: f32 = 5.0;
/// Drunkness the subject is eased toward while winded.
pub const WINDED_DRUNKNESS: f32 = 0.9;

/// Seconds of continuous sprinting before the subject is winded.
pub fn exhaustion_threshold(failure_count: u32) -> f32 {
    (EXHAUSTION_THRESHOLD_BASE - 0.25 * failure_count as f32).max(EXHAUSTION_THRESHOLD_FLOOR)
}

/// Winded state machine over the `winded_timer` and `sprint_duration` timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustionMonitor {
    winded: bool,
}

impl ExhaustionMonitor {
    pub fn is_winded(&self) -> bool {
        self.winded
    }

    /// Advance one frame. Returns true on the frame the subject becomes winded.
    pub fn update(&mut self, timers: &mut HazardTimers, subject: &Subject, failure_count: u32, dt: f32) -> bool {
        if self.winded {
            timers.winded_timer -= dt;
            if timers.winded_timer <= 0.0 {
                timers.winded_timer = 0.0;
                self.winded = false;
                log::debug!("Subject recovered from being winded");
            }
            return false;
        }

        if subject.is_exerting() {
            timers.sprint_duration += dt;
        } else {
            timers.sprint_duration = (timers.sprint_duration - 2.0 * dt).max(0.0);
        }

        if timers.sprint_duration > exhaustion_threshold(failure_count) {
            self.winded = true;
            timers.winded_timer = WINDED_COOLDOWN;
            timers.sprint_duration = 0.0;
            log::debug!("Subject winded after sprinting (failure count {})", failure_count);
            return true;
        }
        false
    }

    pub fn reset(&mut self, timers: &mut HazardTimers) {
        self.winded = false;
        timers.winded_timer = 0.0;
        timers.sprint_duration = 0.0;
    }
}

/// Per-frame feedback while winded: drift toward heavy impairment and keep the camera shaking.
pub fn apply_winded_feedback(subject: &mut Subject, presentation: &mut dyn Presentation, dt: f32) {
    let t = (5.0 * dt).min(1.0);
    subject.drunkness += (WINDED_DRUNKNESS - subject.drunkness) * t;
    subject.increasing_drunkness = true;
    presentation.shake_camera(ShakeKind::Big);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::RecordingPresentation;

    const DT: f32 = 0.25;

    fn sprinting() -> Subject {
        let mut s = Subject::new(4.6, 11.0);
        s.is_sprinting = true;
        s
    }

    #[test]
    fn threshold_shrinks_and_floors() {
        assert_eq!(exhaustion_threshold(0), 8.0);
        assert_eq!(exhaustion_threshold(8), 6.0);
        assert_eq!(exhaustion_threshold(40), 1.0);
    }

    #[test]
    fn sustained_sprint_winds_subject() {
        let mut monitor = ExhaustionMonitor::default();
        let mut timers = HazardTimers::default();
        let subject = sprinting();
        // Threshold at 8 failures is 6 s.
        let mut winded_at = None;
        for frame in 0..40 {
            if monitor.update(&mut timers, &subject, 8, DT) {
                winded_at = Some(frame);
                break;
            }
        }
        assert_eq!(winded_at, Some(24));
        assert!(monitor.is_winded());
        assert_eq!(timers.sprint_duration, 0.0);
        assert_eq!(timers.winded_timer, WINDED_COOLDOWN);
    }

    #[test]
    fn no_accumulation_while_winded() {
        let mut monitor = ExhaustionMonitor::default();
        let mut timers = HazardTimers::default();
        let subject = sprinting();
        while !monitor.update(&mut timers, &subject, 30, DT) {}
        for _ in 0..19 {
            monitor.update(&mut timers, &subject, 30, DT);
            assert_eq!(timers.sprint_duration, 0.0);
        }
        assert!(monitor.is_winded());
        monitor.update(&mut timers, &subject, 30, DT);
        assert!(!monitor.is_winded());
    }

    #[test]
    fn resting_decays_twice_as_fast() {
        let mut monitor = ExhaustionMonitor::default();
        let mut timers = HazardTimers::default();
        let mut subject = sprinting();
        for _ in 0..8 {
            monitor.update(&mut timers, &subject, 0, DT);
        }
        assert_eq!(timers.sprint_duration, 2.0);
        subject.is_sprinting = false;
        for _ in 0..2 {
            monitor.update(&mut timers, &subject, 0, DT);
        }
        assert_eq!(timers.sprint_duration, 1.0);
        for _ in 0..50 {
            monitor.update(&mut timers, &subject, 0, DT);
        }
        assert_eq!(timers.sprint_duration, 0.0);
    }

    #[test]
    fn empty_meter_does_not_count_as_exertion() {
        let mut monitor = ExhaustionMonitor::default();
        let mut timers = HazardTimers::default();
        let mut subject = sprinting();
        subject.sprint_meter = 0.0;
        for _ in 0..200 {
            assert!(!monitor.update(&mut timers, &subject, 9, DT));
        }
        assert_eq!(timers.sprint_duration, 0.0);
    }

    #[test]
    fn winded_feedback_eases_toward_heavy_impairment() {
        let mut subject = Subject::new(4.6, 11.0);
        let mut p = RecordingPresentation::default();
        for _ in 0..120 {
            apply_winded_feedback(&mut subject, &mut p, 1.0 / 60.0);
        }
        assert!(subject.drunkness > 0.85 && subject.drunkness < WINDED_DRUNKNESS + 1e-6);
        assert!(subject.increasing_drunkness);
        assert_eq!(p.shakes.len(), 120);
        assert!(p.shakes.iter().all(|s| *s == ShakeKind::Big));
    }
}
