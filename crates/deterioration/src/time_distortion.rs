//! HUD clock distortion: the displayed time drifts by a random offset.

use hecs::World;
use rand::Rng;

use crate::chance::FrameChance;
use crate::error::DeteriorationError;
use crate::host::HudClock;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClockStyle {
    TwentyFourHour,
    /// Keeps whatever separated the digits from the AM/PM marker (space, newline...).
    TwelveHour { separator: String },
}

/// A parsed clock display: minutes since midnight plus how it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    minute_of_day: i64,
    zero_padded_hour: bool,
    style: ClockStyle,
}

impl ClockReading {
    /// Parse `"H:MM"`, `"HH:MM"` or `"H:MM AM"` / `"H:MM PM"`.
    pub fn parse(text: &str) -> Result<Self, DeteriorationError> {
        let bad = || DeteriorationError::ClockFormat(text.to_string());

        let (hour_part, rest) = text.split_once(':').ok_or_else(bad)?;
        let hour_part = hour_part.trim_start();
        if hour_part.is_empty() || hour_part.len() > 2 || !hour_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let minute_part = rest.get(..2).ok_or_else(bad)?;
        if !minute_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let hour: i64 = hour_part.parse().map_err(|_| bad())?;
        let minute: i64 = minute_part.parse().map_err(|_| bad())?;
        if minute > 59 {
            return Err(bad());
        }

        let suffix = &rest[2..];
        let marker = suffix.trim_start();
        let separator = suffix[..suffix.len() - marker.len()].to_string();

        // "10:00" in 24h is padded, "10:00 AM" is not.
        let (minute_of_day, zero_padded_hour, style) = match marker.trim_end().to_ascii_uppercase().as_str() {
            "" => {
                if hour > 23 {
                    return Err(bad());
                }
                (hour * 60 + minute, hour_part.len() == 2, ClockStyle::TwentyFourHour)
            }
            m @ ("AM" | "PM") => {
                if !(1..=12).contains(&hour) {
                    return Err(bad());
                }
                let base = if m == "PM" { 12 } else { 0 };
                let padded = hour_part.starts_with('0');
                ((hour % 12 + base) * 60 + minute, padded, ClockStyle::TwelveHour { separator })
            }
            _ => return Err(bad()),
        };

        Ok(Self { minute_of_day, zero_padded_hour, style })
    }

    /// Shift by `minutes`, wrapping around midnight in either direction.
    pub fn shifted(&self, minutes: i32) -> Self {
        Self {
            minute_of_day: (self.minute_of_day + i64::from(minutes)).rem_euclid(MINUTES_PER_DAY),
            ..self.clone()
        }
    }

    /// Render in the same format the reading was parsed from.
    pub fn render(&self) -> String {
        let hour = self.minute_of_day / 60;
        let minute = self.minute_of_day % 60;
        match &self.style {
            ClockStyle::TwentyFourHour => {
                if self.zero_padded_hour {
                    format!("{:02}:{:02}", hour, minute)
                } else {
                    format!("{}:{:02}", hour, minute)
                }
            }
            ClockStyle::TwelveHour { separator } => {
                let display = match hour % 12 {
                    0 => 12,
                    h => h,
                };
                let marker = if hour < 12 { "AM" } else { "PM" };
                if self.zero_padded_hour {
                    format!("{:02}:{:02}{}{}", display, minute, separator, marker)
                } else {
                    format!("{}:{:02}{}{}", display, minute, separator, marker)
                }
            }
        }
    }
}

/// Shift a clock string by `offset_minutes`, keeping its format.
pub fn distort_clock(text: &str, offset_minutes: i32) -> Result<String, DeteriorationError> {
    Ok(ClockReading::parse(text)?.shifted(offset_minutes).render())
}

/// Random clock offset plus what was last shown, so the offset is always applied
/// to the true time rather than stacking on its own output.
#[derive(Debug, Clone, Default)]
pub struct TimeDistortion {
    offset_minutes: i32,
    last_true: Option<String>,
    last_written: Option<String>,
}

impl TimeDistortion {
    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    /// Occasionally redraw the offset. Returns true when it changed.
    pub fn maybe_redraw<R: Rng + ?Sized>(&mut self, failure_count: u32, chance: FrameChance, rng: &mut R) -> bool {
        if !chance.roll(rng, f64::from(failure_count) * 2.0 / 1000.0) {
            return false;
        }
        let max_offset = i32::try_from(failure_count.saturating_mul(10)).unwrap_or(i32::MAX / 2);
        self.offset_minutes = rng.gen_range(-max_offset..=max_offset);
        log::debug!("Clock offset redrawn: {} min", self.offset_minutes);
        true
    }

    /// Rewrite the HUD clock with the current offset. Unparseable text is left alone.
    pub fn apply(&mut self, world: &World) -> Result<(), DeteriorationError> {
        let mut query = world.query::<&mut HudClock>();
        let (_, clock) = query
            .iter()
            .next()
            .ok_or(DeteriorationError::MissingCollaborator("hud clock"))?;

        // If the host has not refreshed the clock since our last write, distort the
        // time we saw before that write instead of our own output.
        let truth = match (&self.last_written, &self.last_true) {
            (Some(written), Some(truth)) if *written == clock.text => truth.clone(),
            _ => clock.text.clone(),
        };
        if truth.is_empty() || !truth.contains(':') {
            return Ok(());
        }

        match distort_clock(&truth, self.offset_minutes) {
            Ok(distorted) => {
                clock.text = distorted.clone();
                self.last_true = Some(truth);
                self.last_written = Some(distorted);
                Ok(())
            }
            Err(e @ DeteriorationError::ClockFormat(_)) => {
                log::debug!("Clock left untouched: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Put the true time back if the clock still shows our output, and zero the offset.
    pub fn restore(&mut self, world: &World) {
        if let (Some(written), Some(truth)) = (self.last_written.take(), self.last_true.take()) {
            let mut query = world.query::<&mut HudClock>();
            if let Some((_, clock)) = query.iter().next() {
                if clock.text == written {
                    clock.text = truth;
                }
            }
        }
        self.offset_minutes = 0;
    }
}
