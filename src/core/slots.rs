use crate::core::time::TimeInstant;
use chrono::{DateTime, Datelike, Duration, DurationRound, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of generated slots
pub const MAX_SLOTS: usize = 20;

/// Longest lookahead a window may ask for
pub const MAX_DAYS_AHEAD: u32 = 366;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("business start hour {start} must be before end hour {end}")]
    EmptyBusinessDay { start: u32, end: u32 },

    #[error("business end hour {0} is past midnight")]
    EndHourOutOfRange(u32),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("days_ahead {0} exceeds the maximum of {max}", max = MAX_DAYS_AHEAD)]
    DaysAheadTooLarge(u32),
}

/// Parameters of the hourly slot sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub duration_minutes: u32,
    pub business_start_hour: u32,
    pub business_end_hour: u32,
    pub days_ahead: u32,
}

impl Default for SlotWindow {
    fn default() -> Self {
        Self {
            duration_minutes: 60,
            business_start_hour: 9,
            business_end_hour: 17,
            days_ahead: 14,
        }
    }
}

impl SlotWindow {
    pub fn validate(&self) -> Result<(), WindowError> {
        if self.duration_minutes == 0 {
            return Err(WindowError::Zero("duration_minutes"));
        }
        if self.days_ahead == 0 {
            return Err(WindowError::Zero("days_ahead"));
        }
        if self.days_ahead > MAX_DAYS_AHEAD {
            return Err(WindowError::DaysAheadTooLarge(self.days_ahead));
        }
        if self.business_end_hour > 24 {
            return Err(WindowError::EndHourOutOfRange(self.business_end_hour));
        }
        if self.business_start_hour >= self.business_end_hour {
            return Err(WindowError::EmptyBusinessDay {
                start: self.business_start_hour,
                end: self.business_end_hour,
            });
        }
        Ok(())
    }

    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes as i64)
    }
}

/// A known busy period, half-open `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: TimeInstant,
    pub end: TimeInstant,
}

impl BusyInterval {
    /// Half-open overlap test against a slot
    #[inline]
    pub fn overlaps(&self, slot_start: &TimeInstant, slot_end: &TimeInstant) -> bool {
        *slot_start < self.end && *slot_end > self.start
    }
}

/// First full hour at or after `now`
pub fn next_full_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let floored = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
    if floored < now {
        floored + Duration::hours(1)
    } else {
        floored
    }
}

fn at_business_start(day: DateTime<Utc>, start_hour: u32) -> DateTime<Utc> {
    let midnight = day.duration_trunc(Duration::days(1)).unwrap_or(day);
    midnight + Duration::hours(start_hour as i64)
}

fn is_weekend(dt: &DateTime<Utc>) -> bool {
    matches!(dt.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Sweep hourly slots inside business hours on weekdays (UTC), skipping
/// anything that overlaps a busy interval.
///
/// The sweep starts at the next full hour after `now`, runs for
/// `window.days_ahead` days (at most [`MAX_DAYS_AHEAD`]) and stops after
/// [`MAX_SLOTS`] entries.
pub fn generate_slots(
    now: DateTime<Utc>,
    window: &SlotWindow,
    busy: &[BusyInterval],
) -> Vec<TimeInstant> {
    let mut slots = Vec::new();
    let mut current = next_full_hour(now);
    let days_ahead = window.days_ahead.min(MAX_DAYS_AHEAD);
    let end_time = current
        .checked_add_signed(Duration::days(days_ahead as i64))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let start_hour = window.business_start_hour;
    let end_hour = window.business_end_hour;

    while current < end_time && slots.len() < MAX_SLOTS {
        if is_weekend(&current) {
            current = at_business_start(current + Duration::days(1), start_hour);
            continue;
        }

        let hour = chrono::Timelike::hour(&current);
        if hour < start_hour {
            current = at_business_start(current, start_hour);
            continue;
        }
        if hour >= end_hour {
            current = at_business_start(current + Duration::days(1), start_hour);
            continue;
        }

        let slot_start = TimeInstant::from_utc(current);
        let slot_end = slot_start.plus(window.slot_duration());

        if !busy.iter().any(|b| b.overlaps(&slot_start, &slot_end)) {
            slots.push(slot_start);
        }

        current += Duration::hours(1);
    }

    tracing::debug!("Generated {} available slots", slots.len());
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        TimeInstant::parse(s).unwrap().as_datetime()
    }

    fn busy(start: &str, end: &str) -> BusyInterval {
        BusyInterval {
            start: TimeInstant::parse(start).unwrap(),
            end: TimeInstant::parse(end).unwrap(),
        }
    }

    #[test]
    fn test_next_full_hour() {
        assert_eq!(next_full_hour(utc("2025-07-15T10:00:00Z")), utc("2025-07-15T10:00:00Z"));
        assert_eq!(next_full_hour(utc("2025-07-15T10:00:01Z")), utc("2025-07-15T11:00:00Z"));
        assert_eq!(next_full_hour(utc("2025-07-15T10:59:00Z")), utc("2025-07-15T11:00:00Z"));
    }

    #[test]
    fn test_slots_stay_in_business_hours() {
        // Tuesday morning
        let slots = generate_slots(utc("2025-07-15T07:20:00Z"), &SlotWindow::default(), &[]);

        assert_eq!(slots.len(), MAX_SLOTS);
        assert_eq!(slots[0].to_string(), "2025-07-15T09:00:00Z");
        assert_eq!(slots[7].to_string(), "2025-07-15T16:00:00Z");
        assert_eq!(slots[8].to_string(), "2025-07-16T09:00:00Z");
        for slot in &slots {
            let hour = chrono::Timelike::hour(&slot.as_datetime());
            assert!((9..17).contains(&hour));
        }
    }

    #[test]
    fn test_weekends_skipped() {
        // Friday afternoon
        let slots = generate_slots(utc("2025-07-18T15:30:00Z"), &SlotWindow::default(), &[]);

        assert_eq!(slots[0].to_string(), "2025-07-18T16:00:00Z");
        assert_eq!(slots[1].to_string(), "2025-07-21T09:00:00Z");
        assert!(slots.iter().all(|s| !is_weekend(&s.as_datetime())));
    }

    #[test]
    fn test_busy_intervals_excluded() {
        let busy = vec![
            busy("2025-07-15T10:30:00Z", "2025-07-15T12:00:00Z"),
            // Ends exactly when the 14:00 slot starts: no overlap
            busy("2025-07-15T13:00:00Z", "2025-07-15T14:00:00Z"),
        ];
        let window = SlotWindow { days_ahead: 1, ..SlotWindow::default() };

        let slots: Vec<String> = generate_slots(utc("2025-07-15T09:00:00Z"), &window, &busy)
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            slots,
            vec![
                "2025-07-15T09:00:00Z",
                "2025-07-15T12:00:00Z",
                "2025-07-15T14:00:00Z",
                "2025-07-15T15:00:00Z",
                "2025-07-15T16:00:00Z",
            ]
        );
    }

    #[test]
    fn test_horizon_limits_slots() {
        let window = SlotWindow { days_ahead: 1, ..SlotWindow::default() };
        let slots = generate_slots(utc("2025-07-15T12:00:00Z"), &window, &[]);

        // 12..17 today, 9..12 tomorrow before the 24h horizon ends
        assert_eq!(slots.len(), 8);
        assert_eq!(slots.last().unwrap().to_string(), "2025-07-16T11:00:00Z");
    }

    #[test]
    fn test_window_validation() {
        assert!(SlotWindow::default().validate().is_ok());
        let inverted = SlotWindow { business_start_hour: 17, business_end_hour: 9, ..SlotWindow::default() };
        assert!(matches!(inverted.validate(), Err(WindowError::EmptyBusinessDay { .. })));
        let zero = SlotWindow { days_ahead: 0, ..SlotWindow::default() };
        assert_eq!(zero.validate(), Err(WindowError::Zero("days_ahead")));
        let huge = SlotWindow { days_ahead: u32::MAX, ..SlotWindow::default() };
        assert_eq!(huge.validate(), Err(WindowError::DaysAheadTooLarge(u32::MAX)));
        let year = SlotWindow { days_ahead: MAX_DAYS_AHEAD, ..SlotWindow::default() };
        assert!(year.validate().is_ok());
    }

    #[test]
    fn test_huge_lookahead_does_not_overflow() {
        let window = SlotWindow { days_ahead: u32::MAX, ..SlotWindow::default() };
        let slots = generate_slots(utc("2025-07-15T07:00:00Z"), &window, &[]);

        assert_eq!(slots.len(), MAX_SLOTS);
        assert_eq!(slots[0].to_string(), "2025-07-15T09:00:00Z");
    }
}
