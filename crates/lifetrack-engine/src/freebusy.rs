//! Find bookable slots inside working hours and rank them against preferences.
//!
//! Busy occurrences are swept in start order. Every gap that can hold the
//! requested duration yields exactly one slot of that duration, starting at
//! the gap's beginning.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::item::{Occurrence, TimeWindow};

/// A bookable interval. Slots returned by the finder are always available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

impl TimeSlot {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Daily time-of-day window in which slots may be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        let hours = Self { start, end };
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(EngineError::InvalidWorkingHours(format!(
                "end {} is not after start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// The working window of `day` on the UTC timeline.
    pub fn on(&self, day: NaiveDate) -> Result<TimeWindow> {
        self.validate()?;
        TimeWindow::new(day.and_time(self.start).and_utc(), day.and_time(self.end).and_utc())
    }
}

/// Slots of exactly `slot_duration` within `hours` on `day`, free of `existing`.
///
/// Only occurrences intersecting the day's working window count as busy;
/// this includes occurrences carried over from the previous day.
///
/// # Errors
/// Returns `EngineError::InvalidDuration` for a non-positive duration and
/// `EngineError::InvalidWorkingHours` when the hours are empty.
pub fn find_available(
    existing: &[Occurrence],
    day: NaiveDate,
    slot_duration: Duration,
    hours: WorkingHours,
) -> Result<Vec<TimeSlot>> {
    if slot_duration <= Duration::zero() {
        return Err(EngineError::InvalidDuration(slot_duration.num_minutes()));
    }
    let window = hours.on(day)?;

    let mut busy: Vec<&Occurrence> = existing
        .iter()
        .filter(|o| window.intersects(o.start, o.end))
        .collect();
    busy.sort_by_key(|o| o.start);

    let mut slots = Vec::new();
    let mut cursor = window.start;
    for occurrence in busy {
        push_if_fits(&mut slots, cursor, occurrence.start.min(window.end), slot_duration);
        cursor = cursor.max(occurrence.end);
    }
    push_if_fits(&mut slots, cursor, window.end, slot_duration);

    Ok(slots)
}

fn push_if_fits(slots: &mut Vec<TimeSlot>, cursor: DateTime<Utc>, gap_end: DateTime<Utc>, duration: Duration) {
    if gap_end - cursor >= duration {
        slots.push(TimeSlot {
            start: cursor,
            end: cursor + duration,
            available: true,
        });
    }
}

/// Pick the slot whose start is closest (in minutes of the day) to any
/// preferred time. Ties go to the earliest slot; no preferences means the
/// first slot.
pub fn find_best(slots: &[TimeSlot], preferred_times: &[NaiveTime]) -> Option<TimeSlot> {
    if preferred_times.is_empty() {
        return slots.first().cloned();
    }
    slots
        .iter()
        .min_by_key(|slot| {
            let minute = minute_of_day(slot.start.time());
            let score = preferred_times
                .iter()
                .map(|t| (minute - minute_of_day(*t)).abs())
                .min()
                .unwrap_or(i64::MAX);
            (score, slot.start)
        })
        .cloned()
}

fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}
