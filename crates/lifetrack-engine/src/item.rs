//! Shared representation of scheduled items and their expanded occurrences.
//!
//! All instants are UTC. All-day items are normalized to midnight-to-midnight
//! intervals so they take part in overlap checks at instant granularity.

use std::fmt;

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Opaque identifier of a scheduled item (or a learning plan).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Recurrence kind stored alongside the rule text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    /// The rule text alone decides the pattern.
    Custom,
}

/// A time-bound, possibly repeating item as supplied by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub id: ItemId,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub recurrence_end: Option<DateTime<Utc>>,
}

impl ScheduledItem {
    /// A timed, non-recurring item.
    pub fn one_off(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            start,
            end,
            all_day: false,
            recurrence: Recurrence::None,
            recurrence_rule: None,
            recurrence_end: None,
        }
    }

    /// A timed item repeating according to `rule`.
    pub fn recurring(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        recurrence: Recurrence,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            recurrence,
            recurrence_rule: Some(rule.into()),
            ..Self::one_off(id, title, start, end)
        }
    }

    /// Reject timed items whose end is not after their start.
    ///
    /// All-day items are exempt: their span is normalized instead.
    pub fn validate(&self) -> Result<()> {
        if !self.all_day && self.end <= self.start {
            return Err(EngineError::InvalidInterval {
                item_id: self.id.clone(),
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence != Recurrence::None
    }

    /// The effective `[start, end)` interval of the item's first instance.
    ///
    /// All-day items run from midnight of the start date to midnight of the
    /// end date, and always cover at least their start date. On the last
    /// representable day the span is cut at the end of the timeline.
    pub fn span(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        if !self.all_day {
            return (self.start, self.end);
        }
        let start = self.start.date_naive().and_time(NaiveTime::MIN).and_utc();
        let end = self.end.date_naive().and_time(NaiveTime::MIN).and_utc();
        let next_midnight = start
            .checked_add_days(Days::new(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end.max(next_midnight))
    }

    /// Length shared by every occurrence of the item.
    pub fn duration(&self) -> Duration {
        let (start, end) = self.span();
        end - start
    }

    pub(crate) fn occurrence(&self, index: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Occurrence {
        Occurrence {
            item_id: self.id.clone(),
            index,
            start,
            end,
            recurring: self.is_recurring(),
            all_day: self.all_day,
        }
    }
}

/// Identity of one occurrence: the source item plus its ordinal in the series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccurrenceId {
    pub item_id: ItemId,
    pub index: u32,
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.item_id, self.index)
    }
}

/// A materialized instance of a scheduled item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub item_id: ItemId,
    /// 0-based ordinal within the series; always 0 for one-off items.
    pub index: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub all_day: bool,
}

impl Occurrence {
    pub fn id(&self) -> OccurrenceId {
        OccurrenceId {
            item_id: self.item_id.clone(),
            index: self.index,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A half-open query window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(EngineError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether `[start, end)` shares any instant with the window.
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}
