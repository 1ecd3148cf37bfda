//! Error types for scheduling engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::item::ItemId;

/// Caller-facing validation errors. These are returned, never recovered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A timed item ends at or before it starts.
    #[error("Invalid interval on item '{item_id}': end {end} is not after start {start}")]
    InvalidInterval {
        item_id: ItemId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A query window ends at or before it starts.
    #[error("Invalid window: end {end} is not after start {start}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid working hours: {0}")]
    InvalidWorkingHours(String),

    #[error("Invalid slot duration: {0} minutes")]
    InvalidDuration(i64),

    #[error("Invalid learning plan '{plan_id}': {reason}")]
    InvalidPlan { plan_id: ItemId, reason: String },
}

/// Why a recurrence rule string could not be interpreted.
///
/// The expander recovers from every one of these by treating the item as a
/// one-off, so they only ever reach callers as warnings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceRuleError {
    #[error("empty recurrence rule")]
    Empty,

    /// A part that is not of the form `KEY=VALUE`.
    #[error("malformed rule part '{0}'")]
    MalformedPart(String),

    #[error("unsupported rule part '{0}'")]
    UnknownPart(String),

    #[error("rule part '{0}' appears more than once")]
    DuplicatePart(String),

    #[error("rule has no FREQ and the item's recurrence kind does not imply one")]
    MissingFrequency,

    #[error("invalid value '{value}' for {part}")]
    InvalidValue { part: &'static str, value: String },

    #[error("COUNT and UNTIL cannot be combined")]
    CountWithUntil,

    /// Ordinal weekdays such as `2TU` only make sense in monthly or yearly rules.
    #[error("ordinal BYDAY '{0}' requires FREQ=MONTHLY or FREQ=YEARLY")]
    OrdinalNotAllowed(String),

    /// Well-formed parts that do not combine into a valid rule, such as
    /// `BYMONTHDAY` in a weekly rule or `BYSETPOS` on its own.
    #[error("invalid rule: {0}")]
    Rejected(String),
}

impl From<rrule::RRuleError> for RecurrenceRuleError {
    fn from(error: rrule::RRuleError) -> Self {
        Self::Rejected(error.to_string())
    }
}

/// Convenience alias used throughout lifetrack-engine.
pub type Result<T> = std::result::Result<T, EngineError>;
