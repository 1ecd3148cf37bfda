//! Recurrence rule grammar -- the RRULE subset persisted with scheduled items.
//!
//! Supported parts: `FREQ`, `INTERVAL`, `COUNT`, `UNTIL`, `BYMONTH`, `BYDAY`,
//! `BYMONTHDAY`, `BYSETPOS` and `WKST`. Anything else is rejected so that a
//! rule never silently expands to something other than what it says.
//!
//! This module only checks and normalizes rule text. Occurrence dates are
//! produced by the `rrule` crate from the canonical [`RecurrenceRule`]
//! rendering; see [`crate::expander`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};

use crate::error::RecurrenceRuleError;
use crate::item::Recurrence;

/// Repetition period of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// The frequency implied by an item's recurrence kind, if any.
    pub fn implied_by(kind: Recurrence) -> Option<Self> {
        match kind {
            Recurrence::Daily => Some(Frequency::Daily),
            Recurrence::Weekly => Some(Frequency::Weekly),
            Recurrence::Monthly => Some(Frequency::Monthly),
            Recurrence::None | Recurrence::Custom => None,
        }
    }
}

/// One `BYDAY` entry, e.g. `TU`, `2TU` (second Tuesday) or `-1FR` (last Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdaySpec {
    pub weekday: Weekday,
    pub ordinal: Option<i8>,
}

impl WeekdaySpec {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            weekday,
            ordinal: None,
        }
    }
}

impl fmt::Display for WeekdaySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{}", n)?;
        }
        f.write_str(weekday_code(self.weekday))
    }
}

/// A parsed recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    /// Inclusive bound on occurrence starts.
    pub until: Option<DateTime<Utc>>,
    /// Months of the year, 1 to 12.
    pub by_month: Vec<u8>,
    pub by_weekday: Vec<WeekdaySpec>,
    /// Days of the month; negative values count back from the month's last day.
    pub by_month_day: Vec<i8>,
    /// Positions within each period's candidate set; negative counts from the end.
    pub by_set_pos: Vec<i16>,
    pub week_start: Weekday,
}

impl RecurrenceRule {
    /// Parse `text`, taking the frequency from `kind` when the text has no `FREQ`.
    ///
    /// A `FREQ` in the text always wins over the kind.
    pub fn resolve(text: &str, kind: Recurrence) -> Result<Self, RecurrenceRuleError> {
        parse(text, Frequency::implied_by(kind))
    }
}

impl FromStr for RecurrenceRule {
    type Err = RecurrenceRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s, None)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency.as_str())?;
        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={}", count)?;
        }
        if let Some(until) = self.until {
            write!(f, ";UNTIL={}", until.format("%Y%m%dT%H%M%SZ"))?;
        }
        if !self.by_month.is_empty() {
            write!(f, ";BYMONTH={}", join(&self.by_month))?;
        }
        if !self.by_weekday.is_empty() {
            write!(f, ";BYDAY={}", join(&self.by_weekday))?;
        }
        if !self.by_month_day.is_empty() {
            write!(f, ";BYMONTHDAY={}", join(&self.by_month_day))?;
        }
        if !self.by_set_pos.is_empty() {
            write!(f, ";BYSETPOS={}", join(&self.by_set_pos))?;
        }
        if self.week_start != Weekday::Mon {
            write!(f, ";WKST={}", weekday_code(self.week_start))?;
        }
        Ok(())
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values.iter().map(T::to_string).collect::<Vec<_>>().join(",")
}

fn parse(text: &str, default_frequency: Option<Frequency>) -> Result<RecurrenceRule, RecurrenceRuleError> {
    let mut body = text.trim();
    if body.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("RRULE:")) {
        body = body[6..].trim_start();
    }
    if body.is_empty() {
        return Err(RecurrenceRuleError::Empty);
    }

    let mut frequency = None;
    let mut interval = None;
    let mut count = None;
    let mut until = None;
    let mut by_month = None;
    let mut by_weekday = None;
    let mut by_month_day = None;
    let mut by_set_pos = None;
    let mut week_start = None;

    for part in body.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| RecurrenceRuleError::MalformedPart(part.to_string()))?;
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();

        match key.as_str() {
            "FREQ" => set_once(&mut frequency, "FREQ", parse_frequency(value)?)?,
            "INTERVAL" => set_once(&mut interval, "INTERVAL", parse_positive("INTERVAL", value)?)?,
            "COUNT" => set_once(&mut count, "COUNT", parse_positive("COUNT", value)?)?,
            "UNTIL" => set_once(&mut until, "UNTIL", parse_until(value)?)?,
            "BYMONTH" => set_once(&mut by_month, "BYMONTH", parse_list(value, parse_month)?)?,
            "BYDAY" => set_once(&mut by_weekday, "BYDAY", parse_list(value, parse_weekday_spec)?)?,
            "BYMONTHDAY" => set_once(&mut by_month_day, "BYMONTHDAY", parse_list(value, parse_month_day)?)?,
            "BYSETPOS" => set_once(&mut by_set_pos, "BYSETPOS", parse_list(value, parse_set_pos)?)?,
            "WKST" => set_once(
                &mut week_start,
                "WKST",
                parse_weekday(value).ok_or_else(|| invalid("WKST", value))?,
            )?,
            _ => return Err(RecurrenceRuleError::UnknownPart(key)),
        }
    }

    let frequency = frequency
        .or(default_frequency)
        .ok_or(RecurrenceRuleError::MissingFrequency)?;
    if count.is_some() && until.is_some() {
        return Err(RecurrenceRuleError::CountWithUntil);
    }
    let by_weekday: Vec<WeekdaySpec> = by_weekday.unwrap_or_default();
    if matches!(frequency, Frequency::Daily | Frequency::Weekly) {
        if let Some(spec) = by_weekday.iter().find(|s| s.ordinal.is_some()) {
            return Err(RecurrenceRuleError::OrdinalNotAllowed(spec.to_string()));
        }
    }

    Ok(RecurrenceRule {
        frequency,
        interval: interval.unwrap_or(1),
        count,
        until,
        by_month: by_month.unwrap_or_default(),
        by_weekday,
        by_month_day: by_month_day.unwrap_or_default(),
        by_set_pos: by_set_pos.unwrap_or_default(),
        week_start: week_start.unwrap_or(Weekday::Mon),
    })
}

fn set_once<T>(slot: &mut Option<T>, part: &str, value: T) -> Result<(), RecurrenceRuleError> {
    if slot.is_some() {
        return Err(RecurrenceRuleError::DuplicatePart(part.to_string()));
    }
    *slot = Some(value);
    Ok(())
}

fn invalid(part: &'static str, value: &str) -> RecurrenceRuleError {
    RecurrenceRuleError::InvalidValue {
        part,
        value: value.to_string(),
    }
}

fn parse_frequency(value: &str) -> Result<Frequency, RecurrenceRuleError> {
    match value.to_ascii_uppercase().as_str() {
        "DAILY" => Ok(Frequency::Daily),
        "WEEKLY" => Ok(Frequency::Weekly),
        "MONTHLY" => Ok(Frequency::Monthly),
        "YEARLY" => Ok(Frequency::Yearly),
        _ => Err(invalid("FREQ", value)),
    }
}

fn parse_positive(part: &'static str, value: &str) -> Result<u32, RecurrenceRuleError> {
    match value.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(invalid(part, value)),
    }
}

/// `YYYYMMDD` (inclusive of that whole day), `YYYYMMDDTHHMMSS` or the same with `Z`.
fn parse_until(value: &str) -> Result<DateTime<Utc>, RecurrenceRuleError> {
    if !value.contains(['T', 't']) {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| invalid("UNTIL", value))?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(|| invalid("UNTIL", value))?;
        return Ok(date.and_time(end_of_day).and_utc());
    }
    let stamp = value.strip_suffix(['Z', 'z']).unwrap_or(value).to_ascii_uppercase();
    NaiveDateTime::parse_from_str(&stamp, "%Y%m%dT%H%M%S")
        .map(|dt| dt.and_utc())
        .map_err(|_| invalid("UNTIL", value))
}

fn parse_list<T>(
    value: &str,
    item: fn(&str) -> Result<T, RecurrenceRuleError>,
) -> Result<Vec<T>, RecurrenceRuleError> {
    value.split(',').map(|v| item(v.trim())).collect()
}

fn parse_weekday_spec(value: &str) -> Result<WeekdaySpec, RecurrenceRuleError> {
    if value.len() < 2 || !value.is_ascii() {
        return Err(invalid("BYDAY", value));
    }
    let (prefix, code) = value.split_at(value.len() - 2);
    let weekday = parse_weekday(code).ok_or_else(|| invalid("BYDAY", value))?;
    if prefix.is_empty() {
        return Ok(WeekdaySpec::every(weekday));
    }
    match prefix.parse::<i8>() {
        Ok(n) if n != 0 && (-53..=53).contains(&n) => Ok(WeekdaySpec {
            weekday,
            ordinal: Some(n),
        }),
        _ => Err(invalid("BYDAY", value)),
    }
}

fn parse_month_day(value: &str) -> Result<i8, RecurrenceRuleError> {
    match value.parse::<i8>() {
        Ok(d) if d != 0 && (-31..=31).contains(&d) => Ok(d),
        _ => Err(invalid("BYMONTHDAY", value)),
    }
}

fn parse_month(value: &str) -> Result<u8, RecurrenceRuleError> {
    match value.parse::<u8>() {
        Ok(m) if (1..=12).contains(&m) => Ok(m),
        _ => Err(invalid("BYMONTH", value)),
    }
}

fn parse_set_pos(value: &str) -> Result<i16, RecurrenceRuleError> {
    match value.parse::<i16>() {
        Ok(n) if n != 0 && (-366..=366).contains(&n) => Ok(n),
        _ => Err(invalid("BYSETPOS", value)),
    }
}

fn parse_weekday(code: &str) -> Option<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}
