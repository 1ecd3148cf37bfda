//! Recurrence expansion -- turns scheduled items into concrete occurrences.
//!
//! Dates come from the `rrule` crate, fed a `DTSTART`/`RRULE` pair built from
//! the item's first start and its canonical rule. The series is walked
//! lazily and clipped to the query window. A rule that cannot be interpreted
//! never fails the caller: the item is expanded as a one-off and the reason
//! comes back as a warning.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rrule::{RRuleSet, RRuleSetIter};
use tracing::{debug, warn};

use crate::error::{RecurrenceRuleError, Result};
use crate::item::{ItemId, Occurrence, ScheduledItem, TimeWindow};
use crate::rule::RecurrenceRule;

/// A recurrence rule that was rejected and replaced by one-off treatment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionWarning {
    pub item_id: ItemId,
    pub rule: String,
    pub error: RecurrenceRuleError,
}

impl fmt::Display for ExpansionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "item '{}': {} (rule '{}'), expanded as a single occurrence",
            self.item_id, self.error, self.rule
        )
    }
}

/// Occurrences of one item inside a window, in ascending start order.
#[derive(Debug, Clone)]
pub struct Expansion {
    warning: Option<ExpansionWarning>,
    source: Source,
}

#[derive(Debug, Clone)]
enum Source {
    Single(Option<Occurrence>),
    Series(Box<Series>),
}

impl Expansion {
    fn single(item: &ScheduledItem, window: TimeWindow, warning: Option<ExpansionWarning>) -> Self {
        let (start, end) = item.span();
        let occurrence = window
            .intersects(start, end)
            .then(|| item.occurrence(0, start, end));
        Self {
            warning,
            source: Source::Single(occurrence),
        }
    }

    /// Set when the item's rule was rejected and the fallback was used.
    pub fn warning(&self) -> Option<&ExpansionWarning> {
        self.warning.as_ref()
    }

    pub fn into_warning(self) -> Option<ExpansionWarning> {
        self.warning
    }
}

impl Iterator for Expansion {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        match &mut self.source {
            Source::Single(occurrence) => occurrence.take(),
            Source::Series(series) => series.next(),
        }
    }
}

/// Expand one item into the occurrences that intersect `window`.
///
/// # Errors
/// Returns `EngineError::InvalidInterval` if the item fails validation.
/// Rule problems are not errors; see [`Expansion::warning`].
pub fn expand(item: &ScheduledItem, window: TimeWindow) -> Result<Expansion> {
    item.validate()?;

    if !item.is_recurring() {
        return Ok(Expansion::single(item, window, None));
    }

    let text = item.recurrence_rule.as_deref().unwrap_or_default();
    let series = RecurrenceRule::resolve(text, item.recurrence)
        .and_then(|rule| Series::new(item, rule, window));
    match series {
        Ok(series) => Ok(Expansion {
            warning: None,
            source: Source::Series(Box::new(series)),
        }),
        Err(error) => {
            warn!(
                item_id = %item.id,
                rule = text,
                %error,
                "recurrence rule rejected, expanding as a single occurrence"
            );
            let warning = ExpansionWarning {
                item_id: item.id.clone(),
                rule: text.to_string(),
                error,
            };
            Ok(Expansion::single(item, window, Some(warning)))
        }
    }
}

/// Every occurrence of a set of items within one window.
#[derive(Debug, Clone, Default)]
pub struct ExpandedSet {
    /// Sorted by start, then end; input order is kept for ties.
    pub occurrences: Vec<Occurrence>,
    pub warnings: Vec<ExpansionWarning>,
}

/// Expand every item over `window` and merge the results.
///
/// # Errors
/// Fails on the first item that does not validate.
pub fn expand_all(items: &[ScheduledItem], window: TimeWindow) -> Result<ExpandedSet> {
    let mut set = ExpandedSet::default();
    for item in items {
        let mut expansion = expand(item, window)?;
        set.occurrences.extend(expansion.by_ref());
        set.warnings.extend(expansion.into_warning());
    }
    set.occurrences.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));

    debug!(
        items = items.len(),
        occurrences = set.occurrences.len(),
        warnings = set.warnings.len(),
        "expanded items"
    );
    Ok(set)
}

/// The next `limit` occurrences starting at or after `now` within `horizon`.
///
/// # Errors
/// Fails if `horizon` is not positive or an item does not validate.
pub fn upcoming(
    items: &[ScheduledItem],
    now: DateTime<Utc>,
    horizon: Duration,
    limit: usize,
) -> Result<Vec<Occurrence>> {
    let end = now.checked_add_signed(horizon).unwrap_or(DateTime::<Utc>::MAX_UTC);
    let window = TimeWindow::new(now, end)?;
    let set = expand_all(items, window)?;
    Ok(set
        .occurrences
        .into_iter()
        .filter(|o| o.start >= now)
        .take(limit)
        .collect())
}

/// Lazy walk over the `rrule` dates of one recurring item.
#[derive(Debug, Clone)]
struct Series {
    dates: RRuleSetIter,
    template: Occurrence,
    duration: Duration,
    /// Inclusive bound on starts from `UNTIL` and the item's recurrence end.
    stop: Option<DateTime<Utc>>,
    window: TimeWindow,
    generated: u32,
    done: bool,
}

impl Series {
    fn new(
        item: &ScheduledItem,
        rule: RecurrenceRule,
        window: TimeWindow,
    ) -> std::result::Result<Self, RecurrenceRuleError> {
        let (first, first_end) = item.span();
        let stop = match (rule.until, item.recurrence_end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        // UNTIL is enforced through `stop`; rrule refuses an UNTIL before DTSTART.
        let bounded_by_stop = RecurrenceRule { until: None, ..rule };
        let text = format!(
            "DTSTART:{}\nRRULE:{}",
            first.format("%Y%m%dT%H%M%SZ"),
            bounded_by_stop
        );
        // The loop guard ends rules that can never match instead of spinning.
        let set: RRuleSet = text.parse::<RRuleSet>()?.limit();

        Ok(Self {
            dates: (&set).into_iter(),
            template: item.occurrence(0, first, first_end),
            duration: item.duration(),
            stop,
            window,
            generated: 0,
            done: false,
        })
    }

    fn past_bounds(&self, start: DateTime<Utc>) -> bool {
        start >= self.window.end || self.stop.is_some_and(|stop| start > stop)
    }
}

impl Iterator for Series {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        while !self.done {
            let Some(date) = self.dates.next() else {
                self.done = true;
                break;
            };
            let start = date.with_timezone(&Utc);
            let end = match start.checked_add_signed(self.duration) {
                Some(end) if !self.past_bounds(start) => end,
                _ => {
                    self.done = true;
                    break;
                }
            };

            let index = self.generated;
            self.generated += 1;
            if self.window.intersects(start, end) {
                return Some(Occurrence {
                    index,
                    start,
                    end,
                    ..self.template.clone()
                });
            }
        }
        None
    }
}
