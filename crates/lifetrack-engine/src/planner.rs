//! Auto-placement of recurring study sessions.
//!
//! A learning plan names the weekdays and times a learner prefers, or a
//! recurrence rule for patterns plain weekdays cannot express (every other
//! week, the first Saturday of the month). For every matching day of the
//! horizon the planner expands the existing calendar,
//! asks the slot finder for the best free slot and proposes a session there.
//! Sessions that still collide with something (all-day entries do not block
//! slots by default) are returned with resolution suggestions instead of
//! being dropped or forced in.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::{detect_conflicts, ConflictGroup};
use crate::error::{EngineError, Result};
use crate::expander::{expand, expand_all, ExpansionWarning};
use crate::freebusy::{find_available, find_best, WorkingHours};
use crate::item::{ItemId, Occurrence, Recurrence, ScheduledItem, TimeWindow};
use crate::resolver::{suggest_resolutions, ResolutionOption};

/// A recurring study commitment to place on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPlan {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    /// Session pattern as a recurrence rule; takes precedence over `weekdays`.
    /// Without `FREQ` the rule is read as weekly.
    #[serde(default)]
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub preferred_times: Vec<NaiveTime>,
    pub session_minutes: u32,
    pub horizon_start: NaiveDate,
    pub horizon_days: u32,
}

impl LearningPlan {
    pub fn validate(&self) -> Result<()> {
        let reason = if self.weekdays.is_empty() && self.recurrence_rule.is_none() {
            "no weekdays selected"
        } else if self.session_minutes == 0 {
            "session length must be positive"
        } else if self.horizon_days == 0 {
            "horizon must cover at least one day"
        } else {
            return Ok(());
        };
        Err(EngineError::InvalidPlan {
            plan_id: self.id.clone(),
            reason: reason.to_string(),
        })
    }

    /// Horizon days on which a session is wanted, ascending.
    ///
    /// With a rule these are the dates of its occurrences inside the horizon,
    /// the series starting on the horizon's first day. A rejected rule comes
    /// back as a warning and yields that first day only, like any other item.
    pub fn session_days(&self) -> Result<(Vec<NaiveDate>, Option<ExpansionWarning>)> {
        let horizon = self.horizon()?;
        let Some(rule) = self.recurrence_rule.as_deref() else {
            let days = self
                .horizon_start
                .iter_days()
                .take(self.horizon_days as usize)
                .filter(|d| self.weekdays.contains(&d.weekday()))
                .collect();
            return Ok((days, None));
        };

        let session_end = horizon
            .start
            .checked_add_signed(self.session_length())
            .ok_or_else(|| self.out_of_range())?;
        let seed = ScheduledItem::recurring(
            self.id.as_str(),
            self.title.as_str(),
            horizon.start,
            session_end,
            Recurrence::Weekly,
            rule,
        );
        let mut expansion = expand(&seed, horizon)?;
        let mut days: Vec<NaiveDate> = expansion
            .by_ref()
            .map(|o| o.start.date_naive())
            .collect();
        days.dedup();
        Ok((days, expansion.into_warning()))
    }

    fn session_length(&self) -> Duration {
        Duration::minutes(i64::from(self.session_minutes))
    }

    fn out_of_range(&self) -> EngineError {
        EngineError::InvalidPlan {
            plan_id: self.id.clone(),
            reason: "horizon is out of range".to_string(),
        }
    }

    fn horizon(&self) -> Result<TimeWindow> {
        let start = self.horizon_start.and_time(NaiveTime::MIN).and_utc();
        let end = self
            .horizon_start
            .checked_add_days(Days::new(u64::from(self.horizon_days)))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .ok_or_else(|| self.out_of_range())?;
        TimeWindow::new(start, end)
    }
}

/// Planner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub working_hours: WorkingHours,
    /// Treat all-day items as busy when looking for slots.
    pub all_day_blocks_slots: bool,
}

/// A proposed session that collides with the existing calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConflict {
    pub group: ConflictGroup,
    pub suggestions: Vec<ResolutionOption>,
}

/// Result of placing a learning plan.
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    /// Conflict-free sessions, ready to persist.
    pub placed: Vec<Occurrence>,
    pub conflicts: Vec<PlanConflict>,
    /// Matching days with no slot large enough.
    pub unplaced_days: Vec<NaiveDate>,
    pub warnings: Vec<ExpansionWarning>,
}

/// Place one session per matching horizon day.
///
/// # Errors
/// Fails if the plan or configuration is invalid or an existing item fails
/// validation.
pub fn schedule_plan(
    plan: &LearningPlan,
    existing: &[ScheduledItem],
    config: &PlannerConfig,
) -> Result<PlanOutcome> {
    plan.validate()?;
    config.working_hours.validate()?;

    let (session_days, rule_warning) = plan.session_days()?;
    let expanded = expand_all(existing, plan.horizon()?)?;
    let session = plan.session_length();

    let mut outcome = PlanOutcome {
        warnings: expanded.warnings,
        ..PlanOutcome::default()
    };
    outcome.warnings.extend(rule_warning);
    let blocking: Vec<Occurrence> = expanded
        .occurrences
        .iter()
        .filter(|o| config.all_day_blocks_slots || !o.all_day)
        .cloned()
        .collect();

    let mut proposed = Vec::new();
    for day in session_days {
        let slots = find_available(&blocking, day, session, config.working_hours)?;
        match find_best(&slots, &plan.preferred_times) {
            Some(slot) => proposed.push(Occurrence {
                item_id: plan.id.clone(),
                index: proposed.len() as u32,
                start: slot.start,
                end: slot.end,
                recurring: true,
                all_day: false,
            }),
            None => outcome.unplaced_days.push(day),
        }
    }

    let mut combined = expanded.occurrences;
    combined.extend(proposed.iter().cloned());
    let groups: Vec<ConflictGroup> = detect_conflicts(&combined)
        .into_iter()
        .filter(|g| proposed.iter().any(|p| g.contains(p)))
        .collect();

    outcome.placed = proposed
        .into_iter()
        .filter(|p| !groups.iter().any(|g| g.contains(p)))
        .collect();
    outcome.conflicts = groups
        .into_iter()
        .map(|group| PlanConflict {
            suggestions: suggest_resolutions(&group),
            group,
        })
        .collect();

    debug!(
        plan_id = %plan.id,
        placed = outcome.placed.len(),
        conflicts = outcome.conflicts.len(),
        unplaced = outcome.unplaced_days.len(),
        "scheduled learning plan"
    );
    Ok(outcome)
}
