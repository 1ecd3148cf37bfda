//! # lifetrack-engine
//!
//! Deterministic scheduling computation for LifeTrack calendars.
//!
//! The engine is a set of pure functions over caller-supplied snapshots: it
//! expands recurring items into occurrences, groups overlapping occurrences
//! into conflicts, proposes resolutions, finds free slots inside working hours
//! and places recurring study sessions. It holds no state between calls and
//! assumes every instant is already on the UTC timeline.
//!
//! ## Modules
//!
//! - [`item`]: Scheduled items, occurrences and query windows
//! - [`rule`]: RRULE subset validation (`FREQ`, `INTERVAL`, `COUNT`, `UNTIL`, `BYMONTH`, `BYDAY`, `BYMONTHDAY`, `BYSETPOS`, `WKST`)
//! - [`expander`]: Item + window → lazy sequence of occurrences, dated by `rrule`
//! - [`conflict`]: Transitive grouping of overlapping occurrences
//! - [`resolver`]: Cancel / move proposals for a conflict group
//! - [`freebusy`]: Free slots within working hours, ranked by preferred times
//! - [`planner`]: Learning-plan session placement
//! - [`error`]: Error types

pub mod conflict;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod item;
pub mod planner;
pub mod resolver;
pub mod rule;

pub use conflict::{detect_conflicts, overlap_minutes, overlaps, ConflictGroup};
pub use error::{EngineError, RecurrenceRuleError};
pub use expander::{expand, expand_all, upcoming, ExpandedSet, Expansion, ExpansionWarning};
pub use freebusy::{find_available, find_best, TimeSlot, WorkingHours};
pub use item::{ItemId, Occurrence, OccurrenceId, Recurrence, ScheduledItem, TimeWindow};
pub use planner::{schedule_plan, LearningPlan, PlanConflict, PlanOutcome, PlannerConfig};
pub use resolver::{suggest_resolutions, ResolutionOption};
pub use rule::{Frequency, RecurrenceRule, WeekdaySpec};
