//! Resolution proposals for conflict groups.
//!
//! Two independent paths are proposed for every group and returned as one
//! flat list: keep the highest-priority occurrence and cancel the rest, or
//! pack every occurrence back-to-back from the start of the group. Nothing is
//! applied here; the caller picks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::ConflictGroup;
use crate::item::{Occurrence, OccurrenceId};

/// One proposed change to a single occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResolutionOption {
    Cancel {
        occurrence: OccurrenceId,
    },
    Move {
        occurrence: OccurrenceId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    },
}

impl ResolutionOption {
    pub fn occurrence(&self) -> &OccurrenceId {
        match self {
            ResolutionOption::Cancel { occurrence } | ResolutionOption::Move { occurrence, .. } => {
                occurrence
            }
        }
    }
}

/// Members ordered by priority: one-off commitments first, then recurring
/// ones, each class in group order.
pub fn priority_order(group: &ConflictGroup) -> Vec<&Occurrence> {
    let mut ranked: Vec<&Occurrence> = group.members.iter().collect();
    ranked.sort_by_key(|o| o.recurring);
    ranked
}

/// Propose cancel options, then move options, for `group`.
///
/// Packing starts at the group's earliest start and is not clamped to
/// working hours, so a move may land outside them.
pub fn suggest_resolutions(group: &ConflictGroup) -> Vec<ResolutionOption> {
    let ranked = priority_order(group);

    let mut options: Vec<ResolutionOption> = ranked
        .iter()
        .skip(1)
        .map(|o| ResolutionOption::Cancel { occurrence: o.id() })
        .collect();

    let mut cursor = group.span_start;
    for occurrence in &ranked {
        let Some(new_end) = cursor.checked_add_signed(occurrence.duration()) else {
            break;
        };
        if cursor != occurrence.start {
            options.push(ResolutionOption::Move {
                occurrence: occurrence.id(),
                new_start: cursor,
                new_end,
            });
        }
        cursor = new_end;
    }

    options
}
