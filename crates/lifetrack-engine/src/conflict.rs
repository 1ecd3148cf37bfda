//! Detect overlapping occurrences and group them transitively.
//!
//! Two occurrences overlap when `a.start < b.end && b.start < a.end`.
//! Adjacent occurrences (where one ends exactly when another starts) are NOT
//! conflicts. Groups are the connected components of the overlap graph, so a
//! chain A-B-C lands in one group even when A and C do not touch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::item::Occurrence;

/// A maximal set of occurrences connected by pairwise overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictGroup {
    /// At least two members, ascending by start (input order for ties).
    pub members: Vec<Occurrence>,
    /// Earliest start across the group.
    pub span_start: DateTime<Utc>,
    /// Latest end across the group.
    pub span_end: DateTime<Utc>,
}

impl ConflictGroup {
    pub fn contains(&self, occurrence: &Occurrence) -> bool {
        self.members.iter().any(|m| m == occurrence)
    }
}

/// Half-open interval overlap between two occurrences.
pub fn overlaps(a: &Occurrence, b: &Occurrence) -> bool {
    a.start < b.end && b.start < a.end
}

/// Minutes shared by two occurrences, or `None` when they do not overlap.
pub fn overlap_minutes(a: &Occurrence, b: &Occurrence) -> Option<i64> {
    overlaps(a, b).then(|| (a.end.min(b.end) - a.start.max(b.start)).num_minutes())
}

/// Partition `occurrences` into conflict groups.
///
/// Occurrences are scanned in start order; for each one only the followers
/// that start before it ends are compared, which covers every overlapping
/// pair. Groups come back ordered by their span start.
pub fn detect_conflicts(occurrences: &[Occurrence]) -> Vec<ConflictGroup> {
    let mut order: Vec<usize> = (0..occurrences.len()).collect();
    order.sort_by_key(|&i| occurrences[i].start);

    let mut sets = DisjointSet::new(occurrences.len());
    for (pos, &i) in order.iter().enumerate() {
        let a = &occurrences[i];
        for &j in &order[pos + 1..] {
            let b = &occurrences[j];
            if b.start >= a.end {
                break;
            }
            if overlaps(a, b) {
                sets.union(i, j);
            }
        }
    }

    // Bucket members by root, walking in start order so buckets stay sorted.
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); occurrences.len()];
    for &i in &order {
        let root = sets.find(i);
        buckets[root].push(i);
    }

    let mut groups: Vec<ConflictGroup> = buckets
        .into_iter()
        .filter(|members| members.len() >= 2)
        .map(|members| {
            let members: Vec<Occurrence> = members.into_iter().map(|i| occurrences[i].clone()).collect();
            let span_start = members.iter().map(|m| m.start).min().unwrap_or_default();
            let span_end = members.iter().map(|m| m.end).max().unwrap_or_default();
            ConflictGroup {
                members,
                span_start,
                span_end,
            }
        })
        .collect();
    groups.sort_by_key(|g| g.span_start);

    debug!(
        occurrences = occurrences.len(),
        groups = groups.len(),
        "detected conflicts"
    );
    groups
}

/// Union-find over occurrence positions, with path halving and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}
