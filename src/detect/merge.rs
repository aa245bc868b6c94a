//! Entity merger: one ordered, non-overlapping span list per text unit
//!
//! Detector and recognizer candidates may overlap freely (a card number that
//! also looks like a phone, a name straddling an email). The merger resolves
//! conflicts deterministically: structured regex matches are high-precision
//! and must never be suppressed by a noisy overlapping NER span.

use crate::types::{EntityType, Finding};

/// Merge raw candidates into an ascending, disjoint finding list.
///
/// The entity filter is applied *before* overlap resolution, so a
/// filtered-out PERSON can never block an EMAIL it happened to overlap.
/// Candidates are then sorted by start ascending, end descending (longer
/// match first on ties), and [`EntityType::priority`] for deterministic
/// tie-breaks, followed by a greedy left-to-right sweep.
pub fn merge_findings(
    mut candidates: Vec<Finding>,
    filter: Option<&[EntityType]>,
) -> Vec<Finding> {
    if let Some(allowed) = filter {
        candidates.retain(|f| allowed.contains(&f.entity_type));
    }

    if candidates.len() <= 1 {
        return candidates;
    }

    candidates.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(b.span.end.cmp(&a.span.end))
            .then(a.entity_type.priority().cmp(&b.entity_type.priority()))
    });

    let mut merged: Vec<Finding> = Vec::with_capacity(candidates.len());
    let mut last_end = 0;

    for finding in candidates {
        if !merged.is_empty() && finding.span.start < last_end {
            continue;
        }
        last_end = finding.span.end;
        merged.push(finding);
    }

    merged
}
