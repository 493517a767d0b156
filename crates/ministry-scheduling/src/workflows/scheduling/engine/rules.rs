use super::RunContext;
use crate::workflows::scheduling::domain::{EventOccurrence, Volunteer};
use crate::workflows::scheduling::history::HistoryAnalyzer;
use chrono::Datelike;
use std::cmp::Ordering;

/// Availability test for one volunteer against one occurrence.
pub(crate) fn is_available(volunteer: &Volunteer, occurrence: &EventOccurrence) -> bool {
    let availability = &volunteer.availability;

    if availability.is_available_at(&occurrence.key()) {
        return true;
    }

    if occurrence.weekday_pattern
        && !occurrence.special
        && availability.weekdays.get(occurrence.date.weekday())
    {
        return true;
    }

    occurrence.special
        && occurrence
            .special_category()
            .map(|category| availability.special_events.get(category))
            .unwrap_or(false)
}

pub(crate) fn available_candidates<'a>(
    occurrence: &EventOccurrence,
    pool: &'a [Volunteer],
    context: &RunContext,
    cap: u32,
) -> Vec<&'a Volunteer> {
    pool.iter()
        .filter(|volunteer| context.count(&volunteer.id) < cap)
        .filter(|volunteer| is_available(volunteer, occurrence))
        .collect()
}

/// Pulls in substitution-willing volunteers under the cap, regardless of
/// their stated availability. Returns how many were added.
pub(crate) fn extend_with_substitutes<'a>(
    candidates: &mut Vec<&'a Volunteer>,
    pool: &'a [Volunteer],
    context: &RunContext,
    cap: u32,
) -> usize {
    let before = candidates.len();
    for volunteer in pool {
        if volunteer.availability.can_substitute
            && context.count(&volunteer.id) < cap
            && !candidates.iter().any(|existing| existing.id == volunteer.id)
        {
            candidates.push(volunteer);
        }
    }
    candidates.len() - before
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankKey {
    pub prefers_required: bool,
    pub history_score: f64,
    pub legacy_in_required: bool,
    pub assignments: u32,
    pub legacy_position: Option<u8>,
}

impl RankKey {
    fn compare(&self, other: &Self) -> Ordering {
        other
            .prefers_required
            .cmp(&self.prefers_required)
            .then_with(|| other.history_score.total_cmp(&self.history_score))
            .then_with(|| other.legacy_in_required.cmp(&self.legacy_in_required))
            .then_with(|| self.assignments.cmp(&other.assignments))
            .then_with(|| match (self.legacy_position, other.legacy_position) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

/// Stable multi-key ordering: declared preference, historical fit, legacy
/// preference, fewest assignments so far, lowest legacy position.
pub(crate) fn rank_candidates<'a>(
    candidates: Vec<&'a Volunteer>,
    positions: &[u8],
    occurrence: &EventOccurrence,
    history: &HistoryAnalyzer,
    context: &RunContext,
) -> Vec<&'a Volunteer> {
    let key = occurrence.key();
    let mut keyed: Vec<(RankKey, &Volunteer)> = candidates
        .into_iter()
        .map(|volunteer| {
            let rank = RankKey {
                prefers_required: volunteer.prefers_any(positions),
                history_score: history.score(&volunteer.id, positions, &key),
                legacy_in_required: volunteer
                    .preferred_position
                    .map(|position| positions.contains(&position))
                    .unwrap_or(false),
                assignments: context.count(&volunteer.id),
                legacy_position: volunteer.preferred_position,
            };
            (rank, volunteer)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| a.compare(b));
    keyed.into_iter().map(|(_, volunteer)| volunteer).collect()
}
