use super::domain::Schedule;
use super::history::HistoricalLookup;
use serde::{Deserialize, Serialize};

/// How many generated slots reproduce the most recent human-made schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    pub total: usize,
    pub matches: usize,
    pub match_rate: f64,
}

/// Observational only; `None` when there is no history to compare against.
pub fn evaluate(schedule: &Schedule, lookup: &HistoricalLookup) -> Option<AlignmentSummary> {
    if lookup.is_empty() {
        return None;
    }

    let mut total = 0;
    let mut matches = 0;
    for (key, assignments) in schedule.iter() {
        for assignment in assignments {
            let Some(historical) = lookup.get(key, assignment.position) else {
                continue;
            };
            total += 1;
            if *historical == assignment.volunteer_id {
                matches += 1;
            }
        }
    }

    let match_rate = if total > 0 {
        matches as f64 / total as f64
    } else {
        0.0
    };

    Some(AlignmentSummary {
        total,
        matches,
        match_rate,
    })
}
