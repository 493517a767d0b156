//! Learning signal derived from previously published schedules.

use super::domain::VolunteerId;
use super::slot::{OccurrenceKey, SlotTime};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// A schedule that was published to volunteers in an earlier period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSnapshot {
    #[serde(default, alias = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignments: Vec<HistoricalAssignment>,
}

impl HistoricalSnapshot {
    /// Publication time, else the latest assignment date; `None` sorts oldest.
    fn recency_key(&self) -> Option<NaiveDateTime> {
        self.published_at.map(|at| at.naive_utc()).or_else(|| {
            self.assignments
                .iter()
                .map(|assignment| assignment.date)
                .max()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAssignment {
    pub date: NaiveDate,
    pub time: SlotTime,
    pub position: u8,
    #[serde(default, alias = "volunteerId", alias = "minister_id", alias = "ministerId")]
    pub volunteer_id: Option<VolunteerId>,
}

impl HistoricalAssignment {
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(self.date, self.time)
    }

    fn real_volunteer(&self) -> Option<&VolunteerId> {
        self.volunteer_id
            .as_ref()
            .filter(|id| !id.is_vacant() && !id.as_str().trim().is_empty())
    }
}

/// Weights applied to the most recent snapshots, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningWeights {
    pub snapshot_weights: Vec<f64>,
    pub recency_boosts: Vec<f64>,
    pub position_factor: f64,
    pub occurrence_factor: f64,
}

impl Default for LearningWeights {
    fn default() -> Self {
        Self {
            snapshot_weights: vec![1.0, 0.6, 0.3],
            recency_boosts: vec![0.10, 0.05, 0.02],
            position_factor: 0.65,
            occurrence_factor: 0.25,
        }
    }
}

impl LearningWeights {
    pub fn window(&self) -> usize {
        self.snapshot_weights.len().min(self.recency_boosts.len())
    }
}

/// Recency-weighted summary of where a volunteer has served.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LearningProfile {
    pub weighted_assignments: f64,
    pub raw_assignments: u32,
    pub position_weights: BTreeMap<u8, f64>,
    pub occurrence_weights: BTreeMap<OccurrenceKey, f64>,
    pub recency_boost: f64,
    pub dates: BTreeSet<NaiveDate>,
}

impl LearningProfile {
    fn record(&mut self, assignment: &HistoricalAssignment, weight: f64, boost: f64) {
        self.weighted_assignments += weight;
        self.raw_assignments += 1;
        *self.position_weights.entry(assignment.position).or_default() += weight;
        *self.occurrence_weights.entry(assignment.key()).or_default() += weight;
        if boost > self.recency_boost {
            self.recency_boost = boost;
        }
        self.dates.insert(assignment.date);
    }
}

/// Who held each (occurrence, position) slot in the retained history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoricalLookup {
    slots: HashMap<(OccurrenceKey, u8), VolunteerId>,
}

impl HistoricalLookup {
    pub fn get(&self, key: &OccurrenceKey, position: u8) -> Option<&VolunteerId> {
        self.slots.get(&(*key, position))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// First write wins.
    pub fn record(&mut self, key: OccurrenceKey, position: u8, volunteer: &VolunteerId) {
        self.slots
            .entry((key, position))
            .or_insert_with(|| volunteer.clone());
    }
}

/// Built once per generator; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct HistoryAnalyzer {
    weights: LearningWeights,
    profiles: HashMap<VolunteerId, LearningProfile>,
    lookup: HistoricalLookup,
    snapshots_used: usize,
}

impl HistoryAnalyzer {
    pub fn new(snapshots: &[HistoricalSnapshot], weights: LearningWeights) -> Self {
        let mut ordered: Vec<&HistoricalSnapshot> = snapshots.iter().collect();
        ordered.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
        ordered.truncate(weights.window());

        let mut profiles: HashMap<VolunteerId, LearningProfile> = HashMap::new();
        let mut lookup = HistoricalLookup::default();

        for (index, snapshot) in ordered.iter().enumerate() {
            let weight = weights.snapshot_weights[index];
            let boost = weights.recency_boosts[index];

            for assignment in &snapshot.assignments {
                let Some(volunteer) = assignment.real_volunteer() else {
                    continue;
                };
                profiles
                    .entry(volunteer.clone())
                    .or_default()
                    .record(assignment, weight, boost);
                lookup.record(assignment.key(), assignment.position, volunteer);
            }
        }

        let snapshots_used = ordered.len();
        debug!(
            snapshots_supplied = snapshots.len(),
            snapshots_used,
            volunteers = profiles.len(),
            slots = lookup.len(),
            "historical learning profiles built"
        );

        Self {
            weights,
            profiles,
            lookup,
            snapshots_used,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn profile(&self, volunteer: &VolunteerId) -> Option<&LearningProfile> {
        self.profiles.get(volunteer)
    }

    pub fn lookup(&self) -> &HistoricalLookup {
        &self.lookup
    }

    pub fn snapshots_used(&self) -> usize {
        self.snapshots_used
    }

    /// Soft ranking signal: how well this volunteer's history fits the
    /// positions on offer and this exact occurrence.
    pub fn score(&self, volunteer: &VolunteerId, candidate_positions: &[u8], occurrence: &OccurrenceKey) -> f64 {
        let Some(profile) = self.profiles.get(volunteer) else {
            return 0.0;
        };
        if profile.weighted_assignments <= 0.0 {
            return 0.0;
        }

        let best_position = candidate_positions
            .iter()
            .filter_map(|position| profile.position_weights.get(position))
            .copied()
            .fold(0.0_f64, f64::max);
        let occurrence_weight = profile
            .occurrence_weights
            .get(occurrence)
            .copied()
            .unwrap_or(0.0);

        let score = self.weights.position_factor * (best_position / profile.weighted_assignments)
            + self.weights.occurrence_factor * (occurrence_weight / profile.weighted_assignments)
            + profile.recency_boost;

        if score.is_finite() {
            score
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assignment(date: (i32, u32, u32), hour: u32, position: u8, volunteer: Option<&str>) -> HistoricalAssignment {
        HistoricalAssignment {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time: SlotTime::from_hm(hour, 0).unwrap(),
            position,
            volunteer_id: volunteer.map(VolunteerId::new),
        }
    }

    fn published(month: u32, assignments: Vec<HistoricalAssignment>) -> HistoricalSnapshot {
        HistoricalSnapshot {
            published_at: Some(Utc.with_ymd_and_hms(2025, month, 25, 12, 0, 0).unwrap()),
            assignments,
        }
    }

    #[test]
    fn newest_snapshot_gets_the_heaviest_weight() {
        let snapshots = vec![
            published(7, vec![assignment((2025, 8, 3), 8, 1, Some("ana"))]),
            published(8, vec![assignment((2025, 9, 7), 8, 2, Some("ana"))]),
        ];

        let analyzer = HistoryAnalyzer::new(&snapshots, LearningWeights::default());
        let profile = analyzer.profile(&VolunteerId::new("ana")).expect("profile");

        assert_eq!(profile.raw_assignments, 2);
        assert!((profile.weighted_assignments - 1.6).abs() < 1e-9);
        assert!((profile.position_weights[&2] - 1.0).abs() < 1e-9);
        assert!((profile.position_weights[&1] - 0.6).abs() < 1e-9);
        assert!((profile.recency_boost - 0.10).abs() < 1e-9);
        assert_eq!(profile.dates.len(), 2);
    }

    #[test]
    fn snapshots_beyond_the_window_are_ignored() {
        let snapshots = vec![
            published(5, vec![assignment((2025, 6, 1), 8, 1, Some("old"))]),
            published(6, vec![assignment((2025, 7, 6), 8, 1, Some("ana"))]),
            published(7, vec![assignment((2025, 8, 3), 8, 1, Some("ana"))]),
            published(8, vec![assignment((2025, 9, 7), 8, 1, Some("ana"))]),
        ];

        let analyzer = HistoryAnalyzer::new(&snapshots, LearningWeights::default());

        assert_eq!(analyzer.snapshots_used(), 3);
        assert!(analyzer.profile(&VolunteerId::new("old")).is_none());
    }

    #[test]
    fn undated_snapshots_fall_back_to_assignment_dates() {
        let undated_recent = HistoricalSnapshot {
            published_at: None,
            assignments: vec![assignment((2025, 9, 7), 8, 1, Some("recent"))],
        };
        let undated_old = HistoricalSnapshot {
            published_at: None,
            assignments: vec![assignment((2025, 6, 1), 8, 1, Some("older"))],
        };
        let empty = HistoricalSnapshot::default();

        let analyzer = HistoryAnalyzer::new(&[empty, undated_old, undated_recent], LearningWeights::default());

        let recent = analyzer.profile(&VolunteerId::new("recent")).unwrap();
        let older = analyzer.profile(&VolunteerId::new("older")).unwrap();
        assert!(recent.recency_boost > older.recency_boost);
    }

    #[test]
    fn vacant_and_missing_volunteers_are_not_profiled() {
        let snapshots = vec![published(
            9,
            vec![
                assignment((2025, 9, 7), 8, 1, None),
                assignment((2025, 9, 7), 8, 2, Some("VACANT")),
                assignment((2025, 9, 7), 8, 3, Some("ana")),
            ],
        )];

        let analyzer = HistoryAnalyzer::new(&snapshots, LearningWeights::default());

        assert!(analyzer.profile(&VolunteerId::vacant()).is_none());
        assert_eq!(analyzer.lookup().len(), 1);
    }

    #[test]
    fn lookup_keeps_most_recent_holder() {
        let slot = (2025, 9, 7);
        let snapshots = vec![
            published(8, vec![assignment(slot, 8, 1, Some("older"))]),
            published(9, vec![assignment(slot, 8, 1, Some("newer"))]),
        ];

        let analyzer = HistoryAnalyzer::new(&snapshots, LearningWeights::default());
        let key = assignment(slot, 8, 1, None).key();

        assert_eq!(analyzer.lookup().get(&key, 1), Some(&VolunteerId::new("newer")));
    }

    #[test]
    fn score_combines_position_occurrence_and_boost() {
        let snapshots = vec![published(
            9,
            vec![
                assignment((2025, 9, 7), 8, 1, Some("ana")),
                assignment((2025, 9, 14), 8, 1, Some("ana")),
                assignment((2025, 9, 21), 10, 3, Some("ana")),
                assignment((2025, 9, 28), 10, 3, Some("ana")),
            ],
        )];
        let analyzer = HistoryAnalyzer::new(&snapshots, LearningWeights::default());
        let ana = VolunteerId::new("ana");
        let seen = assignment((2025, 9, 7), 8, 1, None).key();
        let unseen = assignment((2025, 10, 5), 8, 1, None).key();

        let score = analyzer.score(&ana, &[1, 2], &seen);
        assert!((score - (0.65 * 0.5 + 0.25 * 0.25 + 0.10)).abs() < 1e-9);

        let score = analyzer.score(&ana, &[2], &unseen);
        assert!((score - 0.10).abs() < 1e-9);

        assert_eq!(analyzer.score(&VolunteerId::new("nobody"), &[1], &seen), 0.0);
    }
}
