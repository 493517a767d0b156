use super::domain::{EventOccurrence, Schedule, Volunteer, VolunteerId};
use super::slot::OccurrenceKey;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurrenceCoverage {
    pub occurrence: OccurrenceKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Display name for special services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    pub special: bool,
    pub required: usize,
    pub filled: usize,
    pub fill_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacancyEntry {
    pub occurrence: OccurrenceKey,
    pub position: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolunteerLoad {
    pub volunteer_id: VolunteerId,
    pub name: String,
    pub assignments: u32,
}

/// Coverage summary handed to operators alongside the schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub occurrences: Vec<OccurrenceCoverage>,
    pub total_positions: usize,
    pub filled_positions: usize,
    pub vacancies: Vec<VacancyEntry>,
    pub volunteer_load: Vec<VolunteerLoad>,
}

impl ScheduleReport {
    pub fn build(
        occurrences: &[EventOccurrence],
        schedule: &Schedule,
        volunteers: &[Volunteer],
        counts: &BTreeMap<VolunteerId, u32>,
    ) -> Self {
        let mut report = ScheduleReport::default();

        let mut chronological: Vec<&EventOccurrence> = occurrences.iter().collect();
        chronological.sort_by_key(|occurrence| occurrence.key());

        for occurrence in chronological {
            let key = occurrence.key();
            let assignments = schedule.get(&key).unwrap_or_default();
            let required = assignments.len();
            let filled = assignments.iter().filter(|a| !a.is_vacant()).count();

            report.vacancies.extend(
                assignments
                    .iter()
                    .filter(|assignment| assignment.is_vacant())
                    .map(|assignment| VacancyEntry {
                        occurrence: key,
                        position: assignment.position,
                    }),
            );
            report.total_positions += required;
            report.filled_positions += filled;
            report.occurrences.push(OccurrenceCoverage {
                occurrence: key,
                category: occurrence.category.clone(),
                label: occurrence.special_category().map(|category| category.label()),
                special: occurrence.special,
                required,
                filled,
                fill_rate: ratio(filled, required),
            });
        }

        report.volunteer_load = volunteers
            .iter()
            .map(|volunteer| VolunteerLoad {
                volunteer_id: volunteer.id.clone(),
                name: volunteer.name.clone(),
                assignments: counts.get(&volunteer.id).copied().unwrap_or(0),
            })
            .collect();
        report
            .volunteer_load
            .sort_by(|a, b| b.assignments.cmp(&a.assignments).then_with(|| a.name.cmp(&b.name)));

        report
    }

    pub fn fill_rate(&self) -> f64 {
        ratio(self.filled_positions, self.total_positions)
    }

    pub fn is_fully_staffed(&self) -> bool {
        self.vacancies.is_empty()
    }

    /// Volunteers who were not scheduled at all this period.
    pub fn idle_volunteers(&self) -> impl Iterator<Item = &VolunteerLoad> {
        self.volunteer_load.iter().filter(|load| load.assignments == 0)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}
