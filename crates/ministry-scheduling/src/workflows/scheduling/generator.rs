use super::alignment::{self, AlignmentSummary};
use super::availability::ParserSettings;
use super::calendar::{self, CalendarConfig};
use super::domain::{EventOccurrence, Schedule, Volunteer, VolunteerId};
use super::engine::{AssignmentEngine, EngineConfig, HouseholdPolicy, RunContext};
use super::history::{HistoricalSnapshot, HistoryAnalyzer};
use super::period::SchedulePeriod;
use super::report::ScheduleReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one generation run produces.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSchedule {
    pub period: SchedulePeriod,
    pub occurrences: Vec<EventOccurrence>,
    pub schedule: Schedule,
    pub report: ScheduleReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentSummary>,
    pub assignment_counts: BTreeMap<VolunteerId, u32>,
}

/// Drives calendar expansion, assignment and evaluation for a period.
pub struct ScheduleGenerator {
    calendar: CalendarConfig,
    engine: AssignmentEngine,
}

impl ScheduleGenerator {
    pub fn new(
        config: EngineConfig,
        calendar: CalendarConfig,
        households: Arc<dyn HouseholdPolicy>,
        history: &[HistoricalSnapshot],
    ) -> Self {
        let analyzer = HistoryAnalyzer::new(history, config.learning.clone());
        Self {
            calendar,
            engine: AssignmentEngine::new(config, analyzer, households),
        }
    }

    pub fn calendar(&self) -> &CalendarConfig {
        &self.calendar
    }

    pub fn engine(&self) -> &AssignmentEngine {
        &self.engine
    }

    /// Occurrences in processing order: priority specials first.
    pub fn occurrences(&self, period: SchedulePeriod) -> Vec<EventOccurrence> {
        let mut occurrences = self.calendar.build_occurrences(period);
        calendar::prioritize(&mut occurrences);
        occurrences
    }

    /// Parser settings that know where this period's feast falls.
    pub fn parser_settings(&self, period: SchedulePeriod) -> ParserSettings {
        ParserSettings {
            feast_date: self.calendar.feast_date(period),
            ..ParserSettings::default()
        }
    }

    pub fn generate(&self, period: SchedulePeriod, volunteers: &[Volunteer]) -> GeneratedSchedule {
        let occurrences = self.occurrences(period);
        info!(
            %period,
            occurrences = occurrences.len(),
            volunteers = volunteers.len(),
            history_snapshots = self.engine.history().snapshots_used(),
            "generating schedule"
        );

        let mut context = RunContext::default();
        let mut schedule = Schedule::new();
        for occurrence in &occurrences {
            let assignments = self.engine.assign(occurrence, volunteers, &mut context);
            schedule.insert(occurrence.key(), assignments);
        }

        let assignment_counts = context.into_counts();
        let report = ScheduleReport::build(&occurrences, &schedule, volunteers, &assignment_counts);
        if !report.is_fully_staffed() {
            warn!(
                %period,
                vacancies = report.vacancies.len(),
                total_positions = report.total_positions,
                "schedule has unfilled positions"
            );
        }

        let alignment = alignment::evaluate(&schedule, self.engine.history().lookup());
        if let Some(summary) = &alignment {
            info!(
                total = summary.total,
                matches = summary.matches,
                match_rate = summary.match_rate,
                "alignment with most recent published schedule"
            );
        }

        info!(
            %period,
            filled = report.filled_positions,
            total = report.total_positions,
            idle_volunteers = report.idle_volunteers().count(),
            "schedule generated"
        );

        GeneratedSchedule {
            period,
            occurrences,
            schedule,
            report,
            alignment,
            assignment_counts,
        }
    }
}
