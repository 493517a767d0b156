pub mod alignment;
pub mod availability;
pub mod calendar;
pub mod domain;
pub mod engine;
mod generator;
pub mod history;
pub mod period;
pub mod report;
pub mod slot;

#[cfg(test)]
mod tests;

pub use alignment::AlignmentSummary;
pub use availability::{ParserSettings, QuestionnaireParser};
pub use calendar::{CalendarConfig, CalendarError};
pub use domain::{
    Assignment, Availability, EventOccurrence, HouseholdId, Schedule, SpecialEventCategory, Volunteer,
    VolunteerId, VACANT,
};
pub use engine::{
    AssignmentEngine, ConfiguredHouseholdPolicy, EngineConfig, HouseholdPolicy, HouseholdPreference, RunContext,
};
pub use generator::{GeneratedSchedule, ScheduleGenerator};
pub use history::{HistoricalSnapshot, HistoryAnalyzer, LearningWeights};
pub use period::{PeriodError, SchedulePeriod};
pub use report::ScheduleReport;
pub use slot::{OccurrenceKey, SlotTime};
