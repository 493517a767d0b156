use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::workflows::scheduling::domain::{EventOccurrence, HouseholdId, Volunteer, VolunteerId};
use crate::workflows::scheduling::engine::{
    AssignmentEngine, ConfiguredHouseholdPolicy, EngineConfig, HouseholdPreference,
};
use crate::workflows::scheduling::history::{
    HistoricalAssignment, HistoricalSnapshot, HistoryAnalyzer,
};
use crate::workflows::scheduling::period::SchedulePeriod;
use crate::workflows::scheduling::slot::SlotTime;

pub(super) fn october() -> SchedulePeriod {
    SchedulePeriod::new(10, 2025).expect("valid period")
}

pub(super) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> SlotTime {
    SlotTime::from_hm(hour, minute).expect("valid time")
}

pub(super) fn sunday_mass(day: u32, hour: u32, positions: u8) -> EventOccurrence {
    EventOccurrence {
        date: date(10, day),
        time: time(hour, 0),
        special: false,
        priority: false,
        weekday_pattern: false,
        category: Some("sunday".to_string()),
        required_positions: positions,
    }
}

pub(super) fn priority_special(day: u32, hour: u32, category: &str, positions: u8) -> EventOccurrence {
    EventOccurrence {
        date: date(10, day),
        time: time(hour, 0),
        special: true,
        priority: true,
        weekday_pattern: false,
        category: Some(category.to_string()),
        required_positions: positions,
    }
}

/// Volunteer who said yes to exactly the given occurrences.
pub(super) fn volunteer(id: &str, available_for: &[&EventOccurrence]) -> Volunteer {
    let mut volunteer = Volunteer::new(id, id.to_uppercase());
    for occurrence in available_for {
        volunteer.availability.mark(occurrence.date, occurrence.time, true);
    }
    volunteer
}

pub(super) fn in_household(mut volunteer: Volunteer, household: &str) -> Volunteer {
    volunteer.household = Some(HouseholdId::new(household));
    volunteer
}

pub(super) fn engine_with_cap(cap: u32) -> AssignmentEngine {
    AssignmentEngine::new(
        EngineConfig {
            monthly_cap: cap,
            ..EngineConfig::default()
        },
        HistoryAnalyzer::empty(),
        Arc::new(ConfiguredHouseholdPolicy::default()),
    )
}

pub(super) fn engine_with_history(snapshots: &[HistoricalSnapshot]) -> AssignmentEngine {
    let config = EngineConfig::default();
    let history = HistoryAnalyzer::new(snapshots, config.learning.clone());
    AssignmentEngine::new(config, history, Arc::new(ConfiguredHouseholdPolicy::default()))
}

pub(super) fn engine_with_household(household: &str, preference: HouseholdPreference) -> AssignmentEngine {
    let mut preferences = HashMap::new();
    preferences.insert(HouseholdId::new(household), preference);
    AssignmentEngine::new(
        EngineConfig::default(),
        HistoryAnalyzer::empty(),
        Arc::new(ConfiguredHouseholdPolicy::new(preferences)),
    )
}

pub(super) fn served(occurrence: &EventOccurrence, position: u8, volunteer: &str) -> HistoricalAssignment {
    HistoricalAssignment {
        date: occurrence.date,
        time: occurrence.time,
        position,
        volunteer_id: Some(VolunteerId::new(volunteer)),
    }
}

pub(super) fn snapshot_published(month: u32, assignments: Vec<HistoricalAssignment>) -> HistoricalSnapshot {
    HistoricalSnapshot {
        published_at: Some(
            Utc.with_ymd_and_hms(2025, month, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        ),
        assignments,
    }
}
