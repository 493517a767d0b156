//! Calendar configuration: which services happen in a period and how many
//! positions each one needs.

use super::domain::{EventOccurrence, SpecialEventCategory};
use super::period::SchedulePeriod;
use super::slot::SlotTime;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_POSITIONS: u8 = 5;

fn default_positions() -> u8 {
    DEFAULT_POSITIONS
}

/// A weekly service that repeats on the given weekdays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub weekdays: Vec<Weekday>,
    pub times: Vec<SlotTime>,
    #[serde(default)]
    pub category: Option<String>,
    /// Matched against volunteers' Monday-Friday flags.
    #[serde(default)]
    pub weekday_pattern: bool,
}

/// An explicit special service on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialEventRule {
    pub date: NaiveDate,
    pub times: Vec<SlotTime>,
    pub category: String,
    #[serde(default)]
    pub priority: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRule {
    pub category: String,
    #[serde(default)]
    pub time: Option<SlotTime>,
    pub positions: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub recurring: Vec<RecurringRule>,
    #[serde(default)]
    pub special_events: Vec<SpecialEventRule>,
    #[serde(default)]
    pub position_rules: Vec<PositionRule>,
    #[serde(default = "default_positions")]
    pub default_positions: u8,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            recurring: Vec::new(),
            special_events: Vec::new(),
            position_rules: Vec::new(),
            default_positions: DEFAULT_POSITIONS,
        }
    }
}

impl CalendarConfig {
    /// Sunday services at 08:00, 10:00 and 19:00 plus a 06:30 weekday
    /// service. Special dates are never implied; add them explicitly.
    pub fn parish_default() -> Self {
        let at = |hour, minute| SlotTime::from_hm(hour, minute).expect("literal service time");
        Self {
            recurring: vec![
                RecurringRule {
                    weekdays: vec![Weekday::Sun],
                    times: vec![at(8, 0), at(10, 0), at(19, 0)],
                    category: Some("sunday".to_string()),
                    weekday_pattern: false,
                },
                RecurringRule {
                    weekdays: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
                    times: vec![at(6, 30)],
                    category: Some("weekday".to_string()),
                    weekday_pattern: true,
                },
            ],
            special_events: Vec::new(),
            position_rules: vec![
                PositionRule {
                    category: "sunday".to_string(),
                    time: None,
                    positions: 6,
                },
                PositionRule {
                    category: "weekday".to_string(),
                    time: None,
                    positions: 2,
                },
                PositionRule {
                    category: "feast".to_string(),
                    time: None,
                    positions: 8,
                },
            ],
            default_positions: DEFAULT_POSITIONS,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CalendarError> {
        Self::from_path_with_default_positions(path, DEFAULT_POSITIONS)
    }

    /// `default_positions` applies only when the file does not set its own.
    pub fn from_path_with_default_positions<P: AsRef<Path>>(
        path: P,
        default_positions: u8,
    ) -> Result<Self, CalendarError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader_with_default_positions(file, default_positions)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CalendarError> {
        Self::from_reader_with_default_positions(reader, DEFAULT_POSITIONS)
    }

    pub fn from_reader_with_default_positions<R: Read>(
        reader: R,
        default_positions: u8,
    ) -> Result<Self, CalendarError> {
        let mut raw: serde_json::Value = serde_json::from_reader(reader)?;
        if let Some(fields) = raw.as_object_mut() {
            fields
                .entry("default_positions")
                .or_insert_with(|| serde_json::Value::from(default_positions));
        }
        let config: Self = serde_json::from_value(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.default_positions == 0 {
            return Err(CalendarError::ZeroPositions("default".to_string()));
        }
        if let Some(rule) = self.position_rules.iter().find(|rule| rule.positions == 0) {
            return Err(CalendarError::ZeroPositions(rule.category.clone()));
        }
        Ok(())
    }

    /// Exact category+time rules beat category-wide rules; otherwise the default.
    pub fn required_positions(&self, category: Option<&str>, time: SlotTime) -> u8 {
        let Some(category) = category else {
            return self.default_positions;
        };
        let matching = || {
            self.position_rules
                .iter()
                .filter(move |rule| rule.category.eq_ignore_ascii_case(category))
        };

        matching()
            .find(|rule| rule.time == Some(time))
            .or_else(|| matching().find(|rule| rule.time.is_none()))
            .map(|rule| rule.positions)
            .unwrap_or(self.default_positions)
    }

    /// First feast-category special date inside the period.
    pub fn feast_date(&self, period: SchedulePeriod) -> Option<NaiveDate> {
        self.special_events
            .iter()
            .filter(|event| period.contains(event.date))
            .filter(|event| SpecialEventCategory::from_key(&event.category) == Some(SpecialEventCategory::Feast))
            .map(|event| event.date)
            .min()
    }

    /// Every occurrence in the period in chronological order. A special event
    /// at the same date and time as a recurring service replaces it.
    pub fn build_occurrences(&self, period: SchedulePeriod) -> Vec<EventOccurrence> {
        let mut occurrences = BTreeMap::new();

        for day in period.days() {
            for rule in self.recurring.iter().filter(|rule| rule.weekdays.contains(&day.weekday())) {
                for time in &rule.times {
                    let occurrence = EventOccurrence {
                        date: day,
                        time: *time,
                        special: false,
                        priority: false,
                        weekday_pattern: rule.weekday_pattern,
                        category: rule.category.clone(),
                        required_positions: self.required_positions(rule.category.as_deref(), *time),
                    };
                    occurrences.insert(occurrence.key(), occurrence);
                }
            }
        }

        for event in self.special_events.iter().filter(|event| period.contains(event.date)) {
            for time in &event.times {
                let occurrence = EventOccurrence {
                    date: event.date,
                    time: *time,
                    special: true,
                    priority: event.priority,
                    weekday_pattern: false,
                    category: Some(event.category.clone()),
                    required_positions: self.required_positions(Some(&event.category), *time),
                };
                occurrences.insert(occurrence.key(), occurrence);
            }
        }

        occurrences.into_values().collect()
    }
}

/// Orders occurrences so scarce volunteers go to priority specials first,
/// then other specials, then regular services. Stable within each tier.
pub fn prioritize(occurrences: &mut [EventOccurrence]) {
    occurrences.sort_by_key(|occurrence| match (occurrence.priority, occurrence.special) {
        (true, true) => 0,
        (_, true) => 1,
        (true, false) => 2,
        (false, false) => 3,
    });
}

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("failed to read calendar configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid calendar configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("position rule '{0}' must require at least one position")]
    ZeroPositions(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn october() -> SchedulePeriod {
        SchedulePeriod::new(10, 2025).unwrap()
    }

    fn at(hour: u32, minute: u32) -> SlotTime {
        SlotTime::from_hm(hour, minute).unwrap()
    }

    fn with_feast() -> CalendarConfig {
        let mut config = CalendarConfig::parish_default();
        config.special_events.push(SpecialEventRule {
            date: NaiveDate::from_ymd_opt(2025, 10, 12).unwrap(),
            times: vec![at(10, 0), at(15, 0)],
            category: "feast".to_string(),
            priority: true,
        });
        config.special_events.push(SpecialEventRule {
            date: NaiveDate::from_ymd_opt(2025, 10, 3).unwrap(),
            times: vec![at(19, 30)],
            category: "sacred_heart".to_string(),
            priority: false,
        });
        config.special_events.push(SpecialEventRule {
            date: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
            times: vec![at(10, 0)],
            category: "feast".to_string(),
            priority: true,
        });
        config
    }

    #[test]
    fn parish_default_produces_sundays_and_weekdays() {
        let occurrences = CalendarConfig::parish_default().build_occurrences(october());

        // October 2025: 4 Sundays, 23 weekdays.
        let sundays = occurrences.iter().filter(|o| o.day_of_week() == 0).count();
        let weekdays = occurrences.iter().filter(|o| o.weekday_pattern).count();
        assert_eq!(sundays, 4 * 3);
        assert_eq!(weekdays, 23);
        assert!(occurrences.windows(2).all(|pair| pair[0].key() < pair[1].key()));
        assert!(occurrences.iter().all(|o| !o.special));
    }

    #[test]
    fn special_events_replace_matching_recurring_slots() {
        let occurrences = with_feast().build_occurrences(october());

        let feast_morning = occurrences
            .iter()
            .find(|o| o.date == NaiveDate::from_ymd_opt(2025, 10, 12).unwrap() && o.time == at(10, 0))
            .expect("feast occurrence");
        assert!(feast_morning.special);
        assert!(feast_morning.priority);
        assert_eq!(feast_morning.required_positions, 8);

        let same_day = occurrences
            .iter()
            .filter(|o| o.date == NaiveDate::from_ymd_opt(2025, 10, 12).unwrap())
            .count();
        assert_eq!(same_day, 4, "08:00, 10:00 (feast), 15:00 (feast), 19:00");
        assert!(occurrences.iter().all(|o| october().contains(o.date)));
    }

    #[test]
    fn required_positions_prefers_exact_time_rules() {
        let mut config = CalendarConfig::parish_default();
        config.position_rules.push(PositionRule {
            category: "sunday".to_string(),
            time: Some(at(10, 0)),
            positions: 9,
        });

        assert_eq!(config.required_positions(Some("sunday"), at(10, 0)), 9);
        assert_eq!(config.required_positions(Some("sunday"), at(8, 0)), 6);
        assert_eq!(config.required_positions(Some("unknown"), at(8, 0)), DEFAULT_POSITIONS);
        assert_eq!(config.required_positions(None, at(8, 0)), DEFAULT_POSITIONS);
    }

    #[test]
    fn prioritize_puts_priority_specials_first() {
        let mut occurrences = with_feast().build_occurrences(october());
        prioritize(&mut occurrences);

        assert!(occurrences[0].priority && occurrences[0].special);
        assert!(occurrences[1].priority && occurrences[1].special);
        assert_eq!(occurrences[2].category.as_deref(), Some("sacred_heart"));
        assert!(occurrences[3..].iter().all(|o| !o.special));
        assert!(occurrences[3..].windows(2).all(|pair| pair[0].key() < pair[1].key()));
    }

    #[test]
    fn feast_date_is_scoped_to_the_period() {
        let config = with_feast();
        assert_eq!(config.feast_date(october()), NaiveDate::from_ymd_opt(2025, 10, 12));
        assert_eq!(
            config.feast_date(SchedulePeriod::new(11, 2025).unwrap()),
            NaiveDate::from_ymd_opt(2025, 11, 2)
        );
        assert_eq!(config.feast_date(SchedulePeriod::new(12, 2025).unwrap()), None);
    }

    #[test]
    fn reader_rejects_zero_position_rules() {
        let json = r#"{"position_rules": [{"category": "sunday", "positions": 0}]}"#;
        match CalendarConfig::from_reader(json.as_bytes()) {
            Err(CalendarError::ZeroPositions(category)) => assert_eq!(category, "sunday"),
            other => panic!("expected zero positions error, got {other:?}"),
        }
    }

    #[test]
    fn reader_accepts_json_configuration() {
        let json = r#"{
            "recurring": [{"weekdays": ["Sun"], "times": ["9h"], "category": "sunday"}],
            "special_events": [{"date": "2025-10-28", "times": ["19:00"], "category": "feast", "priority": true}]
        }"#;
        let config = CalendarConfig::from_reader(json.as_bytes()).expect("valid config");
        assert_eq!(config.default_positions, DEFAULT_POSITIONS);
        let occurrences = config.build_occurrences(october());
        assert_eq!(occurrences.len(), 4 + 1);
        assert!(occurrences.iter().any(|o| o.time == at(9, 0)));
    }

    #[test]
    fn configured_default_positions_fill_in_only_when_the_file_is_silent() {
        let silent = r#"{"recurring": [{"weekdays": ["Sun"], "times": ["08:00"], "category": "sunday"}]}"#;
        let config = CalendarConfig::from_reader_with_default_positions(silent.as_bytes(), 3).expect("valid config");
        assert_eq!(config.default_positions, 3);
        assert_eq!(config.required_positions(Some("sunday"), at(8, 0)), 3);

        let explicit = r#"{"default_positions": 6}"#;
        let config = CalendarConfig::from_reader_with_default_positions(explicit.as_bytes(), 3).expect("valid config");
        assert_eq!(config.default_positions, 6);
    }
}
