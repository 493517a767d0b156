//! Questionnaire normalisation.
//!
//! Responses were collected by two generations of the availability form: an
//! ordered list of `{questionId, answer}` pairs, and a structured object tagged
//! with `format_version`. Both collapse into one [`Availability`] record.
//! Fragments that cannot be understood are skipped; parsing never fails.

mod legacy;
mod structured;

use super::domain::{Availability, WeekdayAvailability};
use super::period::SchedulePeriod;
use super::slot::SlotTime;
use chrono::{NaiveDate, Weekday};
use serde_json::Value;
use tracing::debug;

pub(crate) const FORMAT_VERSION_FIELD: &str = "format_version";

/// Knobs shared by both payload shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    /// Literal a volunteer picks to answer "yes".
    pub affirmative: String,
    /// Used when the preferred service time cannot be read.
    pub fallback_time: SlotTime,
    /// Date of the period's feast, if the calendar has one.
    pub feast_date: Option<NaiveDate>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            affirmative: "Sim".to_string(),
            fallback_time: SlotTime::from_hm(8, 0).expect("08:00 is a valid time"),
            feast_date: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionnaireParser {
    settings: ParserSettings,
}

impl QuestionnaireParser {
    pub fn new(settings: ParserSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn parse(&self, raw: &Value, period: SchedulePeriod) -> Availability {
        match raw {
            Value::Object(fields) if fields.contains_key(FORMAT_VERSION_FIELD) => {
                structured::parse(fields, &self.settings)
            }
            Value::Object(fields) => match fields.get("answers").or_else(|| fields.get("responses")) {
                Some(Value::Array(items)) => legacy::parse(items, period, &self.settings),
                _ => {
                    debug!("questionnaire object carries neither a version marker nor answers");
                    Availability::default()
                }
            },
            Value::Array(items) => legacy::parse(items, period, &self.settings),
            Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
                Ok(decoded) if !decoded.is_string() => self.parse(&decoded, period),
                _ => {
                    debug!("questionnaire string payload is not embedded JSON");
                    Availability::default()
                }
            },
            _ => Availability::default(),
        }
    }
}

pub(crate) fn is_affirmative(value: &Value, settings: &ParserSettings) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case(settings.affirmative.trim()),
        _ => false,
    }
}

/// Matches English keys and Portuguese day names (`segunda`, `terça`, ...).
pub(crate) fn weekday_from_label(label: &str) -> Option<Weekday> {
    let lowered = label.trim().to_lowercase();
    const NAMES: [(&str, Weekday); 11] = [
        ("segunda", Weekday::Mon),
        ("terça", Weekday::Tue),
        ("terca", Weekday::Tue),
        ("quarta", Weekday::Wed),
        ("quinta", Weekday::Thu),
        ("sexta", Weekday::Fri),
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
    ];
    NAMES
        .iter()
        .find(|(name, _)| lowered.contains(name))
        .map(|(_, day)| *day)
}

/// Builds the weekday set from a list of day labels such as the ones stored
/// next to a response as a convenience field.
pub fn weekdays_from_labels<S: AsRef<str>>(labels: &[S]) -> WeekdayAvailability {
    let mut weekdays = WeekdayAvailability::default();
    for label in labels {
        if let Some(day) = weekday_from_label(label.as_ref()) {
            weekdays.set(day, true);
        }
    }
    weekdays
}
