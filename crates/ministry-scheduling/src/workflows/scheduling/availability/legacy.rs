use super::{is_affirmative, weekday_from_label, ParserSettings};
use crate::workflows::scheduling::domain::{
    Availability, SpecialEventCategory, WeekdayAvailability,
};
use crate::workflows::scheduling::period::SchedulePeriod;
use crate::workflows::scheduling::slot::SlotTime;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

pub(super) const FEAST_PREFIX: &str = "feast_mass_";
pub(super) const AVAILABLE_SUNDAYS: &str = "available_sundays";
pub(super) const MAIN_SERVICE_TIME: &str = "main_service_time";
pub(super) const DAILY_MASS: &str = "daily_mass_availability";
pub(super) const HEALING_LIBERATION: &str = "healing_liberation_mass";
pub(super) const SACRED_HEART: &str = "sacred_heart_mass";
pub(super) const IMMACULATE_HEART: &str = "immaculate_heart_mass";
pub(super) const CAN_SUBSTITUTE: &str = "can_substitute";

#[derive(Debug, Deserialize)]
struct LegacyAnswer {
    #[serde(rename = "questionId", alias = "question_id")]
    question_id: String,
    #[serde(default)]
    answer: Value,
}

pub(super) fn parse(items: &[Value], period: SchedulePeriod, settings: &ParserSettings) -> Availability {
    let mut availability = Availability::default();
    let mut sundays: Vec<NaiveDate> = Vec::new();
    let mut preferred_time: Option<SlotTime> = None;

    for item in items {
        let entry = match LegacyAnswer::deserialize(item) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping malformed questionnaire answer");
                continue;
            }
        };

        match entry.question_id.trim() {
            id if id.starts_with(FEAST_PREFIX) => {
                apply_feast_slot(&mut availability, &id[FEAST_PREFIX.len()..], &entry.answer, settings);
            }
            AVAILABLE_SUNDAYS => {
                sundays.extend(answer_texts(&entry.answer).iter().filter_map(|text| sunday_date(text, period)));
            }
            MAIN_SERVICE_TIME => {
                let time = entry
                    .answer
                    .as_str()
                    .and_then(SlotTime::parse_lenient)
                    .unwrap_or(settings.fallback_time);
                preferred_time = Some(time);
            }
            DAILY_MASS => {
                availability.weekdays = daily_mass_weekdays(&entry.answer, settings);
            }
            HEALING_LIBERATION => availability.special_events.set(
                SpecialEventCategory::HealingLiberation,
                is_affirmative(&entry.answer, settings),
            ),
            SACRED_HEART => availability.special_events.set(
                SpecialEventCategory::SacredHeart,
                is_affirmative(&entry.answer, settings),
            ),
            IMMACULATE_HEART => availability.special_events.set(
                SpecialEventCategory::ImmaculateHeart,
                is_affirmative(&entry.answer, settings),
            ),
            CAN_SUBSTITUTE => availability.can_substitute = is_affirmative(&entry.answer, settings),
            "notes" | "observations" => {
                if let Some(text) = entry.answer.as_str().map(str::trim).filter(|t| !t.is_empty()) {
                    availability.notes = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let time = preferred_time.unwrap_or(settings.fallback_time);
    for date in sundays {
        availability.mark(date, time, true);
    }

    availability
}

fn apply_feast_slot(availability: &mut Availability, suffix: &str, answer: &Value, settings: &ParserSettings) {
    let Some(date) = settings.feast_date else {
        debug!(slot = suffix, "feast answer ignored: no feast in this period");
        return;
    };
    match SlotTime::parse_lenient(suffix) {
        Some(time) => availability.mark(date, time, is_affirmative(answer, settings)),
        None => debug!(slot = suffix, "feast answer with unreadable time slot"),
    }
}

fn answer_texts(answer: &Value) -> Vec<&str> {
    match answer {
        Value::String(text) => vec![text.as_str()],
        Value::Array(values) => values.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn day_month_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{1,2})/(\d{1,2})").expect("day/month pattern compiles"))
}

fn sunday_date(text: &str, period: SchedulePeriod) -> Option<NaiveDate> {
    let captures = day_month_pattern().captures(text)?;
    let day = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let month = captures.get(2)?.as_str().parse::<u32>().ok()?;
    let date = NaiveDate::from_ymd_opt(period.year(), month, day);
    if date.is_none() {
        debug!(fragment = text, "sunday answer does not name a real date");
    }
    date
}

fn daily_mass_weekdays(answer: &Value, settings: &ParserSettings) -> WeekdayAvailability {
    if is_affirmative(answer, settings) {
        return WeekdayAvailability::all(true);
    }

    let mut weekdays = WeekdayAvailability::default();
    for label in answer_texts(answer) {
        if let Some(day) = weekday_from_label(label) {
            weekdays.set(day, true);
        }
    }
    weekdays
}
