use super::{is_affirmative, weekday_from_label, ParserSettings};
use crate::workflows::scheduling::domain::{Availability, SpecialEventCategory};
use crate::workflows::scheduling::slot::SlotTime;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;

pub(super) fn parse(fields: &Map<String, Value>, settings: &ParserSettings) -> Availability {
    let mut availability = Availability::default();

    if let Some(masses) = field(fields, &["masses", "occurrences"]).and_then(Value::as_object) {
        for (raw_date, slots) in masses {
            let Ok(date) = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d") else {
                debug!(date = %raw_date, "skipping structured entry with unreadable date");
                continue;
            };
            let Some(slots) = slots.as_object() else {
                continue;
            };
            for (raw_time, flag) in slots {
                match SlotTime::parse_lenient(raw_time) {
                    Some(time) => availability.mark(date, time, is_affirmative(flag, settings)),
                    None => debug!(time = %raw_time, "skipping structured slot with unreadable time"),
                }
            }
        }
    }

    if let Some(weekdays) = field(fields, &["weekdays", "daily"]).and_then(Value::as_object) {
        for (label, flag) in weekdays {
            if let Some(day) = weekday_from_label(label) {
                availability.weekdays.set(day, is_affirmative(flag, settings));
            }
        }
    }

    if let Some(special) = field(fields, &["special_events", "specialEvents"]).and_then(Value::as_object) {
        for (tag, flag) in special {
            if let Some(category) = SpecialEventCategory::from_key(tag) {
                availability.special_events.set(category, is_affirmative(flag, settings));
            }
        }
    }

    if let Some(flag) = field(fields, &["can_substitute", "canSubstitute"]) {
        availability.can_substitute = is_affirmative(flag, settings);
    }

    availability.notes = field(fields, &["notes", "observations"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    availability
}

fn field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}
