use crate::workflows::scheduling::availability::{weekdays_from_labels, QuestionnaireParser};
use crate::workflows::scheduling::domain::{Volunteer, VolunteerId};
use crate::workflows::scheduling::history::HistoricalSnapshot;
use crate::workflows::scheduling::period::SchedulePeriod;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

/// One volunteer's questionnaire submission for the period.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRecord {
    #[serde(alias = "volunteerId", alias = "minister_id", alias = "ministerId", alias = "user_id", alias = "userId")]
    pub volunteer_id: VolunteerId,
    /// Raw payload in either questionnaire shape.
    #[serde(default, alias = "responses", alias = "payload")]
    pub response: Value,
    /// Pre-extracted weekday labels; replaces the parsed weekday flags.
    #[serde(default, alias = "dailyMassDays", alias = "daily_mass_days")]
    pub weekdays: Option<Vec<String>>,
    #[serde(default, alias = "canSubstitute")]
    pub can_substitute: Option<bool>,
}

pub(crate) fn parse_responses<R: Read>(reader: R) -> Result<Vec<ResponseRecord>, serde_json::Error> {
    serde_json::from_reader(reader)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryDocument {
    Many(Vec<HistoricalSnapshot>),
    One(HistoricalSnapshot),
}

pub(crate) fn parse_history<R: Read>(reader: R) -> Result<Vec<HistoricalSnapshot>, serde_json::Error> {
    Ok(match serde_json::from_reader(reader)? {
        HistoryDocument::Many(snapshots) => snapshots,
        HistoryDocument::One(snapshot) => vec![snapshot],
    })
}

/// Attaches parsed availability to each roster volunteer. Volunteers without
/// a response keep an all-false availability; a later response for the same
/// volunteer replaces an earlier one.
pub fn assemble_volunteers(
    roster: Vec<Volunteer>,
    responses: &[ResponseRecord],
    parser: &QuestionnaireParser,
    period: SchedulePeriod,
) -> Vec<Volunteer> {
    let mut volunteers = roster;
    let index: HashMap<VolunteerId, usize> = volunteers
        .iter()
        .enumerate()
        .map(|(position, volunteer)| (volunteer.id.clone(), position))
        .collect();

    let mut applied = 0;
    for record in responses {
        let Some(&slot) = index.get(&record.volunteer_id) else {
            warn!(volunteer = %record.volunteer_id, "response for unknown or inactive volunteer skipped");
            continue;
        };

        let mut availability = parser.parse(&record.response, period);
        if let Some(labels) = &record.weekdays {
            availability.weekdays = weekdays_from_labels(labels);
        }
        if let Some(can_substitute) = record.can_substitute {
            availability.can_substitute = can_substitute;
        }

        volunteers[slot].availability = availability;
        applied += 1;
    }

    debug!(
        volunteers = volunteers.len(),
        responses = responses.len(),
        applied,
        "questionnaire responses attached"
    );
    volunteers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::scheduling::slot::{OccurrenceKey, SlotTime};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn october() -> SchedulePeriod {
        SchedulePeriod::new(10, 2025).expect("valid period")
    }

    #[test]
    fn overrides_replace_parsed_fields() {
        let json = r#"[
            {
                "volunteerId": "ana",
                "response": [
                    {"questionId": "daily_mass_availability", "answer": ["Segunda"]},
                    {"questionId": "can_substitute", "answer": "Sim"}
                ],
                "weekdays": ["Quinta", "Sexta"],
                "canSubstitute": false
            }
        ]"#;
        let responses = parse_responses(Cursor::new(json)).expect("responses parse");

        let volunteers = assemble_volunteers(
            vec![Volunteer::new("ana", "Ana")],
            &responses,
            &QuestionnaireParser::default(),
            october(),
        );

        let weekdays = volunteers[0].availability.weekdays;
        assert!(!weekdays.monday);
        assert!(weekdays.thursday);
        assert!(weekdays.friday);
        assert!(!volunteers[0].availability.can_substitute);
    }

    #[test]
    fn unknown_volunteers_are_skipped_and_missing_ones_stay_unavailable() {
        let json = r#"[
            {"volunteer_id": "ghost", "response": {"format_version": 2, "can_substitute": true}},
            {"volunteer_id": "ana", "response": {"format_version": 2, "masses": {"2025-10-05": {"08:00": true}}}}
        ]"#;
        let responses = parse_responses(Cursor::new(json)).expect("responses parse");

        let volunteers = assemble_volunteers(
            vec![Volunteer::new("ana", "Ana"), Volunteer::new("bia", "Bia")],
            &responses,
            &QuestionnaireParser::default(),
            october(),
        );

        assert_eq!(volunteers.len(), 2);
        let sunday = OccurrenceKey::new(
            NaiveDate::from_ymd_opt(2025, 10, 5).unwrap(),
            SlotTime::from_hm(8, 0).unwrap(),
        );
        assert!(volunteers[0].availability.is_available_at(&sunday));
        assert_eq!(volunteers[1].availability, Default::default());
    }

    #[test]
    fn history_accepts_one_snapshot_or_many() {
        let single = r#"{"published_at": "2025-09-01T12:00:00Z", "assignments": [
            {"date": "2025-09-07", "time": "08:00", "position": 1, "volunteer_id": "ana"}
        ]}"#;
        let snapshots = parse_history(Cursor::new(single)).expect("single snapshot");
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].assignments.len(), 1);

        let many = r#"[{"assignments": []}, {"publishedAt": null, "assignments": []}]"#;
        assert_eq!(parse_history(Cursor::new(many)).expect("snapshot list").len(), 2);
    }

    #[test]
    fn numeric_ids_line_up_across_roster_responses_and_history() {
        let roster = super::super::roster::parse_json(Cursor::new(r#"[{"id": 7, "name": "Ana"}]"#))
            .expect("roster parses");
        let responses = parse_responses(Cursor::new(
            r#"[{"volunteerId": 7, "response": {"format_version": 2, "masses": {"2025-10-05": {"08:00": true}}}}]"#,
        ))
        .expect("numeric response id accepted");
        let history = parse_history(Cursor::new(
            r#"{"assignments": [{"date": "2025-09-07", "time": "08:00", "position": 1, "volunteerId": 7}]}"#,
        ))
        .expect("numeric history id accepted");

        assert_eq!(responses[0].volunteer_id, VolunteerId::new("7"));
        assert_eq!(history[0].assignments[0].volunteer_id, Some(VolunteerId::new("7")));

        let volunteers = assemble_volunteers(roster.volunteers, &responses, &QuestionnaireParser::default(), october());
        let sunday = OccurrenceKey::new(
            NaiveDate::from_ymd_opt(2025, 10, 5).unwrap(),
            SlotTime::from_hm(8, 0).unwrap(),
        );
        assert!(volunteers[0].availability.is_available_at(&sunday));
    }
}
