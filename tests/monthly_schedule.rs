use chrono::{TimeZone, Utc};
use ministry_scheduling::workflows::intake::{self, RosterImporter};
use ministry_scheduling::workflows::scheduling::{
    CalendarConfig, EngineConfig, HistoricalSnapshot, QuestionnaireParser, ScheduleGenerator,
};
use std::io::Cursor;
use std::sync::Arc;

const ROSTER_CSV: &str = "\
id,name,active,preferred_positions,avoided_positions,household
ana,Ana Souza,true,1,,souza
bia,Bia Lima,true,,1,
caio,Caio Souza,true,,,souza
duda,Duda Reis,false,,,
";

const RESPONSES: &str = r#"[
    {"volunteerId": "ana", "response": {"format_version": 2,
        "masses": {"2025-11-02": {"08:00": true}, "2025-11-09": {"08:00": true}},
        "weekdays": {"monday": true}}},
    {"volunteerId": "bia", "response": [
        {"questionId": "available_sundays", "answer": ["02/11", "09/11", "16/11"]},
        {"questionId": "main_service_time", "answer": "8h"}
    ], "weekdays": ["Quarta"]},
    {"volunteerId": "caio", "response": {"format_version": 2,
        "masses": {"2025-11-02": {"08:00": true, "10:00": true}}}}
]"#;

fn published_october() -> HistoricalSnapshot {
    serde_json::from_value(serde_json::json!({
        "publishedAt": Utc.with_ymd_and_hms(2025, 10, 25, 9, 0, 0).single().expect("valid timestamp"),
        "assignments": [
            {"date": "2025-11-02", "time": "08:00", "position": 1, "volunteerId": "ana"},
            {"date": "2025-11-02", "time": "08:00", "position": 2, "volunteerId": "bia"},
            {"date": "2025-11-02", "time": "08:00", "position": 3, "volunteerId": "duda"},
            {"date": "2025-11-02", "time": "08:00", "position": 4, "volunteerId": "VACANT"}
        ]
    }))
    .expect("snapshot deserializes")
}

#[test]
fn november_schedule_round_trips_through_intake_and_json() {
    let period = intake::resolve_period("11", "2025").expect("valid period");
    let roster = RosterImporter::from_csv_reader(Cursor::new(ROSTER_CSV)).expect("roster parses");
    let responses = intake::read_responses(Cursor::new(RESPONSES)).expect("responses parse");
    assert_eq!(roster.volunteers.len(), 3);

    let generator = ScheduleGenerator::new(
        EngineConfig::default(),
        CalendarConfig::parish_default(),
        Arc::new(roster.households),
        &[published_october()],
    );
    let parser = QuestionnaireParser::new(generator.parser_settings(period));
    let volunteers = intake::assemble_volunteers(roster.volunteers, &responses, &parser, period);

    let generated = generator.generate(period, &volunteers);

    // five Sundays with three masses, twenty weekdays with one
    assert_eq!(generated.occurrences.len(), 5 * 3 + 20);
    let first_mass = generated
        .schedule
        .iter()
        .find(|(key, _)| key.to_string() == "2025-11-02 08:00")
        .map(|(_, assignments)| assignments)
        .expect("first sunday mass scheduled");
    assert_eq!(first_mass.len(), 6);
    assert_eq!(first_mass[0].volunteer_id.as_str(), "ana");
    assert_eq!(first_mass[1].volunteer_id.as_str(), "bia");
    assert_eq!(first_mass[2].volunteer_id.as_str(), "caio");
    assert!(first_mass[3..].iter().all(|assignment| assignment.is_vacant()));

    let alignment = generated.alignment.expect("history supplied");
    assert_eq!(alignment.total, 3);
    assert_eq!(alignment.matches, 2);

    let json = serde_json::to_value(&generated).expect("schedule serializes");
    assert_eq!(json["period"]["year"], 2025);
    assert_eq!(json["schedule"]["2025-11-02 08:00"][0]["volunteer_name"], "Ana Souza");
    assert!(!json["report"]["vacancies"].as_array().expect("vacancy list").is_empty());
    for count in json["assignment_counts"].as_object().expect("counts object").values() {
        assert!(count.as_u64().expect("numeric count") <= 4);
    }
}
