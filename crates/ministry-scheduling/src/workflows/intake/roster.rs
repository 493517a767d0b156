use crate::workflows::scheduling::domain::{HouseholdId, RawIdentifier, Volunteer};
use crate::workflows::scheduling::engine::{ConfiguredHouseholdPolicy, HouseholdPreference};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Active volunteers plus the household rules that travel with them.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub volunteers: Vec<Volunteer>,
    pub households: ConfiguredHouseholdPolicy,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RosterRecord {
    #[serde(alias = "volunteer_id", alias = "volunteerId", deserialize_with = "identifier")]
    id: String,
    #[serde(alias = "full_name", alias = "fullName")]
    name: String,
    #[serde(default = "active_by_default", alias = "isActive", alias = "is_active", deserialize_with = "flag")]
    active: bool,
    #[serde(default, alias = "preferredPosition", deserialize_with = "optional_position")]
    preferred_position: Option<u8>,
    #[serde(default, alias = "preferredPositions", deserialize_with = "position_list")]
    preferred_positions: Vec<u8>,
    #[serde(default, alias = "avoidedPositions", deserialize_with = "position_list")]
    avoided_positions: Vec<u8>,
    #[serde(
        default,
        alias = "household_id",
        alias = "householdId",
        alias = "family_id",
        alias = "familyId",
        deserialize_with = "empty_string_as_none"
    )]
    household: Option<String>,
}

impl RosterRecord {
    fn into_volunteer(self) -> Volunteer {
        let mut volunteer = Volunteer::new(self.id.trim(), self.name.trim());
        volunteer.preferred_position = self.preferred_position;
        volunteer.preferred_positions = self.preferred_positions;
        volunteer.avoided_positions = self.avoided_positions;
        volunteer.household = self.household.map(|id| HouseholdId::new(id.trim()));
        volunteer
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HouseholdRecord {
    #[serde(alias = "household_id", alias = "householdId", deserialize_with = "identifier")]
    id: String,
    #[serde(default = "active_by_default", alias = "serveTogether", deserialize_with = "flag")]
    serve_together: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterDocument {
    Listing(Vec<RosterRecord>),
    Full {
        volunteers: Vec<RosterRecord>,
        #[serde(default)]
        households: Vec<HouseholdRecord>,
    },
}

pub(crate) fn parse_json<R: Read>(reader: R) -> Result<Roster, serde_json::Error> {
    let (records, households) = match serde_json::from_reader(reader)? {
        RosterDocument::Listing(records) => (records, Vec::new()),
        RosterDocument::Full {
            volunteers,
            households,
        } => (volunteers, households),
    };
    Ok(build(records, households))
}

pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<Roster, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<RosterRecord>() {
        records.push(record?);
    }

    Ok(build(records, Vec::new()))
}

fn build(records: Vec<RosterRecord>, households: Vec<HouseholdRecord>) -> Roster {
    let total = records.len();
    let volunteers: Vec<Volunteer> = records
        .into_iter()
        .filter(|record| record.active)
        .map(RosterRecord::into_volunteer)
        .collect();

    let preferences: HashMap<HouseholdId, HouseholdPreference> = households
        .into_iter()
        .map(|record| {
            let preference = if record.serve_together {
                HouseholdPreference::ServeTogether
            } else {
                HouseholdPreference::ServeSeparately
            };
            let household = HouseholdId::new(record.id.trim());
            debug!(%household, preference = preference.label(), "household preference recorded");
            (household, preference)
        })
        .collect();

    debug!(
        records = total,
        active = volunteers.len(),
        households = preferences.len(),
        "roster loaded"
    );

    Roster {
        volunteers,
        households: ConfiguredHouseholdPolicy::new(preferences),
    }
}

fn active_by_default() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = RawIdentifier::deserialize(deserializer)?.into_text();
    if value.trim().is_empty() {
        return Err(serde::de::Error::custom("identifier must be a non-empty string or number"));
    }
    Ok(value)
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match value {
        None => true,
        Some(Scalar::Bool(value)) => value,
        Some(Scalar::Number(value)) => value != 0,
        Some(Scalar::Text(value)) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "false" | "0" | "no" | "nao" | "não" | "inactive" | "inativo"
        ),
    })
}

fn parse_position(raw: &str) -> Option<u8> {
    raw.trim().parse::<u8>().ok().filter(|position| *position > 0)
}

fn optional_position<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Number(value)) => u8::try_from(value).ok().filter(|position| *position > 0),
        Some(Scalar::Text(value)) => parse_position(&value),
        _ => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionList {
    List(Vec<u8>),
    Single(u8),
    Text(String),
}

fn position_list<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<PositionList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(PositionList::List(positions)) => positions.into_iter().filter(|p| *p > 0).collect(),
        Some(PositionList::Single(position)) => Some(position).filter(|p| *p > 0).into_iter().collect(),
        Some(PositionList::Text(raw)) => raw.split([';', ',']).filter_map(parse_position).collect(),
    })
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match value {
        Some(Scalar::Text(value)) if !value.trim().is_empty() => Some(value),
        Some(Scalar::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}
