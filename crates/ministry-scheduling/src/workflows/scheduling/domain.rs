use super::slot::{OccurrenceKey, SlotTime};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel id and display name carried by unfilled positions.
pub const VACANT: &str = "VACANT";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VolunteerId(pub String);

impl VolunteerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn vacant() -> Self {
        Self(VACANT.to_string())
    }

    pub fn is_vacant(&self) -> bool {
        self.0 == VACANT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for VolunteerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawIdentifier::deserialize(deserializer).map(|raw| Self(raw.into_text()))
    }
}

impl fmt::Display for VolunteerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HouseholdId(pub String);

impl HouseholdId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HouseholdId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawIdentifier::deserialize(deserializer).map(|raw| Self(raw.into_text()))
    }
}

/// Identifiers arrive as text or as bare numbers depending on the export.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawIdentifier {
    Number(i64),
    Text(String),
}

impl RawIdentifier {
    pub(crate) fn into_text(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

/// Special service categories volunteers can opt into as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialEventCategory {
    Feast,
    HealingLiberation,
    SacredHeart,
    ImmaculateHeart,
}

impl SpecialEventCategory {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Feast,
            Self::HealingLiberation,
            Self::SacredHeart,
            Self::ImmaculateHeart,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Feast => "feast",
            Self::HealingLiberation => "healing_liberation",
            Self::SacredHeart => "sacred_heart",
            Self::ImmaculateHeart => "immaculate_heart",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Feast => "Patronal Feast",
            Self::HealingLiberation => "Healing and Liberation",
            Self::SacredHeart => "Sacred Heart of Jesus",
            Self::ImmaculateHeart => "Immaculate Heart of Mary",
        }
    }

    /// Matches both `sacred_heart` and `sacredHeart` style tags.
    pub fn from_key(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|category| category.key().replace('_', "") == folded)
    }
}

/// Monday to Friday flags for recurring weekday services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekdayAvailability {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
}

impl WeekdayAvailability {
    pub fn all(value: bool) -> Self {
        Self {
            monday: value,
            tuesday: value,
            wednesday: value,
            thursday: value,
            friday: value,
        }
    }

    pub fn get(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat | Weekday::Sun => false,
        }
    }

    /// Weekend days are ignored; there is no flag for them.
    pub fn set(&mut self, day: Weekday, value: bool) {
        match day {
            Weekday::Mon => self.monday = value,
            Weekday::Tue => self.tuesday = value,
            Weekday::Wed => self.wednesday = value,
            Weekday::Thu => self.thursday = value,
            Weekday::Fri => self.friday = value,
            Weekday::Sat | Weekday::Sun => {}
        }
    }

    pub fn any(&self) -> bool {
        self.monday || self.tuesday || self.wednesday || self.thursday || self.friday
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialEventAvailability {
    pub feast: bool,
    pub healing_liberation: bool,
    pub sacred_heart: bool,
    pub immaculate_heart: bool,
}

impl SpecialEventAvailability {
    pub fn get(&self, category: SpecialEventCategory) -> bool {
        match category {
            SpecialEventCategory::Feast => self.feast,
            SpecialEventCategory::HealingLiberation => self.healing_liberation,
            SpecialEventCategory::SacredHeart => self.sacred_heart,
            SpecialEventCategory::ImmaculateHeart => self.immaculate_heart,
        }
    }

    pub fn set(&mut self, category: SpecialEventCategory, value: bool) {
        match category {
            SpecialEventCategory::Feast => self.feast = value,
            SpecialEventCategory::HealingLiberation => self.healing_liberation = value,
            SpecialEventCategory::SacredHeart => self.sacred_heart = value,
            SpecialEventCategory::ImmaculateHeart => self.immaculate_heart = value,
        }
    }
}

/// Canonical availability for one volunteer and one period.
///
/// The weekday and special-event sets are plain structs, so every flag is
/// always present and defaults to `false` when the questionnaire was silent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default)]
    pub masses: BTreeMap<NaiveDate, BTreeMap<SlotTime, bool>>,
    #[serde(default)]
    pub weekdays: WeekdayAvailability,
    #[serde(default)]
    pub special_events: SpecialEventAvailability,
    #[serde(default)]
    pub can_substitute: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Availability {
    pub fn mark(&mut self, date: NaiveDate, time: SlotTime, available: bool) {
        self.masses.entry(date).or_default().insert(time, available);
    }

    pub fn is_available_at(&self, key: &OccurrenceKey) -> bool {
        self.masses
            .get(&key.date)
            .and_then(|slots| slots.get(&key.time))
            .copied()
            .unwrap_or(false)
    }
}

/// Volunteer as seen by the engine. Per-run assignment counts live in the
/// engine's run context, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: VolunteerId,
    pub name: String,
    #[serde(default)]
    pub preferred_position: Option<u8>,
    #[serde(default)]
    pub preferred_positions: Vec<u8>,
    #[serde(default)]
    pub avoided_positions: Vec<u8>,
    #[serde(default)]
    pub household: Option<HouseholdId>,
    #[serde(default)]
    pub availability: Availability,
}

impl Volunteer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: VolunteerId::new(id),
            name: name.into(),
            preferred_position: None,
            preferred_positions: Vec::new(),
            avoided_positions: Vec::new(),
            household: None,
            availability: Availability::default(),
        }
    }

    pub fn prefers_any(&self, positions: &[u8]) -> bool {
        self.preferred_positions
            .iter()
            .any(|position| positions.contains(position))
    }

    pub fn avoids(&self, position: u8) -> bool {
        self.avoided_positions.contains(&position)
    }
}

/// One scheduled service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOccurrence {
    pub date: NaiveDate,
    pub time: SlotTime,
    #[serde(default)]
    pub special: bool,
    /// Highest-priority occurrences pick first and may pull in substitutes.
    #[serde(default)]
    pub priority: bool,
    /// Recurring weekday service matched against the weekday flags.
    #[serde(default)]
    pub weekday_pattern: bool,
    #[serde(default)]
    pub category: Option<String>,
    pub required_positions: u8,
}

impl EventOccurrence {
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(self.date, self.time)
    }

    /// 0 = Sunday.
    pub fn day_of_week(&self) -> u8 {
        self.date.weekday().num_days_from_sunday() as u8
    }

    pub fn special_category(&self) -> Option<SpecialEventCategory> {
        self.category
            .as_deref()
            .and_then(SpecialEventCategory::from_key)
    }

    pub fn position_numbers(&self) -> Vec<u8> {
        (1..=self.required_positions).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub volunteer_id: VolunteerId,
    pub volunteer_name: String,
    pub position: u8,
    pub confirmed: bool,
}

impl Assignment {
    pub fn confirmed(volunteer: &Volunteer, position: u8) -> Self {
        Self {
            volunteer_id: volunteer.id.clone(),
            volunteer_name: volunteer.name.clone(),
            position,
            confirmed: true,
        }
    }

    pub fn vacant(position: u8) -> Self {
        Self {
            volunteer_id: VolunteerId::vacant(),
            volunteer_name: VACANT.to_string(),
            position,
            confirmed: false,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.volunteer_id.is_vacant()
    }
}

/// Generated assignments keyed by occurrence, each list ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    occurrences: BTreeMap<OccurrenceKey, Vec<Assignment>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: OccurrenceKey, assignments: Vec<Assignment>) {
        self.occurrences.insert(key, assignments);
    }

    pub fn get(&self, key: &OccurrenceKey) -> Option<&[Assignment]> {
        self.occurrences.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OccurrenceKey, &[Assignment])> {
        self.occurrences
            .iter()
            .map(|(key, assignments)| (key, assignments.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn vacancy_count(&self) -> usize {
        self.occurrences
            .values()
            .flatten()
            .filter(|assignment| assignment.is_vacant())
            .count()
    }
}
