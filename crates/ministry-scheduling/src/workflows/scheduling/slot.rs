use chrono::{NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Time of day at which a service starts, always rendered as zero-padded `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Accepts the spellings volunteers actually type: `8h`, `8h30`, `19H`, `8:00`, `08:00`.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().to_ascii_lowercase();
        if cleaned.is_empty() {
            return None;
        }

        let captures = slot_pattern().captures(&cleaned)?;
        let hour = captures.get(1)?.as_str().parse::<u32>().ok()?;
        let minute = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .ok()?
            .unwrap_or(0);

        Self::from_hm(hour, minute)
    }

    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    pub fn minute(self) -> u32 {
        self.0.minute()
    }
}

fn slot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?:\s*h\s*(\d{1,2})?|:(\d{2}))$").expect("slot time pattern compiles")
    })
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a recognised time of day")]
pub struct SlotTimeError(pub String);

impl FromStr for SlotTime {
    type Err = SlotTimeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(value).ok_or_else(|| SlotTimeError(value.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifies one occurrence of a service: the date plus its starting time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub date: NaiveDate,
    pub time: SlotTime,
}

impl OccurrenceKey {
    pub fn new(date: NaiveDate, time: SlotTime) -> Self {
        Self { date, time }
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid occurrence key (expected YYYY-MM-DD HH:MM)")]
pub struct OccurrenceKeyError(pub String);

impl FromStr for OccurrenceKey {
    type Err = OccurrenceKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (date, time) = trimmed
            .split_once([' ', 'T', '_'])
            .ok_or_else(|| OccurrenceKeyError(value.to_string()))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| OccurrenceKeyError(value.to_string()))?;
        let time = SlotTime::parse_lenient(time).ok_or_else(|| OccurrenceKeyError(value.to_string()))?;
        Ok(Self { date, time })
    }
}

impl Serialize for OccurrenceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OccurrenceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parse_normalizes_common_spellings() {
        let eight = SlotTime::from_hm(8, 0).unwrap();
        assert_eq!(SlotTime::parse_lenient("8h"), Some(eight));
        assert_eq!(SlotTime::parse_lenient(" 08:00 "), Some(eight));
        assert_eq!(SlotTime::parse_lenient("8:00"), Some(eight));
        assert_eq!(
            SlotTime::parse_lenient("19H30"),
            SlotTime::from_hm(19, 30)
        );
        assert_eq!(SlotTime::parse_lenient("6h 30"), SlotTime::from_hm(6, 30));
    }

    #[test]
    fn lenient_parse_rejects_garbage_and_out_of_range() {
        assert!(SlotTime::parse_lenient("").is_none());
        assert!(SlotTime::parse_lenient("morning").is_none());
        assert!(SlotTime::parse_lenient("25h").is_none());
        assert!(SlotTime::parse_lenient("10:75").is_none());
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(SlotTime::from_hm(7, 5).unwrap().to_string(), "07:05");
    }

    #[test]
    fn occurrence_key_round_trips_through_text() {
        let key: OccurrenceKey = "2025-10-05 08:00".parse().expect("valid key");
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2025, 10, 5).unwrap());
        assert_eq!(key.to_string(), "2025-10-05 08:00");

        let underscored: OccurrenceKey = "2025-10-05_8h".parse().expect("valid key");
        assert_eq!(underscored, key);
        assert!("2025-10-05".parse::<OccurrenceKey>().is_err());
    }

    #[test]
    fn keys_serialize_as_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(
            OccurrenceKey::new(
                NaiveDate::from_ymd_opt(2025, 10, 5).unwrap(),
                SlotTime::from_hm(10, 0).unwrap(),
            ),
            1,
        );
        let json = serde_json::to_string(&map).expect("serializes");
        assert_eq!(json, r#"{"2025-10-05 10:00":1}"#);
    }
}
