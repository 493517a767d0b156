//! Loads the roster, questionnaire responses and published history that a
//! generation run consumes.

mod responses;
mod roster;

pub use responses::{assemble_volunteers, ResponseRecord};
pub use roster::Roster;

use crate::workflows::scheduling::history::HistoricalSnapshot;
use crate::workflows::scheduling::period::{PeriodError, SchedulePeriod};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid roster CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid period: {0}")]
    Period(#[from] PeriodError),
}

pub struct RosterImporter;

impl RosterImporter {
    /// Picks the format from the file extension; anything but `.csv` is JSON.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Roster, IntakeError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let is_csv = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            Self::from_csv_reader(file)
        } else {
            Self::from_json_reader(file)
        }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Roster, IntakeError> {
        Ok(roster::parse_json(reader)?)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Roster, IntakeError> {
        Ok(roster::parse_csv(reader)?)
    }
}

pub fn load_responses<P: AsRef<Path>>(path: P) -> Result<Vec<ResponseRecord>, IntakeError> {
    read_responses(File::open(path)?)
}

pub fn read_responses<R: Read>(reader: R) -> Result<Vec<ResponseRecord>, IntakeError> {
    Ok(responses::parse_responses(reader)?)
}

pub fn load_history<P: AsRef<Path>>(path: P) -> Result<Vec<HistoricalSnapshot>, IntakeError> {
    read_history(File::open(path)?)
}

pub fn read_history<R: Read>(reader: R) -> Result<Vec<HistoricalSnapshot>, IntakeError> {
    Ok(responses::parse_history(reader)?)
}

/// Normalizes month and year as typed by an operator (`"10"`, `" 2025 "`).
pub fn resolve_period(month: &str, year: &str) -> Result<SchedulePeriod, IntakeError> {
    Ok(SchedulePeriod::parse(month, year)?)
}
