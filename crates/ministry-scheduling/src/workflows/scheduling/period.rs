use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target month for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct SchedulePeriod {
    month: u32,
    year: i32,
}

impl SchedulePeriod {
    pub fn new(month: u32, year: i32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange(month));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(PeriodError::InvalidYear(year.to_string()));
        }
        Ok(Self { month, year })
    }

    /// Normalizes month/year supplied as text (form fields, CLI, query strings).
    pub fn parse(month: &str, year: &str) -> Result<Self, PeriodError> {
        let month = month
            .trim()
            .parse::<u32>()
            .map_err(|_| PeriodError::InvalidMonth(month.to_string()))?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| PeriodError::InvalidYear(year.to_string()))?;
        Self::new(month, year)
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn first_day(self) -> NaiveDate {
        // Validated in `new`.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or_else(|| self.first_day())
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |day| *day <= last)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for SchedulePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("month '{0}' is not numeric")]
    InvalidMonth(String),
    #[error("year '{0}' is not a usable calendar year")]
    InvalidYear(String),
    #[error("month {0} is outside 1-12")]
    MonthOutOfRange(u32),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PeriodComponent {
    Number(i64),
    Text(String),
}

impl PeriodComponent {
    fn into_text(self) -> String {
        match self {
            PeriodComponent::Number(value) => value.to_string(),
            PeriodComponent::Text(value) => value,
        }
    }
}

#[derive(Deserialize)]
struct RawPeriod {
    month: PeriodComponent,
    year: PeriodComponent,
}

impl TryFrom<RawPeriod> for SchedulePeriod {
    type Error = PeriodError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::parse(&raw.month.into_text(), &raw.year.into_text())
    }
}
