use crate::workflows::scheduling::calendar::DEFAULT_POSITIONS;
use crate::workflows::scheduling::engine::DEFAULT_MONTHLY_CAP;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub scheduling: SchedulingConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let monthly_cap = match env::var("SCHEDULER_MONTHLY_CAP") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidMonthlyCap(raw))?,
            Err(_) => DEFAULT_MONTHLY_CAP,
        };

        let default_positions = match env::var("SCHEDULER_DEFAULT_POSITIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|positions| *positions > 0)
                .ok_or(ConfigError::InvalidDefaultPositions(raw))?,
            Err(_) => DEFAULT_POSITIONS,
        };

        let calendar_path = env::var("SCHEDULER_CALENDAR_PATH")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            scheduling: SchedulingConfig {
                monthly_cap,
                default_positions,
                calendar_path,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Engine defaults an operator may override per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub monthly_cap: u32,
    pub default_positions: u8,
    pub calendar_path: Option<PathBuf>,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMonthlyCap(String),
    InvalidDefaultPositions(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMonthlyCap(raw) => {
                write!(f, "SCHEDULER_MONTHLY_CAP must be a non-negative integer, got '{raw}'")
            }
            ConfigError::InvalidDefaultPositions(raw) => {
                write!(f, "SCHEDULER_DEFAULT_POSITIONS must be between 1 and 255, got '{raw}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
