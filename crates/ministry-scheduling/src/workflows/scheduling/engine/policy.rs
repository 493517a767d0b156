use crate::workflows::scheduling::domain::HouseholdId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether members of one household may serve the same occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdPreference {
    #[default]
    ServeTogether,
    ServeSeparately,
}

impl HouseholdPreference {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ServeTogether => "Serve together",
            Self::ServeSeparately => "Serve separately",
        }
    }
}

/// Lookup seam for household co-scheduling rules.
pub trait HouseholdPolicy: Send + Sync {
    fn preference(&self, household: &HouseholdId) -> HouseholdPreference;

    fn allows_shared_service(&self, household: &HouseholdId) -> bool {
        self.preference(household) == HouseholdPreference::ServeTogether
    }
}

/// Household preferences loaded with the roster; unknown households fall
/// back to the configured default.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredHouseholdPolicy {
    preferences: HashMap<HouseholdId, HouseholdPreference>,
    default: HouseholdPreference,
}

impl ConfiguredHouseholdPolicy {
    pub fn new(preferences: HashMap<HouseholdId, HouseholdPreference>) -> Self {
        Self {
            preferences,
            default: HouseholdPreference::default(),
        }
    }

    pub fn with_default(mut self, default: HouseholdPreference) -> Self {
        self.default = default;
        self
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }
}

impl HouseholdPolicy for ConfiguredHouseholdPolicy {
    fn preference(&self, household: &HouseholdId) -> HouseholdPreference {
        self.preferences
            .get(household)
            .copied()
            .unwrap_or(self.default)
    }
}
