use crate::workflows::scheduling::history::LearningWeights;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MONTHLY_CAP: u32 = 4;

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Most assignments one volunteer may receive within a period.
    pub monthly_cap: u32,
    pub learning: LearningWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monthly_cap: DEFAULT_MONTHLY_CAP,
            learning: LearningWeights::default(),
        }
    }
}
