mod config;
mod policy;
mod rules;

pub use config::{EngineConfig, DEFAULT_MONTHLY_CAP};
pub use policy::{ConfiguredHouseholdPolicy, HouseholdPolicy, HouseholdPreference};

use super::domain::{Assignment, EventOccurrence, HouseholdId, Volunteer, VolunteerId};
use super::history::HistoryAnalyzer;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Per-run assignment counters. A fresh context per generation run keeps
/// the engine itself free of mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    counts: HashMap<VolunteerId, u32>,
}

impl RunContext {
    pub fn count(&self, volunteer: &VolunteerId) -> u32 {
        self.counts.get(volunteer).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, volunteer: &VolunteerId) {
        *self.counts.entry(volunteer.clone()).or_insert(0) += 1;
    }

    pub fn into_counts(self) -> BTreeMap<VolunteerId, u32> {
        self.counts.into_iter().collect()
    }
}

/// Which fallback tier filled a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillTier {
    PreferredList,
    LegacyPreference,
    NotAvoided,
    LastResort,
}

/// Assigns volunteers to the positions of one occurrence at a time.
pub struct AssignmentEngine {
    config: EngineConfig,
    history: HistoryAnalyzer,
    households: Arc<dyn HouseholdPolicy>,
}

impl AssignmentEngine {
    pub fn new(config: EngineConfig, history: HistoryAnalyzer, households: Arc<dyn HouseholdPolicy>) -> Self {
        Self {
            config,
            history,
            households,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryAnalyzer {
        &self.history
    }

    /// Fills every required position of `occurrence`, leaving a vacant
    /// placeholder where no candidate qualifies. Counts in `context` are
    /// incremented for each volunteer placed.
    pub fn assign(&self, occurrence: &EventOccurrence, pool: &[Volunteer], context: &mut RunContext) -> Vec<Assignment> {
        let positions = occurrence.position_numbers();
        let cap = self.config.monthly_cap;
        let key = occurrence.key();

        let mut candidates = rules::available_candidates(occurrence, pool, context, cap);
        if occurrence.priority && candidates.len() < positions.len() {
            let added = rules::extend_with_substitutes(&mut candidates, pool, context, cap);
            info!(
                occurrence = %key,
                available = candidates.len() - added,
                substitutes = added,
                required = positions.len(),
                "priority occurrence short on volunteers; substitutes added"
            );
        }

        let ranked = rules::rank_candidates(candidates, &positions, occurrence, &self.history, context);

        let mut assigned: HashSet<&VolunteerId> = HashSet::new();
        let mut households_present: HashSet<&HouseholdId> = HashSet::new();
        let mut assignments = Vec::with_capacity(positions.len());

        for position in positions {
            let open: Vec<&Volunteer> = ranked
                .iter()
                .copied()
                .filter(|volunteer| !assigned.contains(&volunteer.id))
                .filter(|volunteer| self.household_permits(volunteer, &households_present))
                .collect();

            let position_fit = |volunteer: &Volunteer| self.history.score(&volunteer.id, &[position], &key);
            match pick(&open, position, position_fit) {
                Some((volunteer, tier)) => {
                    debug!(
                        occurrence = %key,
                        position,
                        volunteer = %volunteer.id,
                        ?tier,
                        "position filled"
                    );
                    assigned.insert(&volunteer.id);
                    if let Some(household) = &volunteer.household {
                        households_present.insert(household);
                    }
                    context.increment(&volunteer.id);
                    assignments.push(Assignment::confirmed(volunteer, position));
                }
                None => {
                    debug!(occurrence = %key, position, "position left vacant");
                    assignments.push(Assignment::vacant(position));
                }
            }
        }

        debug!(
            occurrence = %key,
            required = assignments.len(),
            filled = assignments.iter().filter(|assignment| !assignment.is_vacant()).count(),
            "occurrence assigned"
        );
        assignments
    }

    fn household_permits(&self, volunteer: &Volunteer, present: &HashSet<&HouseholdId>) -> bool {
        match &volunteer.household {
            Some(household) if present.contains(household) => self.households.allows_shared_service(household),
            _ => true,
        }
    }
}

/// Tiers one and two take the best-ranked match. Tiers three and four prefer
/// whoever historically held this exact position, falling back to rank order.
fn pick<'a>(
    open: &[&'a Volunteer],
    position: u8,
    position_fit: impl Fn(&Volunteer) -> f64,
) -> Option<(&'a Volunteer, FillTier)> {
    let tiers: [(FillTier, &dyn Fn(&Volunteer) -> bool); 4] = [
        (FillTier::PreferredList, &|v: &Volunteer| v.preferred_positions.contains(&position)),
        (FillTier::LegacyPreference, &|v: &Volunteer| v.preferred_position == Some(position)),
        (FillTier::NotAvoided, &|v: &Volunteer| !v.avoids(position)),
        (FillTier::LastResort, &|_: &Volunteer| true),
    ];

    tiers.iter().find_map(|(tier, accepts)| {
        let mut eligible = open.iter().copied().filter(|volunteer| accepts(*volunteer));
        let chosen = match tier {
            FillTier::PreferredList | FillTier::LegacyPreference => eligible.next(),
            FillTier::NotAvoided | FillTier::LastResort => best_fit(eligible, &position_fit),
        };
        chosen.map(|volunteer| (volunteer, *tier))
    })
}

/// Highest fit wins; the earliest candidate keeps a tie.
fn best_fit<'a>(
    candidates: impl Iterator<Item = &'a Volunteer>,
    fit: &impl Fn(&Volunteer) -> f64,
) -> Option<&'a Volunteer> {
    let mut best: Option<(&'a Volunteer, f64)> = None;
    for candidate in candidates {
        let score = fit(candidate);
        if best.map_or(true, |(_, leading)| score > leading) {
            best = Some((candidate, score));
        }
    }
    best.map(|(volunteer, _)| volunteer)
}
