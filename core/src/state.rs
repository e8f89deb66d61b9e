//! The authoritative city state.
//!
//! RULE: Only the engine mutates a CityState. Everything else reads a
//! snapshot. The Persistence Gateway rebuilds one from disk.

use crate::{
    config::EconomyConfig,
    types::{Tick, UpgradeId},
    zone::PerZone,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityState {
    pub city_name:       String,
    pub treasury:        f64,
    pub population:      f64,
    pub zone_counts:     PerZone<u64>,
    /// Bounded by the economy's demand range.
    pub demand:          PerZone<f64>,
    /// Sorted, so the save file and listings are reproducible.
    pub owned_upgrades:  BTreeSet<UpgradeId>,
    pub tax_rate:        f64,
    pub day:             Tick,
    /// Magnitudes of every growth boost bought, in purchase order.
    pub growth_boosts:   Vec<f64>,
    pub demand_boosts:   PerZone<DemandModifier>,
    pub rename_unlocked: bool,
}

/// Per-tick demand replenishment folded in by demand-boost upgrades.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemandModifier {
    pub flat:    f64,
    pub percent: f64,
}

impl CityState {
    /// A fresh city: empty counters, starting demand, default name.
    pub fn new(economy: &EconomyConfig) -> Self {
        Self {
            city_name:       economy.default_city_name.clone(),
            treasury:        0.0,
            population:      0.0,
            zone_counts:     PerZone::default(),
            demand:          PerZone::splat(economy.initial_demand),
            owned_upgrades:  BTreeSet::new(),
            tax_rate:        0.0,
            day:             0,
            growth_boosts:   Vec::new(),
            demand_boosts:   PerZone::default(),
            rename_unlocked: false,
        }
    }

    pub fn owns(&self, id: &str) -> bool {
        self.owned_upgrades.contains(id)
    }
}

impl Default for CityState {
    fn default() -> Self {
        Self::new(&EconomyConfig::default())
    }
}
