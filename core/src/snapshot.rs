//! Read models for whatever renders the city.
//!
//! A CityView is a copy of the engine's state plus the derived numbers
//! a front end shows next to it. Holding one never blocks the engine.

use crate::{
    catalog::UpgradeCategory,
    engine::CityEngine,
    ledger,
    state::CityState,
    types::{Tick, UpgradeId},
};
use serde::Serialize;

/// Ticks between journal snapshots of the full state.
pub const SNAPSHOT_INTERVAL: Tick = 60;

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeListing {
    pub id:                     UpgradeId,
    pub display_name:           String,
    pub cost:                   f64,
    pub category:               UpgradeCategory,
    pub affordable:             bool,
    /// None when the city has no income to save up with.
    pub ticks_until_affordable: Option<Tick>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityView {
    pub state:              CityState,
    pub date:               String,
    pub income_per_tick:    f64,
    pub growth_per_tick:    f64,
    pub available_upgrades: Vec<UpgradeListing>,
}

impl CityView {
    pub fn capture(engine: &CityEngine) -> Self {
        let state = engine.snapshot();
        let available_upgrades = engine
            .list_available()
            .into_iter()
            .map(|u| UpgradeListing {
                id:                     u.id.clone(),
                display_name:           u.display_name.clone(),
                cost:                   u.cost,
                category:               u.category(),
                affordable:             state.treasury >= u.cost,
                ticks_until_affordable: ledger::ticks_until_affordable(state, engine.economy(), u.cost),
            })
            .collect();

        Self {
            state:              state.clone(),
            date:               engine
                .calendar_date()
                .map(|d| d.format("%a, %b %d, %Y").to_string())
                .unwrap_or_else(|| "Distant Future".into()),
            income_per_tick:    engine.income_per_tick(),
            growth_per_tick:    engine.growth_per_tick(),
            available_upgrades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneType;

    #[test]
    fn view_carries_date_rates_and_listings() {
        let mut engine = CityEngine::standard();
        engine.zone(ZoneType::Commercial).unwrap();
        engine.run_ticks(3);

        let view = CityView::capture(&engine);
        assert_eq!(view.date, "Thu, Jan 04, 2024");
        assert_eq!(view.state.treasury, 6.0);
        assert_eq!(view.income_per_tick, 2.0);
        assert_eq!(view.growth_per_tick, 0.0);

        let first = &view.available_upgrades[0];
        assert_eq!(first.id, "tax_hike_1");
        assert!(!first.affordable);
        assert_eq!(first.ticks_until_affordable, Some(2));
    }
}
