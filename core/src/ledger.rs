//! Resource Ledger: pure arithmetic over a CityState's counters.
//!
//! Nothing here mutates state. The engine applies the results,
//! in the order documented in engine.rs.

use crate::{config::EconomyConfig, state::CityState, zone::ZoneType};

/// Treasury earned this tick:
/// Σ zone_counts[z] × per_zone_base_income[z] × (1 + tax_rate).
pub fn compute_income(state: &CityState, economy: &EconomyConfig) -> f64 {
    let base: f64 = state
        .zone_counts
        .iter()
        .map(|(zone, &count)| count as f64 * economy.per_zone_base_income[zone])
        .sum();
    (base * (1.0 + state.tax_rate)).max(0.0)
}

/// Population gained this tick:
/// residential parcels × base growth × (1 + Σ growth boosts).
pub fn compute_growth(state: &CityState, economy: &EconomyConfig) -> f64 {
    let boost: f64 = state.growth_boosts.iter().sum();
    let residential = state.zone_counts[ZoneType::Residential] as f64;
    (residential * economy.base_growth_rate * (1.0 + boost)).max(0.0)
}

/// The demand `zone` settles at after this tick.
///
/// Boosts are applied first and capped at the maximum; then a zone type
/// with at least one parcel loses the decay rate, floored at zero.
pub fn compute_demand_decay(state: &CityState, economy: &EconomyConfig, zone: ZoneType) -> f64 {
    let modifier = state.demand_boosts[zone];
    let boosted = (state.demand[zone] * (1.0 + modifier.percent) + modifier.flat)
        .min(economy.max_demand);
    let decay = if state.zone_counts[zone] > 0 {
        economy.demand_decay_rate
    } else {
        0.0
    };
    (boosted - decay).max(0.0)
}

/// Ticks of income needed before `cost` is affordable.
/// `Some(0)` if affordable now, `None` if there is no income.
pub fn ticks_until_affordable(state: &CityState, economy: &EconomyConfig, cost: f64) -> Option<u64> {
    let shortfall = cost - state.treasury;
    if shortfall <= 0.0 {
        return Some(0);
    }
    let income = compute_income(state, economy);
    if income <= 0.0 {
        return None;
    }
    let ticks = (shortfall / income).ceil();
    if ticks.is_finite() && ticks < u64::MAX as f64 {
        Some(ticks as u64)
    } else {
        None
    }
}
