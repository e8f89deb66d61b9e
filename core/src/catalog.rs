//! Upgrade Catalog: static definitions of every purchasable upgrade,
//! and the rules for folding an upgrade's effect into a CityState.
//!
//! The catalog is read-only once built. The engine checks funds;
//! the catalog checks existence, ownership and prerequisites.

use crate::{
    error::{CityError, CityResult},
    state::CityState,
    types::UpgradeId,
    zone::ZoneType,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Which zone types an upgrade reaches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ZoneScope {
    Global,
    Residential,
    Commercial,
    Industrial,
}

impl ZoneScope {
    pub fn zones(&self) -> &'static [ZoneType] {
        match self {
            Self::Global      => &ZoneType::ALL,
            Self::Residential => &[ZoneType::Residential],
            Self::Commercial  => &[ZoneType::Commercial],
            Self::Industrial  => &[ZoneType::Industrial],
        }
    }
}

impl From<ZoneType> for ZoneScope {
    fn from(zone: ZoneType) -> Self {
        match zone {
            ZoneType::Residential => Self::Residential,
            ZoneType::Commercial  => Self::Commercial,
            ZoneType::Industrial  => Self::Industrial,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DemandBonus {
    /// Demand points added every tick.
    Flat(f64),
    /// Fraction of current demand added every tick.
    Percent(f64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UpgradeCategory {
    DemandBoost,
    GrowthBoost,
    TaxBoost,
    #[serde(rename = "cosmetic-rename-unlock")]
    RenameUnlock,
}

/// What buying an upgrade does. Each variant carries only what it needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum UpgradeEffect {
    DemandBoost {
        applies_to: ZoneScope,
        bonus:      DemandBonus,
    },
    GrowthBoost {
        amount: f64,
    },
    TaxBoost {
        amount: f64,
    },
    #[serde(rename = "cosmetic-rename-unlock")]
    RenameUnlock,
}

impl UpgradeEffect {
    pub fn category(&self) -> UpgradeCategory {
        match self {
            Self::DemandBoost { .. } => UpgradeCategory::DemandBoost,
            Self::GrowthBoost { .. } => UpgradeCategory::GrowthBoost,
            Self::TaxBoost { .. }    => UpgradeCategory::TaxBoost,
            Self::RenameUnlock       => UpgradeCategory::RenameUnlock,
        }
    }

    pub fn applies_to(&self) -> ZoneScope {
        match self {
            Self::DemandBoost { applies_to, .. } => *applies_to,
            _ => ZoneScope::Global,
        }
    }

    pub fn magnitude(&self) -> f64 {
        match self {
            Self::DemandBoost { bonus: DemandBonus::Flat(v), .. }
            | Self::DemandBoost { bonus: DemandBonus::Percent(v), .. } => *v,
            Self::GrowthBoost { amount } | Self::TaxBoost { amount } => *amount,
            Self::RenameUnlock => 0.0,
        }
    }

    /// Fold this effect into the state. Ownership and treasury are
    /// the caller's business.
    fn fold_into(&self, state: &mut CityState) {
        match *self {
            Self::DemandBoost { applies_to, bonus } => {
                for &zone in applies_to.zones() {
                    let modifier = &mut state.demand_boosts[zone];
                    match bonus {
                        DemandBonus::Flat(v)    => modifier.flat += v,
                        DemandBonus::Percent(v) => modifier.percent += v,
                    }
                }
            }
            Self::GrowthBoost { amount } => state.growth_boosts.push(amount),
            Self::TaxBoost { amount }    => state.tax_rate += amount,
            Self::RenameUnlock           => state.rename_unlocked = true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Upgrade {
    pub id:           UpgradeId,
    pub display_name: String,
    pub cost:         f64,
    #[serde(flatten)]
    pub effect:       UpgradeEffect,
    #[serde(default)]
    pub repeatable:   bool,
    #[serde(default)]
    pub prerequisite: Option<UpgradeId>,
}

impl Upgrade {
    fn new(id: &str, display_name: &str, cost: f64, effect: UpgradeEffect) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            cost,
            effect,
            repeatable: false,
            prerequisite: None,
        }
    }

    fn requires(mut self, prerequisite: &str) -> Self {
        self.prerequisite = Some(prerequisite.into());
        self
    }

    fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn category(&self) -> UpgradeCategory {
        self.effect.category()
    }
}

#[derive(Debug, Clone)]
pub struct UpgradeCatalog {
    /// Sorted by ascending cost, ties by id.
    upgrades: Vec<Upgrade>,
    index:    HashMap<UpgradeId, usize>,
}

impl UpgradeCatalog {
    /// Build a catalog, rejecting duplicate ids, dangling or circular
    /// prerequisites, and non-finite or negative numbers.
    pub fn from_defs(mut upgrades: Vec<Upgrade>) -> CityResult<Self> {
        let mut seen = HashSet::new();
        for upgrade in &upgrades {
            if upgrade.id.trim().is_empty() {
                return Err(CityError::InvalidConfig("upgrade with empty id".into()));
            }
            if !seen.insert(upgrade.id.as_str()) {
                return Err(CityError::InvalidConfig(format!(
                    "duplicate upgrade id '{}'",
                    upgrade.id
                )));
            }
            if !upgrade.cost.is_finite() || upgrade.cost < 0.0 {
                return Err(CityError::InvalidConfig(format!(
                    "upgrade '{}' has invalid cost {}",
                    upgrade.id, upgrade.cost
                )));
            }
            let magnitude = upgrade.effect.magnitude();
            if !magnitude.is_finite() || magnitude < 0.0 {
                return Err(CityError::InvalidConfig(format!(
                    "upgrade '{}' has invalid magnitude {magnitude}",
                    upgrade.id
                )));
            }
        }
        for upgrade in &upgrades {
            if let Some(prereq) = &upgrade.prerequisite {
                if !seen.contains(prereq.as_str()) {
                    return Err(CityError::InvalidConfig(format!(
                        "upgrade '{}' requires unknown upgrade '{prereq}'",
                        upgrade.id
                    )));
                }
            }
        }

        upgrades.sort_by(|a, b| a.cost.total_cmp(&b.cost).then_with(|| a.id.cmp(&b.id)));
        let index = upgrades
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id.clone(), i))
            .collect();
        let catalog = Self { upgrades, index };

        // A chain longer than the catalog must loop.
        for upgrade in &catalog.upgrades {
            let mut cursor = upgrade.prerequisite.as_deref();
            let mut steps = 0;
            while let Some(id) = cursor {
                steps += 1;
                if steps > catalog.upgrades.len() {
                    return Err(CityError::InvalidConfig(format!(
                        "upgrade '{}' has a circular prerequisite chain",
                        upgrade.id
                    )));
                }
                cursor = catalog.get(id).and_then(|u| u.prerequisite.as_deref());
            }
        }

        Ok(catalog)
    }

    /// The built-in catalog, built once per process.
    pub fn standard() -> &'static UpgradeCatalog {
        static STANDARD: OnceLock<UpgradeCatalog> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Self::from_defs(standard_upgrades()).unwrap_or_else(|e| {
                // The built-in list is covered by tests; reaching this is a bug.
                panic!("built-in upgrade catalog is invalid: {e}")
            })
        })
    }

    pub fn get(&self, id: &str) -> Option<&Upgrade> {
        self.index.get(id).map(|&i| &self.upgrades[i])
    }

    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.iter()
    }

    /// Upgrades the city could buy now, ignoring funds.
    /// Ordered by ascending cost, ties broken by id.
    pub fn list_available(&self, state: &CityState) -> Vec<&Upgrade> {
        self.upgrades
            .iter()
            .filter(|u| Self::purchasable(state, u).is_ok())
            .collect()
    }

    /// Look up `id` and run the ownership and prerequisite checks.
    pub fn check_purchase(&self, state: &CityState, id: &str) -> CityResult<&Upgrade> {
        let upgrade = self
            .get(id)
            .ok_or_else(|| CityError::UnknownUpgrade { id: id.to_string() })?;
        Self::purchasable(state, upgrade)?;
        Ok(upgrade)
    }

    /// Fold `upgrade`'s effect into `state`. Fails without touching the
    /// state if the upgrade is unknown, already owned, or locked.
    pub fn apply_effect(&self, state: &mut CityState, upgrade: &Upgrade) -> CityResult<()> {
        let upgrade = self.check_purchase(state, &upgrade.id)?;
        upgrade.effect.fold_into(state);
        Ok(())
    }

    fn purchasable(state: &CityState, upgrade: &Upgrade) -> CityResult<()> {
        if !upgrade.repeatable && state.owns(&upgrade.id) {
            return Err(CityError::AlreadyOwned { id: upgrade.id.clone() });
        }
        if let Some(prereq) = &upgrade.prerequisite {
            if !state.owns(prereq) {
                return Err(CityError::PrerequisiteNotMet {
                    id:           upgrade.id.clone(),
                    prerequisite: prereq.clone(),
                });
            }
        }
        Ok(())
    }
}

fn standard_upgrades() -> Vec<Upgrade> {
    use DemandBonus::{Flat, Percent};
    use UpgradeEffect::*;

    vec![
        Upgrade::new("tax_hike_1", "Raise city taxes", 10.0, TaxBoost { amount: 0.10 }),
        Upgrade::new("tax_hike_2", "Raise city taxes again", 100.0, TaxBoost { amount: 0.15 })
            .requires("tax_hike_1"),
        Upgrade::new("tax_hike_3", "Introduce a sales tax", 1_000.0, TaxBoost { amount: 0.25 })
            .requires("tax_hike_2"),
        Upgrade::new("build_parks", "Add parks to the city", 40.0,
            DemandBoost { applies_to: ZoneScope::Residential, bonus: Flat(2.0) }),
        Upgrade::new("build_marina", "Build a marina", 300.0,
            DemandBoost { applies_to: ZoneScope::Residential, bonus: Percent(0.05) })
            .requires("build_parks"),
        Upgrade::new("billboards", "Put up billboards", 40.0,
            DemandBoost { applies_to: ZoneScope::Commercial, bonus: Flat(2.0) }),
        Upgrade::new("build_mall", "Build a mall", 300.0,
            DemandBoost { applies_to: ZoneScope::Commercial, bonus: Percent(0.05) })
            .requires("billboards"),
        Upgrade::new("power_plant", "Build a power plant", 40.0,
            DemandBoost { applies_to: ZoneScope::Industrial, bonus: Flat(2.0) }),
        Upgrade::new("build_factory", "Build a factory", 300.0,
            DemandBoost { applies_to: ZoneScope::Industrial, bonus: Percent(0.05) })
            .requires("power_plant"),
        Upgrade::new("relocation_grants", "Pay people for moving here", 500.0,
            DemandBoost { applies_to: ZoneScope::Global, bonus: Flat(1.0) })
            .repeatable(),
        Upgrade::new("build_school", "Build a school", 50.0, GrowthBoost { amount: 0.25 }),
        Upgrade::new("build_hospital", "Build a hospital", 250.0, GrowthBoost { amount: 0.50 })
            .requires("build_school"),
        Upgrade::new("advertising", "Increase advertising budget", 75.0,
            GrowthBoost { amount: 0.05 })
            .repeatable(),
        Upgrade::new("city_charter", "Draft a city charter", 1_000.0, RenameUnlock),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_valid() {
        let catalog = UpgradeCatalog::standard();
        assert_eq!(catalog.len(), 14);
        assert!(catalog.get("tax_hike_1").is_some());
    }

    #[test]
    fn fresh_city_listing_is_sorted_and_gated() {
        let catalog = UpgradeCatalog::standard();
        let state = CityState::default();
        let ids: Vec<&str> = catalog
            .list_available(&state)
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "tax_hike_1",
                "billboards",
                "build_parks",
                "power_plant",
                "build_school",
                "advertising",
                "relocation_grants",
                "city_charter",
            ]
        );
    }

    #[test]
    fn owned_upgrade_unlocks_its_successor() {
        let catalog = UpgradeCatalog::standard();
        let mut state = CityState::default();
        state.owned_upgrades.insert("tax_hike_1".into());
        let ids: Vec<&str> = catalog
            .list_available(&state)
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert!(!ids.contains(&"tax_hike_1"));
        assert!(ids.contains(&"tax_hike_2"));
        assert!(!ids.contains(&"tax_hike_3"));
    }

    #[test]
    fn repeatable_upgrade_stays_listed() {
        let catalog = UpgradeCatalog::standard();
        let mut state = CityState::default();
        state.owned_upgrades.insert("advertising".into());
        assert!(catalog.list_available(&state).iter().any(|u| u.id == "advertising"));
        assert!(catalog.check_purchase(&state, "advertising").is_ok());
    }

    #[test]
    fn check_purchase_reports_each_failure() {
        let catalog = UpgradeCatalog::standard();
        let mut state = CityState::default();

        assert!(matches!(
            catalog.check_purchase(&state, "free_money"),
            Err(CityError::UnknownUpgrade { .. })
        ));
        assert!(matches!(
            catalog.check_purchase(&state, "tax_hike_2"),
            Err(CityError::PrerequisiteNotMet { ref prerequisite, .. }) if prerequisite == "tax_hike_1"
        ));

        state.owned_upgrades.insert("tax_hike_1".into());
        assert!(matches!(
            catalog.check_purchase(&state, "tax_hike_1"),
            Err(CityError::AlreadyOwned { .. })
        ));
    }

    #[test]
    fn effects_fold_into_their_fields() {
        let catalog = UpgradeCatalog::standard();
        let mut state = CityState::default();

        for id in ["tax_hike_1", "build_school", "relocation_grants", "city_charter"] {
            let upgrade = catalog.get(id).unwrap().clone();
            catalog.apply_effect(&mut state, &upgrade).unwrap();
        }

        assert!((state.tax_rate - 0.10).abs() < 1e-12);
        assert_eq!(state.growth_boosts, vec![0.25]);
        for zone in ZoneType::ALL {
            assert_eq!(state.demand_boosts[zone].flat, 1.0);
        }
        assert!(state.rename_unlocked);
        // apply_effect never records ownership itself.
        assert!(state.owned_upgrades.is_empty());
    }

    #[test]
    fn percent_bonus_targets_one_zone() {
        let catalog = UpgradeCatalog::standard();
        let mut state = CityState::default();
        state.owned_upgrades.insert("billboards".into());
        let mall = catalog.get("build_mall").unwrap().clone();
        catalog.apply_effect(&mut state, &mall).unwrap();
        assert_eq!(state.demand_boosts[ZoneType::Commercial].percent, 0.05);
        assert_eq!(state.demand_boosts[ZoneType::Residential].percent, 0.0);
    }

    #[test]
    fn effect_accessors_match_the_variant() {
        let catalog = UpgradeCatalog::standard();
        let mall = catalog.get("build_mall").unwrap();
        assert_eq!(mall.category(), UpgradeCategory::DemandBoost);
        assert_eq!(mall.effect.applies_to(), ZoneScope::Commercial);
        assert_eq!(mall.effect.magnitude(), 0.05);
        let charter = catalog.get("city_charter").unwrap();
        assert_eq!(charter.effect.applies_to(), ZoneScope::Global);
    }

    #[test]
    fn upgrade_parses_from_flat_json() {
        let json = r#"{
            "id": "billboards",
            "display_name": "Put up billboards",
            "cost": 40.0,
            "category": "demand-boost",
            "applies_to": "commercial",
            "bonus": { "flat": 2.0 }
        }"#;
        let upgrade: Upgrade = serde_json::from_str(json).unwrap();
        assert_eq!(upgrade, *UpgradeCatalog::standard().get("billboards").unwrap());

        let charter: Upgrade = serde_json::from_str(
            r#"{"id":"c","display_name":"C","cost":1.0,"category":"cosmetic-rename-unlock"}"#,
        )
        .unwrap();
        assert_eq!(charter.category(), UpgradeCategory::RenameUnlock);
    }

    #[test]
    fn invalid_catalogs_are_rejected() {
        let dup = vec![
            Upgrade::new("a", "A", 1.0, UpgradeEffect::RenameUnlock),
            Upgrade::new("a", "A again", 2.0, UpgradeEffect::RenameUnlock),
        ];
        assert!(UpgradeCatalog::from_defs(dup).is_err());

        let dangling = vec![
            Upgrade::new("a", "A", 1.0, UpgradeEffect::RenameUnlock).requires("missing"),
        ];
        assert!(UpgradeCatalog::from_defs(dangling).is_err());

        let circular = vec![
            Upgrade::new("a", "A", 1.0, UpgradeEffect::RenameUnlock).requires("b"),
            Upgrade::new("b", "B", 1.0, UpgradeEffect::RenameUnlock).requires("a"),
        ];
        assert!(UpgradeCatalog::from_defs(circular).is_err());

        let negative = vec![Upgrade::new("a", "A", -5.0, UpgradeEffect::RenameUnlock)];
        assert!(UpgradeCatalog::from_defs(negative).is_err());

        let shrinking_growth = vec![Upgrade::new("a", "A", 1.0, UpgradeEffect::GrowthBoost { amount: -5.0 })];
        assert!(UpgradeCatalog::from_defs(shrinking_growth).is_err());

        let draining_demand = vec![Upgrade::new(
            "a",
            "A",
            1.0,
            UpgradeEffect::DemandBoost { applies_to: ZoneScope::Global, bonus: DemandBonus::Flat(-40.0) },
        )];
        assert!(UpgradeCatalog::from_defs(draining_demand).is_err());

        let tax_cut = vec![Upgrade::new("a", "A", 1.0, UpgradeEffect::TaxBoost { amount: -0.5 })];
        assert!(matches!(
            UpgradeCatalog::from_defs(tax_cut),
            Err(CityError::InvalidConfig(_))
        ));
    }
}
