use crate::{
    catalog::{Upgrade, UpgradeCatalog},
    error::{CityError, CityResult},
    zone::PerZone,
};
use serde::{Deserialize, Serialize};

/// Rates and thresholds the Resource Ledger works from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyConfig {
    /// Treasury earned per parcel per tick, before tax.
    pub per_zone_base_income: PerZone<f64>,
    /// Population gained per residential parcel per tick, before boosts.
    pub base_growth_rate: f64,
    /// Demand lost per tick by every zone type with at least one parcel.
    pub demand_decay_rate: f64,
    /// Zoning is refused below this demand.
    pub min_zone_demand: f64,
    pub max_demand: f64,
    pub initial_demand: f64,
    pub default_city_name: String,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            per_zone_base_income: PerZone::new(1.0, 2.0, 1.5),
            base_growth_rate:     1.0,
            demand_decay_rate:    1.0,
            min_zone_demand:      10.0,
            max_demand:           100.0,
            initial_demand:       50.0,
            default_city_name:    "The City".into(),
        }
    }
}

impl EconomyConfig {
    pub fn validate(&self) -> CityResult<()> {
        let rates = [
            ("base_growth_rate", self.base_growth_rate),
            ("demand_decay_rate", self.demand_decay_rate),
            ("min_zone_demand", self.min_zone_demand),
            ("max_demand", self.max_demand),
            ("initial_demand", self.initial_demand),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(CityError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (zone, income) in self.per_zone_base_income.iter() {
            if !income.is_finite() || *income < 0.0 {
                return Err(CityError::InvalidConfig(format!(
                    "{zone} base income must be a non-negative number, got {income}"
                )));
            }
        }
        if self.initial_demand > self.max_demand {
            return Err(CityError::InvalidConfig(format!(
                "initial_demand {} exceeds max_demand {}",
                self.initial_demand, self.max_demand
            )));
        }
        if self.default_city_name.trim().is_empty() {
            return Err(CityError::InvalidConfig("default_city_name is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct UpgradesFile {
    upgrades: Vec<Upgrade>,
}

#[derive(Debug, Clone)]
pub struct CityConfig {
    pub economy: EconomyConfig,
    pub catalog: UpgradeCatalog,
}

impl CityConfig {
    /// Load from the data/ directory.
    /// In tests, use CityConfig::standard().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let economy_path = format!("{data_dir}/economy.json");
        let economy_content = std::fs::read_to_string(&economy_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {economy_path}: {e}"))?;
        let economy: EconomyConfig = serde_json::from_str(&economy_content)?;
        economy.validate()?;

        let upgrades_path = format!("{data_dir}/upgrades.json");
        let upgrades_content = std::fs::read_to_string(&upgrades_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {upgrades_path}: {e}"))?;
        let upgrades_file: UpgradesFile = serde_json::from_str(&upgrades_content)?;
        let catalog = UpgradeCatalog::from_defs(upgrades_file.upgrades)?;

        log::info!(
            "Loaded config from {data_dir}: {} upgrades",
            catalog.len()
        );
        Ok(Self { economy, catalog })
    }

    /// Built-in economy and upgrade catalog.
    pub fn standard() -> Self {
        Self {
            economy: EconomyConfig::default(),
            catalog: UpgradeCatalog::standard().clone(),
        }
    }
}
