//! Persistence Gateway: the city state to and from a JSON save file.
//!
//! Writes go to `{path}.tmp`, are flushed with `sync_all()`, then
//! renamed over the real file. An interrupted save leaves the previous
//! save intact.
//!
//! Loading is forward compatible: unknown fields are ignored and
//! missing fields take their fresh-city values.

use crate::{
    config::EconomyConfig,
    error::{CityError, CityResult},
    state::{CityState, DemandModifier},
    types::{Tick, UpgradeId},
    zone::PerZone,
};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_SAVE_FILE: &str = "cityclicker_save.json";

/// The on-disk shape, every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SaveRecord {
    city_name:       Option<String>,
    treasury:        Option<f64>,
    population:      Option<f64>,
    zone_counts:     Option<PerZone<Option<u64>>>,
    demand:          Option<PerZone<Option<f64>>>,
    owned_upgrades:  Option<Vec<UpgradeId>>,
    tax_rate:        Option<f64>,
    day:             Option<Tick>,
    growth_boosts:   Option<Vec<f64>>,
    demand_boosts:   Option<PerZone<DemandModifier>>,
    rename_unlocked: Option<bool>,
}

impl SaveRecord {
    /// Fill the gaps from a fresh city and pull out-of-range values back
    /// into range. A state this engine produced comes through unchanged.
    fn into_state(self, economy: &EconomyConfig) -> CityState {
        let mut state = CityState::new(economy);

        if let Some(name) = self.city_name.filter(|n| !n.trim().is_empty()) {
            state.city_name = name;
        }
        if let Some(treasury) = self.treasury {
            state.treasury = treasury.max(0.0);
        }
        if let Some(population) = self.population {
            state.population = population.max(0.0);
        }
        if let Some(counts) = self.zone_counts {
            for (zone, count) in counts.iter() {
                if let Some(count) = count {
                    state.zone_counts[zone] = *count;
                }
            }
        }
        if let Some(demand) = self.demand {
            for (zone, value) in demand.iter() {
                if let Some(value) = value {
                    state.demand[zone] = value.clamp(0.0, economy.max_demand);
                }
            }
        }
        if let Some(owned) = self.owned_upgrades {
            state.owned_upgrades = owned.into_iter().collect();
        }
        if let Some(tax_rate) = self.tax_rate {
            state.tax_rate = tax_rate;
        }
        if let Some(day) = self.day {
            state.day = day;
        }
        if let Some(boosts) = self.growth_boosts {
            state.growth_boosts = boosts;
        }
        if let Some(boosts) = self.demand_boosts {
            state.demand_boosts = boosts;
        }
        if let Some(unlocked) = self.rename_unlocked {
            state.rename_unlocked = unlocked;
        }
        state
    }
}

pub struct SaveGateway {
    path: PathBuf,
}

impl SaveGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `cityclicker_save.json` in the working directory.
    pub fn default_location() -> Self {
        Self::new(DEFAULT_SAVE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `state`, replacing any previous save.
    pub fn save(&self, state: &CityState) -> CityResult<()> {
        let json = serde_json::to_vec_pretty(state)?;
        atomic_write(&self.path, &json)?;
        log::info!(
            "Saved '{}' (day {}) to {}",
            state.city_name,
            state.day,
            self.path.display()
        );
        Ok(())
    }

    /// Read the save. A missing file is a fresh city; an unreadable
    /// one is `CorruptSave`.
    pub fn load(&self, economy: &EconomyConfig) -> CityResult<CityState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No save at {}, starting a new city", self.path.display());
                return Ok(CityState::new(economy));
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(self.corrupt(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let record: SaveRecord =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        let state = record.into_state(economy);
        log::info!(
            "Loaded '{}' (day {}) from {}",
            state.city_name,
            state.day,
            self.path.display()
        );
        Ok(state)
    }

    /// Startup path: any load failure degrades to a fresh city.
    pub fn load_or_default(&self, economy: &EconomyConfig) -> CityState {
        self.load(economy).unwrap_or_else(|e| {
            log::warn!("{e}; starting a new city");
            CityState::new(economy)
        })
    }

    /// Delete the save file, if there is one.
    pub fn discard(&self) -> CityResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("Removed save {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn corrupt(&self, reason: String) -> CityError {
        CityError::CorruptSave {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

/// Write `data` to `{path}.tmp`, flush it, then rename it over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    });
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}
