//! The simulation engine. It is the one owner of the city.
//!
//! TICK ORDER (never reordered):
//!   1. Income  → treasury
//!   2. Growth  → population
//!   3. Demand  → boost, then decay, per zone type
//!   4. Day counter advances
//!
//! RULES:
//!   - CityState is mutated only here, by the actions and tick().
//!   - Every action validates fully before touching state. A rejected
//!     action leaves the state exactly as it was.
//!   - No randomness. Same start state + same calls = same result.
//!   - One event is buffered per action or tick; drain_events() hands
//!     them to the caller. The buffer holds at most EVENT_BUFFER_CAPACITY
//!     events; past that the oldest are dropped.
//!
//! The engine is not thread-safe by itself. A multi-threaded host must
//! put it behind a single Mutex so actions and ticks never interleave.

use crate::{
    catalog::{Upgrade, UpgradeCatalog},
    command::PlayerCommand,
    config::{CityConfig, EconomyConfig},
    error::{CityError, CityResult},
    event::CityEvent,
    ledger,
    state::CityState,
    types::Tick,
    zone::ZoneType,
};
use chrono::{Days, NaiveDate};
use std::collections::VecDeque;

/// Undrained events kept before the oldest are dropped.
pub const EVENT_BUFFER_CAPACITY: usize = 4_096;

pub struct CityEngine {
    state:          CityState,
    config:         CityConfig,
    events:         VecDeque<CityEvent>,
    dropped_events: u64,
}

impl CityEngine {
    /// A fresh city under `config`.
    pub fn new(config: CityConfig) -> Self {
        let state = CityState::new(&config.economy);
        Self::with_state(config, state)
    }

    /// Resume from a state rebuilt by the Persistence Gateway.
    pub fn with_state(config: CityConfig, state: CityState) -> Self {
        Self {
            state,
            config,
            events: VecDeque::new(),
            dropped_events: 0,
        }
    }

    /// A fresh city with the built-in economy and catalog.
    pub fn standard() -> Self {
        Self::new(CityConfig::standard())
    }

    // ── Actions ────────────────────────────────────────────────

    /// Zone one parcel of `zone`. Refused while demand is below the
    /// zoning threshold.
    pub fn zone(&mut self, zone: ZoneType) -> CityResult<&CityState> {
        let demand = self.state.demand[zone];
        let required = self.config.economy.min_zone_demand;
        if demand < required {
            return self.reject("zone", CityError::InsufficientDemand { zone, demand, required });
        }

        self.state.zone_counts[zone] += 1;
        let count = self.state.zone_counts[zone];
        log::info!("day={} zoned {zone} parcel #{count}", self.state.day);
        self.record(CityEvent::Zoned { day: self.state.day, zone, count });
        Ok(&self.state)
    }

    /// Buy upgrade `id`: deduct its cost, fold in its effect, record it.
    pub fn buy_upgrade(&mut self, id: &str) -> CityResult<&CityState> {
        let upgrade = match self.config.catalog.check_purchase(&self.state, id).cloned() {
            Ok(upgrade) => upgrade,
            Err(e) => return self.reject("buy_upgrade", e),
        };
        if self.state.treasury < upgrade.cost {
            let err = CityError::InsufficientFunds {
                cost:     upgrade.cost,
                treasury: self.state.treasury,
            };
            return self.reject("buy_upgrade", err);
        }
        if let Err(e) = self.config.catalog.apply_effect(&mut self.state, &upgrade) {
            return self.reject("buy_upgrade", e);
        }

        self.state.treasury -= upgrade.cost;
        self.state.owned_upgrades.insert(upgrade.id.clone());
        log::info!(
            "day={} bought '{}' for {:.2}, treasury now {:.2}",
            self.state.day,
            upgrade.id,
            upgrade.cost,
            self.state.treasury
        );
        self.record(CityEvent::UpgradePurchased {
            day:        self.state.day,
            upgrade_id: upgrade.id,
            cost:       upgrade.cost,
        });
        Ok(&self.state)
    }

    /// Rename the city. Surrounding whitespace is dropped; a name that
    /// is empty after trimming is refused.
    pub fn rename_city(&mut self, new_name: &str) -> CityResult<&CityState> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return self.reject("rename_city", CityError::InvalidName);
        }

        let old_name = std::mem::replace(&mut self.state.city_name, trimmed.to_string());
        log::info!("day={} renamed '{old_name}' to '{trimmed}'", self.state.day);
        self.record(CityEvent::CityRenamed {
            day:      self.state.day,
            old_name,
            new_name: trimmed.to_string(),
        });
        Ok(&self.state)
    }

    /// Throw the city away and start over. Irreversible.
    pub fn reset(&mut self) -> &CityState {
        let day = self.state.day;
        self.state = CityState::new(&self.config.economy);
        log::info!("day={day} city reset");
        self.record(CityEvent::CityReset { day });
        &self.state
    }

    /// Dispatch a player command to the matching action.
    pub fn execute(&mut self, command: &PlayerCommand) -> CityResult<&CityState> {
        match command {
            PlayerCommand::Zone { zone }       => self.zone(*zone),
            PlayerCommand::BuyUpgrade { id }   => self.buy_upgrade(id),
            PlayerCommand::RenameCity { name } => self.rename_city(name),
            PlayerCommand::Reset               => Ok(self.reset()),
        }
    }

    // ── Time ───────────────────────────────────────────────────

    /// Advance one tick. Never fails.
    pub fn tick(&mut self) -> &CityState {
        let economy = &self.config.economy;

        let income = ledger::compute_income(&self.state, economy);
        self.state.treasury += income;

        let growth = ledger::compute_growth(&self.state, economy);
        self.state.population += growth;

        for zone in ZoneType::ALL {
            self.state.demand[zone] = ledger::compute_demand_decay(&self.state, economy, zone);
        }

        self.state.day += 1;

        log::debug!(
            "tick day={} income={income:.2} growth={growth:.2} treasury={:.2} population={:.2}",
            self.state.day,
            self.state.treasury,
            self.state.population
        );
        self.record(CityEvent::TickCompleted {
            day:        self.state.day,
            income,
            growth,
            treasury:   self.state.treasury,
            population: self.state.population,
        });
        &self.state
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> &CityState {
        for _ in 0..n {
            self.tick();
        }
        &self.state
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> &CityState {
        &self.state
    }

    pub fn economy(&self) -> &EconomyConfig {
        &self.config.economy
    }

    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.config.catalog
    }

    pub fn list_available(&self) -> Vec<&Upgrade> {
        self.config.catalog.list_available(&self.state)
    }

    pub fn income_per_tick(&self) -> f64 {
        ledger::compute_income(&self.state, &self.config.economy)
    }

    pub fn growth_per_tick(&self) -> f64 {
        ledger::compute_growth(&self.state, &self.config.economy)
    }

    /// Ticks until upgrade `id` is affordable at the current income.
    pub fn ticks_until_affordable(&self, id: &str) -> CityResult<Option<Tick>> {
        let upgrade = self
            .config
            .catalog
            .get(id)
            .ok_or_else(|| CityError::UnknownUpgrade { id: id.to_string() })?;
        Ok(ledger::ticks_until_affordable(&self.state, &self.config.economy, upgrade.cost))
    }

    /// The in-game date: day 0 is 1 January 2024.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 1)?.checked_add_days(Days::new(self.state.day))
    }

    /// Take every event buffered since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<CityEvent> {
        self.dropped_events = 0;
        self.events.drain(..).collect()
    }

    /// Events discarded for lack of room since the last drain.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    fn record(&mut self, event: CityEvent) {
        if self.events.len() == EVENT_BUFFER_CAPACITY {
            self.events.pop_front();
            if self.dropped_events == 0 {
                log::warn!("Event buffer full; dropping oldest undrained events");
            }
            self.dropped_events += 1;
        }
        self.events.push_back(event);
    }

    fn reject(&mut self, action: &str, err: CityError) -> CityResult<&CityState> {
        log::warn!("day={} {action} rejected: {err}", self.state.day);
        self.record(CityEvent::ActionRejected {
            day:    self.state.day,
            action: action.to_string(),
            kind:   err.kind().to_string(),
            reason: err.to_string(),
        });
        Err(err)
    }
}
