//! City Clicker simulation core.
//!
//! Leaf-first: `zone` → `state` → `ledger` → `catalog` → `engine` → `save`.
//! `event`, `store` and `snapshot` serve whoever drives the engine.

pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod save;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;
pub mod zone;

pub use catalog::{Upgrade, UpgradeCatalog};
pub use config::{CityConfig, EconomyConfig};
pub use engine::CityEngine;
pub use error::{CityError, CityResult};
pub use save::SaveGateway;
pub use state::CityState;
pub use zone::ZoneType;
