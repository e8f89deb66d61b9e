//! City events: the record of everything the engine did.
//!
//! RULE: Every accepted action, every rejected action and every tick
//! emits exactly one event. The engine buffers them; whoever drives
//! the engine drains the buffer and decides where they go.

use crate::{
    types::{SessionId, Tick, UpgradeId},
    zone::ZoneType,
};
use serde::{Deserialize, Serialize};

/// Variants are append-only. The journal stores their names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CityEvent {
    // ── Tick events ────────────────────────────────
    TickCompleted {
        day:        Tick,
        income:     f64,
        growth:     f64,
        treasury:   f64,
        population: f64,
    },

    // ── Action events ──────────────────────────────
    Zoned {
        day:   Tick,
        zone:  ZoneType,
        count: u64,
    },
    UpgradePurchased {
        day:        Tick,
        upgrade_id: UpgradeId,
        cost:       f64,
    },
    CityRenamed {
        day:      Tick,
        old_name: String,
        new_name: String,
    },
    CityReset {
        day: Tick,
    },
    ActionRejected {
        day:    Tick,
        action: String,
        kind:   String,
        reason: String,
    },
}

impl CityEvent {
    /// Stable name for the journal's event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickCompleted { .. }    => "tick_completed",
            Self::Zoned { .. }            => "zoned",
            Self::UpgradePurchased { .. } => "upgrade_purchased",
            Self::CityRenamed { .. }      => "city_renamed",
            Self::CityReset { .. }        => "city_reset",
            Self::ActionRejected { .. }   => "action_rejected",
        }
    }

    pub fn day(&self) -> Tick {
        match self {
            Self::TickCompleted { day, .. }
            | Self::Zoned { day, .. }
            | Self::UpgradePurchased { day, .. }
            | Self::CityRenamed { day, .. }
            | Self::CityReset { day }
            | Self::ActionRejected { day, .. } => *day,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id:         Option<i64>,
    pub session_id: SessionId,
    pub day:        Tick,
    pub event_type: String,
    pub payload:    String, // JSON-serialized CityEvent
}

impl JournalEntry {
    pub fn from_event(session_id: &str, event: &CityEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id:         None,
            session_id: session_id.to_string(),
            day:        event.day(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}
