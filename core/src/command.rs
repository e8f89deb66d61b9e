use crate::zone::ZoneType;
use serde::{Deserialize, Serialize};

/// All player-issued actions.
/// Variants are append-only. Never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    Zone { zone: ZoneType },
    BuyUpgrade { id: String },
    RenameCity { name: String },
    Reset,
}

impl PlayerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zone { .. }       => "zone",
            Self::BuyUpgrade { .. } => "buy_upgrade",
            Self::RenameCity { .. } => "rename_city",
            Self::Reset             => "reset",
        }
    }
}
