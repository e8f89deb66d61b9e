use crate::zone::ZoneType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CityError {
    // ── Engine action errors ───────────────────────
    #[error("Not enough {zone} demand: have {demand:.2}, need {required:.2}")]
    InsufficientDemand { zone: ZoneType, demand: f64, required: f64 },

    #[error("Not enough funds: cost {cost:.2}, treasury {treasury:.2}")]
    InsufficientFunds { cost: f64, treasury: f64 },

    #[error("Unknown upgrade '{id}'")]
    UnknownUpgrade { id: String },

    #[error("Upgrade '{id}' requires '{prerequisite}'")]
    PrerequisiteNotMet { id: String, prerequisite: String },

    #[error("Upgrade '{id}' is already owned")]
    AlreadyOwned { id: String },

    #[error("City name must not be empty")]
    InvalidName,

    // ── Persistence errors ─────────────────────────
    #[error("Save file {path} is corrupt: {reason}")]
    CorruptSave { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl CityError {
    /// Stable short name, used for the journal's rejection records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientDemand { .. } => "insufficient_demand",
            Self::InsufficientFunds { .. }  => "insufficient_funds",
            Self::UnknownUpgrade { .. }     => "unknown_upgrade",
            Self::PrerequisiteNotMet { .. } => "prerequisite_not_met",
            Self::AlreadyOwned { .. }       => "already_owned",
            Self::InvalidName               => "invalid_name",
            Self::CorruptSave { .. }        => "corrupt_save",
            Self::Io(_)                     => "io",
            Self::Serialization(_)          => "serialization",
            Self::Database(_)               => "database",
            Self::InvalidConfig(_)          => "invalid_config",
        }
    }
}

pub type CityResult<T> = Result<T, CityError>;
