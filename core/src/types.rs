//! Shared primitive types used across the entire simulation.

/// A simulation tick. One tick = one in-game day.
pub type Tick = u64;

/// Stable identifier of an upgrade in the catalog.
pub type UpgradeId = String;

/// The canonical journal session identifier.
pub type SessionId = String;
