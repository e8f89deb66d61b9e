//! Zone types and the fixed three-slot map keyed by them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// The three categories a parcel can be zoned as. The set is closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Residential,
    Commercial,
    Industrial,
}

impl ZoneType {
    /// Iteration order used everywhere a tick walks the zone types.
    pub const ALL: [ZoneType; 3] = [Self::Residential, Self::Commercial, Self::Industrial];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial  => "commercial",
            Self::Industrial  => "industrial",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per zone type. Serialized as a map keyed by zone name;
/// a missing key falls back to `T::default()`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerZone<T> {
    pub residential: T,
    pub commercial:  T,
    pub industrial:  T,
}

impl<T> PerZone<T> {
    pub fn new(residential: T, commercial: T, industrial: T) -> Self {
        Self { residential, commercial, industrial }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneType, &T)> {
        ZoneType::ALL.into_iter().map(move |zone| (zone, &self[zone]))
    }
}

impl<T: Clone> PerZone<T> {
    pub fn splat(value: T) -> Self {
        Self {
            residential: value.clone(),
            commercial:  value.clone(),
            industrial:  value,
        }
    }
}

impl<T> Index<ZoneType> for PerZone<T> {
    type Output = T;

    fn index(&self, zone: ZoneType) -> &T {
        match zone {
            ZoneType::Residential => &self.residential,
            ZoneType::Commercial  => &self.commercial,
            ZoneType::Industrial  => &self.industrial,
        }
    }
}

impl<T> IndexMut<ZoneType> for PerZone<T> {
    fn index_mut(&mut self, zone: ZoneType) -> &mut T {
        match zone {
            ZoneType::Residential => &mut self.residential,
            ZoneType::Commercial  => &mut self.commercial,
            ZoneType::Industrial  => &mut self.industrial,
        }
    }
}
