// src/models/station.rs

//! Monitoring station and water-level reading structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Groundwater condition classification of a station.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StationStatus {
    Safe,
    Warning,
    Critical,
}

impl StationStatus {
    pub const ALL: [StationStatus; 3] = [Self::Safe, Self::Warning, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("Unknown station status '{s}'")))
    }
}

/// Direction the water table is moving.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A DWLR monitoring station.
///
/// `status` and `trend` are independent classifications; neither is derived
/// from the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    /// Unique station identifier (e.g., "ST001")
    pub id: String,

    /// Display name
    pub name: String,

    /// Region (Indian state)
    pub state: String,

    /// Subregion within the state
    pub district: String,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    pub status: StationStatus,

    /// Current depth to water in meters
    pub current_depth_m: f64,

    pub last_updated: DateTime<Utc>,

    pub trend: Trend,
}

impl Station {
    /// Case-insensitive substring match over name, state and district.
    ///
    /// `needle` must already be lowercased.
    pub(crate) fn matches_search(&self, needle: &str) -> bool {
        [&self.name, &self.state, &self.district]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A single water-level reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterLevel {
    pub timestamp: DateTime<Utc>,

    /// Depth to water in meters
    pub depth_m: f64,

    /// Owning station (not checked against the station collection)
    pub station_id: String,
}

/// Sort readings oldest first. Readings with equal timestamps keep their order.
pub fn sort_chronologically(levels: &mut [WaterLevel]) {
    levels.sort_by_key(|level| level.timestamp);
}
