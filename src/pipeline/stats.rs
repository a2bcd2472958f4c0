//! Summary figures shown above the station and alert lists.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Alert, Severity, Station, StationStatus};

/// Station counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub total: usize,
    pub safe: usize,
    pub warning: usize,
    pub critical: usize,
}

impl StationStats {
    pub fn count(&self, status: StationStatus) -> usize {
        match status {
            StationStatus::Safe => self.safe,
            StationStatus::Warning => self.warning,
            StationStatus::Critical => self.critical,
        }
    }

    /// Share of all stations, as a whole percentage rounded half up.
    /// Zero when there are no stations.
    pub fn percent(&self, count: usize) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((count as f64 / self.total as f64) * 100.0).round() as u32
    }
}

impl From<&[Station]> for StationStats {
    fn from(stations: &[Station]) -> Self {
        stations.iter().fold(
            Self {
                total: stations.len(),
                ..Self::default()
            },
            |mut stats, station| {
                match station.status {
                    StationStatus::Safe => stats.safe += 1,
                    StationStatus::Warning => stats.warning += 1,
                    StationStatus::Critical => stats.critical += 1,
                }
                stats
            },
        )
    }
}

/// Distinct station states, in order of first appearance.
pub fn regions(stations: &[Station]) -> Vec<String> {
    let mut seen = HashSet::new();
    stations
        .iter()
        .filter(|s| seen.insert(s.state.as_str()))
        .map(|s| s.state.clone())
        .collect()
}

/// Alert counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub total: usize,
    /// Not yet resolved
    pub active: usize,
    /// Critical and not yet resolved
    pub critical_active: usize,
}

impl From<&[Alert]> for AlertStats {
    fn from(alerts: &[Alert]) -> Self {
        let active: Vec<&Alert> = alerts.iter().filter(|a| !a.resolved).collect();
        Self {
            total: alerts.len(),
            active: active.len(),
            critical_active: active
                .iter()
                .filter(|a| a.severity == Severity::Critical)
                .count(),
        }
    }
}
