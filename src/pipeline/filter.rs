//! Filter/sort pipeline over station and alert collections.
//!
//! Every function here borrows its source collection and returns a new
//! `Vec`; the source and its elements are never modified.

use crate::error::Result;
use crate::models::{Alert, Severity, Station, StationStatus};

/// Value that selects "no restriction" in a category filter.
pub const ALL: &str = "all";

/// Parse a category choice where `"all"` (or an empty string) means no filter.
pub fn parse_choice<T>(value: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = crate::error::AppError>,
{
    selected(value).map(str::parse::<T>).transpose()
}

/// Parse a region choice; same "all" rules as [`parse_choice`].
pub fn parse_region(value: &str) -> Option<String> {
    selected(value).map(str::to_string)
}

fn selected(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && !value.eq_ignore_ascii_case(ALL)).then_some(value)
}

/// Criteria for the station list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationFilter {
    /// Free-text search over name, state and district (case-insensitive)
    pub search: String,
    /// Exact state match, `None` for all states
    pub region: Option<String>,
    /// Exact status match, `None` for all statuses
    pub status: Option<StationStatus>,
}

impl StationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn status(mut self, status: StationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether a station passes every criterion.
    pub fn matches(&self, station: &Station) -> bool {
        let needle = self.search.to_lowercase();
        self.matches_with(station, &needle)
    }

    fn matches_with(&self, station: &Station, needle: &str) -> bool {
        (needle.is_empty() || station.matches_search(needle))
            && self.region.as_ref().is_none_or(|r| &station.state == r)
            && self.status.is_none_or(|s| station.status == s)
    }
}

/// Apply a station filter, keeping source order.
pub fn filter_stations(stations: &[Station], filter: &StationFilter) -> Vec<Station> {
    let needle = filter.search.to_lowercase();
    stations
        .iter()
        .filter(|station| filter.matches_with(station, &needle))
        .cloned()
        .collect()
}

/// Resolution-state choice for the alert list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resolution {
    #[default]
    All,
    Active,
    Resolved,
}

impl Resolution {
    fn matches(&self, alert: &Alert) -> bool {
        match self {
            Self::All => true,
            Self::Active => !alert.resolved,
            Self::Resolved => alert.resolved,
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | ALL => Ok(Self::All),
            "active" => Ok(Self::Active),
            "resolved" => Ok(Self::Resolved),
            other => Err(crate::error::AppError::validation(format!(
                "Unknown alert status '{other}' (expected all, active or resolved)"
            ))),
        }
    }
}

/// Criteria for the alert list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFilter {
    /// Exact severity match, `None` for all severities
    pub severity: Option<Severity>,
    pub resolution: Resolution,
}

impl AlertFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.severity.is_none_or(|s| alert.severity == s) && self.resolution.matches(alert)
    }
}

/// Apply an alert filter and order the result newest first.
///
/// The sort is stable: alerts sharing a date keep their source order.
/// Alerts whose date cannot be parsed go last.
pub fn filter_alerts(alerts: &[Alert], filter: &AlertFilter) -> Vec<Alert> {
    let mut filtered: Vec<Alert> = alerts
        .iter()
        .filter(|alert| filter.matches(alert))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.day().cmp(&a.day()));
    filtered
}
