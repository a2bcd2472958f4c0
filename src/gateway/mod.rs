//! Remote data gateway.
//!
//! Every read goes to the REST backend first. When the request cannot be
//! completed (unreachable host, timeout, non-success status, undecodable
//! body) the gateway logs a warning and hands back a designated fallback
//! value instead of an error, tagged so callers can tell the two apart.
//!
//! ## Resources
//!
//! ```text
//! GET  /stations                  -> [Station]
//! GET  /stations/{id}             -> Station
//! GET  /water-levels/{stationId}  -> [WaterLevel]
//! GET  /alerts                    -> [Alert]
//! GET  /alerts/station/{id}       -> [Alert]
//! GET  /reports/alerts/export     -> text/csv
//! POST /auth/login                -> {user, token}
//! POST /auth/register             -> {user, token}
//! ```
//!
//! The gateway holds no state and never touches the local cache; writing
//! fresh data through to the cache is the caller's job.

pub mod fallback;
pub mod http;

use async_trait::async_trait;

use crate::models::{Alert, AuthSession, Station, WaterLevel};

// Re-export for convenience
pub use fallback::FallbackData;
pub use http::HttpGateway;

/// Outcome of a gateway read.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// Data returned by the backend
    Fresh(T),
    /// Designated substitute served because the backend request failed
    Fallback(T),
}

impl<T> Fetched<T> {
    /// Unwrap the payload regardless of where it came from.
    pub fn into_inner(self) -> T {
        match self {
            Self::Fresh(value) | Self::Fallback(value) => value,
        }
    }

    pub fn get(&self) -> &T {
        match self {
            Self::Fresh(value) | Self::Fallback(value) => value,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Transform the payload, keeping the tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Fresh(value) => Fetched::Fresh(f(value)),
            Self::Fallback(value) => Fetched::Fallback(f(value)),
        }
    }
}

/// Operations offered by the monitoring backend.
///
/// Read operations are total: they never return an error.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    /// All stations.
    async fn fetch_stations(&self) -> Fetched<Vec<Station>>;

    /// A single station, `None` when no station has this identifier.
    async fn fetch_station(&self, id: &str) -> Fetched<Option<Station>>;

    /// Water-level history of a station, oldest reading first.
    async fn fetch_water_levels(&self, station_id: &str) -> Fetched<Vec<WaterLevel>>;

    /// All alerts.
    async fn fetch_alerts(&self) -> Fetched<Vec<Alert>>;

    /// Alerts raised for one station.
    async fn fetch_station_alerts(&self, station_id: &str) -> Fetched<Vec<Alert>>;

    /// CSV report of all alerts.
    async fn export_alerts_report(&self) -> Fetched<String>;

    /// Sign in. `None` when the credentials are rejected.
    async fn authenticate(&self, email: &str, password: &str) -> Option<AuthSession>;

    /// Create an account. `None` when registration is refused.
    async fn register_user(&self, email: &str, password: &str, name: &str)
    -> Option<AuthSession>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_accessors() {
        let fresh = Fetched::Fresh(vec![1, 2, 3]);
        assert!(fresh.is_fresh());
        assert!(!fresh.is_fallback());
        assert_eq!(fresh.get().len(), 3);

        let fallback = Fetched::Fallback(vec![1]).map(|v| v.len());
        assert_eq!(fallback, Fetched::Fallback(1));
        assert_eq!(fallback.into_inner(), 1);
    }
}
