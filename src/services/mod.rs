// src/services/mod.rs

//! View controllers.
//!
//! Each controller orchestrates gateway calls for one screen, keeps the
//! working copy of what it fetched, and exposes filtered views of it:
//! - Station list (`StationsView`)
//! - Station detail (`StationDetailView`)
//! - Alert list and report export (`AlertsView`)
//! - Sign-in and registration (`AuthService`)
//!
//! Loads are guarded by a generation counter. A load that finishes after a
//! newer load (or an `abandon`) has started is discarded instead of applied.

mod alerts;
mod auth;
mod detail;
mod stations;

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

pub use alerts::AlertsView;
pub use auth::{AuthService, MIN_PASSWORD_LEN, RegisterForm};
pub use detail::{StationDetail, StationDetailView};
pub use stations::StationsView;

/// Where a view's working copy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched from the backend just now
    Network,
    /// Last-known-good copy from the local cache
    Cache,
    /// Gateway fallback value
    Fallback,
}

/// A loaded collection and its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub source: DataSource,
    /// Write time of the cache slot, when served from the cache
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> Snapshot<T> {
    pub fn network(items: Vec<T>) -> Self {
        Self {
            items,
            source: DataSource::Network,
            cached_at: None,
        }
    }

    pub fn cached(items: Vec<T>, cached_at: Option<DateTime<Utc>>) -> Self {
        Self {
            items,
            source: DataSource::Cache,
            cached_at,
        }
    }

    pub fn fallback(items: Vec<T>) -> Self {
        Self {
            items,
            source: DataSource::Fallback,
            cached_at: None,
        }
    }

    /// Whether the offline/stale indicator should be shown.
    pub fn is_degraded(&self) -> bool {
        self.source != DataSource::Network
    }
}

/// Result of a guarded load.
#[derive(Debug, Clone, PartialEq)]
pub enum Load<T> {
    /// The result was applied to the view
    Applied(T),
    /// A newer load or an abandon happened meanwhile; the result was dropped
    Superseded,
}

impl<T> Load<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Stale-response guard.
#[derive(Debug, Default)]
struct Generation(AtomicU64);

impl Generation {
    /// Start a new load, invalidating all earlier ones.
    fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable gateway for controller tests.

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::gateway::{FallbackData, Fetched, MonitorApi};
    use crate::models::{Alert, AuthSession, Station, WaterLevel};

    /// Gateway whose reads either succeed with the demo dataset or fall back
    /// to a given dataset, per resource.
    pub struct ScriptedApi {
        pub online: FallbackData,
        pub fallback: FallbackData,
        pub stations_up: bool,
        pub station_up: bool,
        pub levels_up: bool,
        pub alerts_up: bool,
        pub export_up: bool,
        pub auth_up: bool,
        /// Delay applied to the first call made against this gateway
        pub first_call_delay: Option<Duration>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        pub fn online() -> Self {
            Self {
                online: FallbackData::demo(),
                fallback: FallbackData::empty(),
                stations_up: true,
                station_up: true,
                levels_up: true,
                alerts_up: true,
                export_up: true,
                auth_up: true,
                first_call_delay: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn offline(fallback: FallbackData) -> Self {
            Self {
                fallback,
                stations_up: false,
                station_up: false,
                levels_up: false,
                alerts_up: false,
                export_up: false,
                auth_up: false,
                ..Self::online()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// Record a call, sleeping first if it is the very first one.
        async fn record(&self, call: String) {
            let first = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(call);
                calls.len() == 1
            };
            if let Some(delay) = self.first_call_delay.filter(|_| first) {
                tokio::time::sleep(delay).await;
            }
        }

        fn pick<T>(up: bool, online: T, fallback: T) -> Fetched<T> {
            if up {
                Fetched::Fresh(online)
            } else {
                Fetched::Fallback(fallback)
            }
        }
    }

    #[async_trait]
    impl MonitorApi for ScriptedApi {
        async fn fetch_stations(&self) -> Fetched<Vec<Station>> {
            self.record("stations".into()).await;
            Self::pick(self.stations_up, self.online.stations(), self.fallback.stations())
        }

        async fn fetch_station(&self, id: &str) -> Fetched<Option<Station>> {
            self.record(format!("station {id}")).await;
            Self::pick(self.station_up, self.online.station(id), self.fallback.station(id))
        }

        async fn fetch_water_levels(&self, station_id: &str) -> Fetched<Vec<WaterLevel>> {
            self.record(format!("levels {station_id}")).await;
            Self::pick(
                self.levels_up,
                self.online.water_levels(station_id),
                self.fallback.water_levels(station_id),
            )
        }

        async fn fetch_alerts(&self) -> Fetched<Vec<Alert>> {
            self.record("alerts".into()).await;
            Self::pick(self.alerts_up, self.online.alerts(), self.fallback.alerts())
        }

        async fn fetch_station_alerts(&self, station_id: &str) -> Fetched<Vec<Alert>> {
            self.record(format!("alerts {station_id}")).await;
            Self::pick(
                self.alerts_up,
                self.online.station_alerts(station_id),
                self.fallback.station_alerts(station_id),
            )
        }

        async fn export_alerts_report(&self) -> Fetched<String> {
            self.record("export".into()).await;
            Self::pick(
                self.export_up,
                self.online.alerts_report(),
                self.fallback.alerts_report(),
            )
        }

        async fn authenticate(&self, email: &str, _password: &str) -> Option<AuthSession> {
            self.record(format!("login {email}")).await;
            if self.auth_up {
                self.online.login(email)
            } else {
                self.fallback.login(email)
            }
        }

        async fn register_user(
            &self,
            email: &str,
            _password: &str,
            name: &str,
        ) -> Option<AuthSession> {
            self.record(format!("register {email}")).await;
            if self.auth_up {
                self.online.register(email, name)
            } else {
                self.fallback.register(email, name)
            }
        }
    }
}
