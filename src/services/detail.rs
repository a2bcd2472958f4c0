// src/services/detail.rs

//! Station detail controller: one station, its level history and its alerts.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{Generation, Load};
use crate::gateway::{Fetched, MonitorApi};
use crate::models::{Alert, Station, WaterLevel};
use crate::storage::CacheStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationDetail {
    pub station: Station,
    /// Oldest first
    pub water_levels: Vec<WaterLevel>,
    pub alerts: Vec<Alert>,
    /// At least one of the three fetches fell back
    pub degraded: bool,
}

pub struct StationDetailView {
    api: Arc<dyn MonitorApi>,
    cache: Arc<dyn CacheStore>,
    current: RwLock<Option<StationDetail>>,
    generation: Generation,
}

impl StationDetailView {
    pub fn new(api: Arc<dyn MonitorApi>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            api,
            cache,
            current: RwLock::new(None),
            generation: Generation::default(),
        }
    }

    /// Load the detail page for `id`.
    ///
    /// The station, level and alert fetches run concurrently and each falls
    /// back on its own. `Applied(None)` means the station is unknown.
    pub async fn load(&self, id: &str) -> Load<Option<StationDetail>> {
        let ticket = self.generation.begin();

        let (station, levels, alerts) = futures::join!(
            self.api.fetch_station(id),
            self.api.fetch_water_levels(id),
            self.api.fetch_station_alerts(id),
        );
        let degraded = station.is_fallback() || levels.is_fallback() || alerts.is_fallback();

        let station = match station {
            Fetched::Fresh(station) => station,
            Fetched::Fallback(fallback) => self
                .cache
                .read_stations()
                .await
                .into_iter()
                .find(|s| s.id == id)
                .or(fallback),
        };

        let alerts = match alerts {
            Fetched::Fresh(alerts) => alerts,
            Fetched::Fallback(fallback) => {
                let cached = self.cache.read_alerts().await;
                if cached.is_empty() {
                    fallback
                } else {
                    cached.into_iter().filter(|a| a.station_id == id).collect()
                }
            }
        };

        let detail = station.map(|station| StationDetail {
            station,
            water_levels: levels.into_inner(),
            alerts,
            degraded,
        });
        if detail.is_none() {
            log::info!("Station {} not found", id);
        }

        let mut current = self.current.write().await;
        if !self.generation.is_current(ticket) {
            log::debug!("Discarding superseded detail load for {}", id);
            return Load::Superseded;
        }
        *current = detail.clone();
        Load::Applied(detail)
    }

    pub fn abandon(&self) {
        self.generation.begin();
    }

    pub async fn detail(&self) -> Option<StationDetail> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gateway::FallbackData;
    use crate::services::testing::ScriptedApi;
    use crate::storage::MemoryStorage;

    fn view(api: ScriptedApi, cache: Arc<MemoryStorage>) -> StationDetailView {
        StationDetailView::new(Arc::new(api), cache)
    }

    #[tokio::test]
    async fn test_online_detail() {
        let view = view(ScriptedApi::online(), Arc::new(MemoryStorage::new()));

        let detail = view.load("ST003").await.applied().flatten().unwrap();
        assert_eq!(detail.station.name, "Jaipur Desert Monitor");
        assert_eq!(detail.water_levels.len(), 30);
        assert_eq!(detail.alerts.len(), 1);
        assert_eq!(detail.alerts[0].id, "AL001");
        assert!(!detail.degraded);
        assert_eq!(view.detail().await, Some(detail));
    }

    #[tokio::test]
    async fn test_fetches_run_together() {
        let api = Arc::new(ScriptedApi::online());
        let view = StationDetailView::new(api.clone(), Arc::new(MemoryStorage::new()));
        view.load("ST001").await;

        let mut calls = api.calls();
        calls.sort();
        assert_eq!(calls, vec!["alerts ST001", "levels ST001", "station ST001"]);
    }

    #[tokio::test]
    async fn test_failed_levels_do_not_fail_detail() {
        let api = ScriptedApi {
            levels_up: false,
            fallback: FallbackData::empty(),
            ..ScriptedApi::online()
        };
        let view = view(api, Arc::new(MemoryStorage::new()));

        let detail = view.load("ST001").await.applied().flatten().unwrap();
        assert_eq!(detail.station.id, "ST001");
        assert_eq!(detail.alerts.len(), 1);
        assert!(detail.water_levels.is_empty());
        assert!(detail.degraded);
    }

    #[tokio::test]
    async fn test_unknown_station_is_absent() {
        let online = view(ScriptedApi::online(), Arc::new(MemoryStorage::new()));
        assert_eq!(online.load("UNKNOWN_ID").await, Load::Applied(None));

        let offline = view(
            ScriptedApi::offline(FallbackData::demo()),
            Arc::new(MemoryStorage::new()),
        );
        assert_eq!(offline.load("UNKNOWN_ID").await, Load::Applied(None));
    }

    #[tokio::test]
    async fn test_offline_detail_from_cache() {
        let cache = Arc::new(MemoryStorage::new());
        let data = FallbackData::demo();
        cache.write_stations(&data.stations()).await.unwrap();
        cache.write_alerts(&data.alerts()).await.unwrap();

        let view = view(ScriptedApi::offline(FallbackData::empty()), cache);
        let detail = view.load("ST005").await.applied().flatten().unwrap();

        assert_eq!(detail.station.id, "ST005");
        assert_eq!(detail.alerts.len(), 1);
        assert_eq!(detail.alerts[0].id, "AL002");
        assert!(detail.water_levels.is_empty());
        assert!(detail.degraded);
    }

    #[tokio::test]
    async fn test_switching_stations_discards_slow_load() {
        let api = ScriptedApi {
            first_call_delay: Some(Duration::from_millis(100)),
            ..ScriptedApi::online()
        };
        let view = view(api, Arc::new(MemoryStorage::new()));

        let (slow, fast) = tokio::join!(view.load("ST001"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            view.load("ST002").await
        });

        assert!(slow.is_superseded());
        assert_eq!(fast.applied().flatten().unwrap().station.id, "ST002");
        assert_eq!(view.detail().await.unwrap().station.id, "ST002");
    }
}
