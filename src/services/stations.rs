// src/services/stations.rs

//! Station list controller.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::{Generation, Load, Snapshot};
use crate::gateway::{Fetched, MonitorApi};
use crate::models::Station;
use crate::pipeline::{StationFilter, StationStats, filter_stations, regions};
use crate::storage::{CacheSlot, CacheStore};

pub struct StationsView {
    api: Arc<dyn MonitorApi>,
    cache: Arc<dyn CacheStore>,
    current: RwLock<Option<Snapshot<Station>>>,
    generation: Generation,
}

impl StationsView {
    pub fn new(api: Arc<dyn MonitorApi>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            api,
            cache,
            current: RwLock::new(None),
            generation: Generation::default(),
        }
    }

    /// Fetch the station collection and make it the working copy.
    ///
    /// Fresh data is written through to the cache. On fallback a non-empty
    /// cached collection is preferred over the gateway's fallback value.
    pub async fn load(&self) -> Load<Snapshot<Station>> {
        let ticket = self.generation.begin();

        let snapshot = match self.api.fetch_stations().await {
            Fetched::Fresh(stations) => {
                if !self.generation.is_current(ticket) {
                    log::debug!("Discarding superseded station load");
                    return Load::Superseded;
                }
                if let Err(e) = self.cache.write_stations(&stations).await {
                    log::warn!("Failed to cache stations: {}", e);
                }
                Snapshot::network(stations)
            }
            Fetched::Fallback(fallback) => {
                let cached = self.cache.read_stations().await;
                if cached.is_empty() {
                    Snapshot::fallback(fallback)
                } else {
                    let cached_at = self.cache.cached_at(CacheSlot::Stations).await;
                    log::info!("Using {} cached stations", cached.len());
                    Snapshot::cached(cached, cached_at)
                }
            }
        };

        let mut current = self.current.write().await;
        if !self.generation.is_current(ticket) {
            log::debug!("Discarding superseded station load");
            return Load::Superseded;
        }
        *current = Some(snapshot.clone());
        Load::Applied(snapshot)
    }

    /// Invalidate any load still in flight.
    pub fn abandon(&self) {
        self.generation.begin();
    }

    pub async fn snapshot(&self) -> Option<Snapshot<Station>> {
        self.current.read().await.clone()
    }

    /// Working copy narrowed by `filter`, in source order.
    pub async fn visible(&self, filter: &StationFilter) -> Vec<Station> {
        match self.current.read().await.as_ref() {
            Some(snapshot) => filter_stations(&snapshot.items, filter),
            None => Vec::new(),
        }
    }

    pub async fn stats(&self) -> StationStats {
        match self.current.read().await.as_ref() {
            Some(snapshot) => StationStats::from(snapshot.items.as_slice()),
            None => StationStats::default(),
        }
    }

    /// Region choices for the working copy.
    pub async fn regions(&self) -> Vec<String> {
        match self.current.read().await.as_ref() {
            Some(snapshot) => regions(&snapshot.items),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gateway::FallbackData;
    use crate::models::StationStatus;
    use crate::services::DataSource;
    use crate::services::testing::ScriptedApi;
    use crate::storage::MemoryStorage;

    fn view(api: ScriptedApi, cache: Arc<MemoryStorage>) -> StationsView {
        StationsView::new(Arc::new(api), cache)
    }

    #[tokio::test]
    async fn test_fresh_load_writes_through() {
        let cache = Arc::new(MemoryStorage::new());
        let view = view(ScriptedApi::online(), cache.clone());

        let snapshot = view.load().await.applied().unwrap();
        assert_eq!(snapshot.source, DataSource::Network);
        assert_eq!(snapshot.items.len(), 6);
        assert!(!snapshot.is_degraded());
        assert_eq!(cache.read_stations().await, snapshot.items);
    }

    #[tokio::test]
    async fn test_fallback_without_cache() {
        let cache = Arc::new(MemoryStorage::new());
        let view = view(ScriptedApi::offline(FallbackData::demo()), cache.clone());

        let snapshot = view.load().await.applied().unwrap();
        assert_eq!(snapshot.source, DataSource::Fallback);
        assert_eq!(snapshot.items, FallbackData::demo().stations());
        assert!(snapshot.cached_at.is_none());
        // Fallback data never lands in the cache.
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_prefers_cache() {
        let cache = Arc::new(MemoryStorage::new());
        let cached = FallbackData::demo().stations()[..2].to_vec();
        cache.write_stations(&cached).await.unwrap();

        let view = view(ScriptedApi::offline(FallbackData::demo()), cache.clone());
        let snapshot = view.load().await.applied().unwrap();

        assert_eq!(snapshot.source, DataSource::Cache);
        assert_eq!(snapshot.items, cached);
        assert!(snapshot.cached_at.is_some());
        assert_eq!(cache.read_stations().await, cached);
    }

    #[tokio::test]
    async fn test_empty_fallback_mode() {
        let cache = Arc::new(MemoryStorage::new());
        let view = view(ScriptedApi::offline(FallbackData::empty()), cache);

        let snapshot = view.load().await.applied().unwrap();
        assert_eq!(snapshot.source, DataSource::Fallback);
        assert!(snapshot.items.is_empty());
        assert_eq!(view.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_views_over_working_copy() {
        let view = view(ScriptedApi::online(), Arc::new(MemoryStorage::new()));
        assert!(view.visible(&StationFilter::new()).await.is_empty());
        assert!(view.snapshot().await.is_none());

        view.load().await;

        let critical = view
            .visible(&StationFilter::new().status(StationStatus::Critical))
            .await;
        assert_eq!(critical.len(), 2);
        assert!(critical.iter().all(|s| s.status == StationStatus::Critical));

        let stats = view.stats().await;
        assert_eq!(stats.total, 6);
        assert_eq!(stats.critical, 2);
        assert_eq!(view.regions().await.len(), 5);
    }

    #[tokio::test]
    async fn test_slow_load_is_superseded() {
        let cache = Arc::new(MemoryStorage::new());
        let api = ScriptedApi {
            first_call_delay: Some(Duration::from_millis(100)),
            ..ScriptedApi::online()
        };
        let view = view(api, cache);

        let (slow, fast) = tokio::join!(view.load(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            view.load().await
        });

        assert!(slow.is_superseded());
        assert_eq!(fast.applied(), view.snapshot().await);
    }

    #[tokio::test]
    async fn test_abandon_discards_result() {
        let cache = Arc::new(MemoryStorage::new());
        let api = ScriptedApi {
            first_call_delay: Some(Duration::from_millis(50)),
            ..ScriptedApi::online()
        };
        let view = view(api, cache.clone());

        let (load, ()) = tokio::join!(view.load(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            view.abandon();
        });

        assert!(load.is_superseded());
        assert!(view.snapshot().await.is_none());
        assert!(cache.is_empty());
    }
}
