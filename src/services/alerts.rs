// src/services/alerts.rs

//! Alert list and report export controller.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::{Generation, Load, Snapshot};
use crate::gateway::{Fetched, MonitorApi};
use crate::models::Alert;
use crate::pipeline::{AlertFilter, AlertStats, alerts_csv, filter_alerts};
use crate::storage::{CacheSlot, CacheStore};

pub struct AlertsView {
    api: Arc<dyn MonitorApi>,
    cache: Arc<dyn CacheStore>,
    current: RwLock<Option<Snapshot<Alert>>>,
    generation: Generation,
}

impl AlertsView {
    pub fn new(api: Arc<dyn MonitorApi>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            api,
            cache,
            current: RwLock::new(None),
            generation: Generation::default(),
        }
    }

    /// Fetch all alerts and make them the working copy.
    pub async fn load(&self) -> Load<Snapshot<Alert>> {
        let ticket = self.generation.begin();

        let snapshot = match self.api.fetch_alerts().await {
            Fetched::Fresh(alerts) => {
                if !self.generation.is_current(ticket) {
                    log::debug!("Discarding superseded alert load");
                    return Load::Superseded;
                }
                if let Err(e) = self.cache.write_alerts(&alerts).await {
                    log::warn!("Failed to cache alerts: {}", e);
                }
                Snapshot::network(alerts)
            }
            Fetched::Fallback(fallback) => {
                let cached = self.cache.read_alerts().await;
                if cached.is_empty() {
                    Snapshot::fallback(fallback)
                } else {
                    let cached_at = self.cache.cached_at(CacheSlot::Alerts).await;
                    log::info!("Using {} cached alerts", cached.len());
                    Snapshot::cached(cached, cached_at)
                }
            }
        };

        let mut current = self.current.write().await;
        if !self.generation.is_current(ticket) {
            log::debug!("Discarding superseded alert load");
            return Load::Superseded;
        }
        *current = Some(snapshot.clone());
        Load::Applied(snapshot)
    }

    pub fn abandon(&self) {
        self.generation.begin();
    }

    pub async fn snapshot(&self) -> Option<Snapshot<Alert>> {
        self.current.read().await.clone()
    }

    /// Working copy narrowed by `filter`, newest first.
    pub async fn visible(&self, filter: &AlertFilter) -> Vec<Alert> {
        match self.current.read().await.as_ref() {
            Some(snapshot) => filter_alerts(&snapshot.items, filter),
            None => Vec::new(),
        }
    }

    pub async fn stats(&self) -> AlertStats {
        match self.current.read().await.as_ref() {
            Some(snapshot) => AlertStats::from(snapshot.items.as_slice()),
            None => AlertStats::default(),
        }
    }

    /// CSV report of all alerts.
    ///
    /// When the backend export fails, the report is rendered from the
    /// working copy, or from the cached alerts if nothing is loaded. The
    /// gateway's own fallback report is used only when both are empty.
    pub async fn export_report(&self) -> Fetched<String> {
        let fallback = match self.api.export_alerts_report().await {
            Fetched::Fresh(report) => return Fetched::Fresh(report),
            Fetched::Fallback(report) => report,
        };

        let working = self
            .current
            .read()
            .await
            .as_ref()
            .map(|snapshot| snapshot.items.clone())
            .unwrap_or_default();
        let local = if working.is_empty() {
            self.cache.read_alerts().await
        } else {
            working
        };

        if local.is_empty() {
            Fetched::Fallback(fallback)
        } else {
            log::info!("Rendering alert report from {} local alerts", local.len());
            Fetched::Fallback(alerts_csv(&local))
        }
    }
}
