//! Local cache of last-known-good collections and the signed-in session.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! ├── stations.json     # Last fetched station collection
//! ├── alerts.json       # Last fetched alert collection
//! └── session/
//!     ├── user.json     # Signed-in user record
//!     └── token         # Opaque session token
//! ```
//!
//! Collection slots are wrapped in an envelope carrying the write time.
//! A slot is only ever replaced whole. Reads never fail: a missing slot and a
//! slot that no longer parses both read back as an empty collection.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Alert, AuthSession, Station, User};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Named collection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSlot {
    Stations,
    Alerts,
}

impl CacheSlot {
    /// Storage key of the slot.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Stations => "stations.json",
            Self::Alerts => "alerts.json",
        }
    }
}

const USER_KEY: &str = "session/user.json";
const TOKEN_KEY: &str = "session/token";

/// Stored form of a cached collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    /// When the collection was written
    pub updated_at: DateTime<Utc>,
    /// Number of items
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> CacheEnvelope<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: items.len(),
            items,
        }
    }
}

/// Raw keyed byte storage the cache is built on.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Read a key, `None` when it does not exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a key's contents. Readers see either the old or the new bytes.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Last-known-good station and alert collections.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn write_stations(&self, stations: &[Station]) -> Result<()>;

    /// Cached stations, empty when nothing usable is cached.
    async fn read_stations(&self) -> Vec<Station>;

    async fn write_alerts(&self, alerts: &[Alert]) -> Result<()>;

    /// Cached alerts, empty when nothing usable is cached.
    async fn read_alerts(&self) -> Vec<Alert>;

    /// When a slot was last written, `None` if it holds nothing usable.
    async fn cached_at(&self, slot: CacheSlot) -> Option<DateTime<Utc>>;
}

/// Persisted sign-in state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_session(&self, session: &AuthSession) -> Result<()>;

    /// Restored session, `None` unless both user and token are present.
    async fn load_session(&self) -> Option<AuthSession>;

    async fn clear_session(&self) -> Result<()>;
}

/// Read and decode a slot envelope, treating any failure as a miss.
async fn read_envelope<T, S>(store: &S, slot: CacheSlot) -> Option<CacheEnvelope<T>>
where
    T: DeserializeOwned,
    S: SlotStore + ?Sized,
{
    let bytes = match store.read_bytes(slot.key()).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::debug!("Cache miss for {}", slot.key());
            return None;
        }
        Err(e) => {
            log::warn!("Failed to read cache slot {}: {}", slot.key(), e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            log::warn!("Ignoring corrupt cache slot {}: {}", slot.key(), e);
            None
        }
    }
}

async fn write_envelope<T, S>(store: &S, slot: CacheSlot, items: &[T]) -> Result<()>
where
    T: Serialize + Clone + Send + Sync,
    S: SlotStore + ?Sized,
{
    let envelope = CacheEnvelope::new(items.to_vec());
    let bytes = serde_json::to_vec_pretty(&envelope)?;
    store.write_bytes(slot.key(), &bytes).await?;
    log::debug!("Cached {} items in {}", envelope.count, slot.key());
    Ok(())
}

#[async_trait]
impl<S: SlotStore> CacheStore for S {
    async fn write_stations(&self, stations: &[Station]) -> Result<()> {
        write_envelope(self, CacheSlot::Stations, stations).await
    }

    async fn read_stations(&self) -> Vec<Station> {
        read_envelope(self, CacheSlot::Stations)
            .await
            .map(|e| e.items)
            .unwrap_or_default()
    }

    async fn write_alerts(&self, alerts: &[Alert]) -> Result<()> {
        write_envelope(self, CacheSlot::Alerts, alerts).await
    }

    async fn read_alerts(&self) -> Vec<Alert> {
        read_envelope(self, CacheSlot::Alerts)
            .await
            .map(|e| e.items)
            .unwrap_or_default()
    }

    async fn cached_at(&self, slot: CacheSlot) -> Option<DateTime<Utc>> {
        // Decoded as untyped values so a timestamp check does not depend on
        // the item schema.
        read_envelope::<serde_json::Value, _>(self, slot)
            .await
            .map(|e| e.updated_at)
    }
}

#[async_trait]
impl<S: SlotStore> SessionStore for S {
    async fn save_session(&self, session: &AuthSession) -> Result<()> {
        let user = serde_json::to_vec_pretty(&session.user)?;
        self.write_bytes(USER_KEY, &user).await?;
        self.write_bytes(TOKEN_KEY, session.token.as_bytes()).await
    }

    async fn load_session(&self) -> Option<AuthSession> {
        let user = self.read_bytes(USER_KEY).await.ok().flatten()?;
        let token = self.read_bytes(TOKEN_KEY).await.ok().flatten()?;

        let user: User = match serde_json::from_slice(&user) {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Ignoring corrupt stored user: {}", e);
                return None;
            }
        };
        let token = String::from_utf8(token).ok()?.trim().to_string();
        if token.is_empty() {
            return None;
        }

        Some(AuthSession { user, token })
    }

    async fn clear_session(&self) -> Result<()> {
        self.remove(USER_KEY).await?;
        self.remove(TOKEN_KEY).await
    }
}
