//! Local filesystem storage implementation.
//!
//! Each key is a file under the root directory. Writes go to a temporary
//! sibling first and are renamed into place, so a reader never observes a
//! half-written slot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::SlotStore;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SlotStore for LocalStorage {
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FallbackData;
    use crate::models::{AuthSession, Station};
    use crate::storage::{CacheSlot, CacheStore, SessionStore};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!tmp.path().join("test.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
        storage.remove("nope.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_stations_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested/cache"));
        let stations = FallbackData::demo().stations();

        storage.write_stations(&stations).await.unwrap();

        assert_eq!(storage.read_stations().await, stations);
        assert!(storage.cached_at(CacheSlot::Stations).await.is_some());
        assert!(storage.cached_at(CacheSlot::Alerts).await.is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_whole_slot() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let stations = FallbackData::demo().stations();

        storage.write_stations(&stations).await.unwrap();
        storage.write_stations(&stations[..2]).await.unwrap();

        let read: Vec<Station> = storage.read_stations().await;
        assert_eq!(read, stations[..2].to_vec());
    }

    #[tokio::test]
    async fn test_corrupt_slot_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        std::fs::write(tmp.path().join("alerts.json"), "{ not json").unwrap();
        assert!(storage.read_alerts().await.is_empty());
        assert!(storage.cached_at(CacheSlot::Alerts).await.is_none());

        // A bare array from an older layout is not an envelope either.
        std::fs::write(tmp.path().join("stations.json"), "[]").unwrap();
        assert!(storage.read_stations().await.is_empty());
    }

    #[tokio::test]
    async fn test_session_save_load_clear() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let session = FallbackData::demo()
            .login("citizen@example.com")
            .unwrap();

        assert!(storage.load_session().await.is_none());

        storage.save_session(&session).await.unwrap();
        assert_eq!(storage.load_session().await, Some(session.clone()));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("session/token")).unwrap(),
            session.token
        );

        storage.clear_session().await.unwrap();
        assert!(storage.load_session().await.is_none());
        storage.clear_session().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_requires_token() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let session: AuthSession = FallbackData::demo()
            .login("researcher@example.com")
            .unwrap();

        storage.save_session(&session).await.unwrap();
        storage.remove("session/token").await.unwrap();
        assert!(storage.load_session().await.is_none());
    }
}
