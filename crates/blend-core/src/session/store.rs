use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Shared key-value store the two sides rendezvous through.
///
/// No transactions: a read-modify-write by two writers at once is last
/// writer wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

/// Process-local store, mostly for tests and single-process use.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((expires_at, _)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((_, value)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (Instant::now() + ttl, value));
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    expires_at: DateTime<Utc>,
    value: String,
}

/// One JSON file per key under a directory, so two processes on one machine
/// (or a shared mount) can meet.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "Session miss (file does not exist)");
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        let stored: StoredValue = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key, error = %e, "Session file corrupt, deleting");
                if let Err(rm_err) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to delete corrupt session file: {}", rm_err);
                }
                return Ok(None);
            }
        };

        if stored.expires_at <= Utc::now() {
            debug!(key, expired_at = %stored.expires_at, "Session expired, deleting");
            if let Err(rm_err) = tokio::fs::remove_file(&path).await {
                warn!("Failed to delete expired session file: {}", rm_err);
            }
            return Ok(None);
        }
        Ok(Some(stored.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).context("Session TTL out of range")?;
        let stored = StoredValue {
            expires_at: Utc::now() + ttl,
            value,
        };
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(key, path = %path.display(), "Session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_expiry() {
        let store = MemorySessionStore::new();
        store.set("blend:ABC123", "v".to_string(), Duration::from_secs(10)).await.unwrap();
        assert_eq!(store.get("blend:ABC123").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.get("blend:ABC123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions")).unwrap();

        assert_eq!(store.get("blend:ABC123").await.unwrap(), None);
        store.set("blend:ABC123", "{}".to_string(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("blend:ABC123").await.unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("sessions/blend_ABC123.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_expired_entry_removed() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf()).unwrap();
        store.set("blend:OLD", "x".to_string(), Duration::ZERO).await.unwrap();

        assert_eq!(store.get("blend:OLD").await.unwrap(), None);
        assert!(!dir.path().join("blend_OLD.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_deleted() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("blend_BAD.json"), "not json").unwrap();

        assert_eq!(store.get("blend:BAD").await.unwrap(), None);
        assert!(!dir.path().join("blend_BAD.json").exists());
    }
}
