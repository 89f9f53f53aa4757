// ============================================================================
// TokenStore - Persisted bearer tokens (redb)
// ============================================================================
// Stand-in for browser local storage: a flat string table with fixed keys.
// Default path: ~/.agrichain/session.redb (override via AGRI_STATE_PATH)
// ============================================================================

use anyhow::{anyhow, Result};
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Storage key for the access token
pub const TOKEN_KEY: &str = "token";
/// Storage key for the refresh token
pub const REFRESH_KEY: &str = "refresh";

const LOCAL_STORAGE: TableDefinition<&str, &str> = TableDefinition::new("local_storage");

/// Key/value storage for session tokens
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Returns whether the key existed
    fn remove(&self, key: &str) -> Result<bool>;

    fn access_token(&self) -> Result<Option<String>> {
        self.get(TOKEN_KEY)
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        self.get(REFRESH_KEY)
    }

    /// Store both tokens from a login response
    fn store_tokens(&self, token: &str, refresh: &str) -> Result<()> {
        self.set(TOKEN_KEY, token)?;
        self.set(REFRESH_KEY, refresh)
    }

    /// Drop both tokens
    fn clear_tokens(&self) -> Result<()> {
        self.remove(TOKEN_KEY)?;
        self.remove(REFRESH_KEY)?;
        Ok(())
    }
}

// ============================================================================
// redb-backed store
// ============================================================================

/// Token store persisted in an embedded redb file
pub struct RedbTokenStore {
    db: Database,
    path: PathBuf,
}

impl RedbTokenStore {
    /// Open (or create) the store at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| anyhow!("Failed to create state directory: {}", e))?;
            }
        }

        info!("Opening token store at: {}", path.display());

        let db = Database::create(path).map_err(|e| anyhow!("Failed to open token store: {}", e))?;

        // Ensure the table exists so reads never fail on a fresh file
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn
                .open_table(LOCAL_STORAGE)
                .map_err(|e| anyhow!("Failed to create local_storage table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for RedbTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn
            .open_table(LOCAL_STORAGE)
            .map_err(|e| anyhow!("Failed to open local_storage table: {}", e))?;

        let value = table
            .get(key)
            .map_err(|e| anyhow!("Failed to read '{}': {}", key, e))?
            .map(|v| v.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn
                .open_table(LOCAL_STORAGE)
                .map_err(|e| anyhow!("Failed to open local_storage table: {}", e))?;
            table
                .insert(key, value)
                .map_err(|e| anyhow!("Failed to write '{}': {}", key, e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;

        debug!("Stored '{}'", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let removed;
        {
            let mut table = write_txn
                .open_table(LOCAL_STORAGE)
                .map_err(|e| anyhow!("Failed to open local_storage table: {}", e))?;
            removed = table
                .remove(key)
                .map_err(|e| anyhow!("Failed to remove '{}': {}", key, e))?
                .is_some();
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        if removed {
            debug!("Removed '{}'", key);
        }
        Ok(removed)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Non-persistent store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded with an access token
    pub fn with_token(token: &str) -> Self {
        let store = Self::default();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(TOKEN_KEY.to_string(), token.to_string());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        Ok(entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redb_roundtrip_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.redb");

        {
            let store = RedbTokenStore::open(&path).unwrap();
            assert_eq!(store.access_token().unwrap(), None);
            store.store_tokens("access-1", "refresh-1").unwrap();
        }

        let store = RedbTokenStore::open(&path).unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_redb_clear_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbTokenStore::open(&dir.path().join("session.redb")).unwrap();

        store.store_tokens("a", "r").unwrap();
        store.set("language", "hi").unwrap();
        store.clear_tokens().unwrap();

        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
        // Unrelated keys survive
        assert_eq!(store.get("language").unwrap().as_deref(), Some("hi"));
        assert!(!store.remove(TOKEN_KEY).unwrap());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::with_token("seed");
        assert_eq!(store.access_token().unwrap().as_deref(), Some("seed"));
        assert!(store.remove(TOKEN_KEY).unwrap());
        assert!(!store.remove(TOKEN_KEY).unwrap());
    }
}
