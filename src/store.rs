//! Durable storage for the connection record.
//!
//! The pool manager hands the accepted `ConnectionInfo` to a `ConfigStore`
//! after every successful reconfigure, and `main` loads it back at startup.
//! The persistence mechanism is a replaceable detail behind the trait; the
//! default is a JSON file next to the binary, the format the server has
//! always used.

use crate::error::{DbError, DbResult};
use crate::models::ConnectionInfo;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_CONFIG_PATH: &str = "db-config.json";

/// Persists and loads the single connection record.
pub trait ConfigStore: Send + Sync {
    /// The stored record, or None when nothing was ever saved.
    fn load(&self) -> DbResult<Option<ConnectionInfo>>;
    /// Replace the stored record.
    fn save(&self, info: &ConnectionInfo) -> DbResult<()>;
}

/// File-backed store (pretty-printed JSON).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> DbResult<Option<ConnectionInfo>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            DbError::persistence(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let info = serde_json::from_str(&content).map_err(|e| {
            DbError::persistence(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(info))
    }

    fn save(&self, info: &ConnectionInfo) -> DbResult<()> {
        let content = serde_json::to_string_pretty(info)
            .map_err(|e| DbError::persistence(format!("Failed to serialize connection: {}", e)))?;
        std::fs::write(&self.path, content).map_err(|e| {
            DbError::persistence(format!(
                "Failed to write {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<ConnectionInfo>>,
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> DbResult<Option<ConnectionInfo>> {
        Ok(self
            .slot
            .lock()
            .map_err(|_| DbError::internal("Config store lock poisoned"))?
            .clone())
    }

    fn save(&self, info: &ConnectionInfo) -> DbResult<()> {
        *self
            .slot
            .lock()
            .map_err(|_| DbError::internal("Config store lock poisoned"))? = Some(info.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> ConnectionInfo {
        serde_json::from_str(
            r#"{"host": "localhost", "database": "appdb", "user": "app", "password": "hunter2"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("db-config.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&sample_info()).unwrap();
        let loaded = store.load().unwrap().expect("record should exist");
        assert_eq!(loaded.host, "localhost");
        assert_eq!(loaded.database, "appdb");
        // The durable record keeps the secret; only summaries redact it.
        assert_eq!(loaded.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_file_store_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("db-config.json"));

        store.save(&sample_info()).unwrap();
        let mut second = sample_info();
        second.database = "otherdb".to_string();
        store.save(&second).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.database, "otherdb");
    }

    #[test]
    fn test_file_store_invalid_json_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db-config.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(DbError::Persistence { .. })));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        assert!(store.load().unwrap().is_none());
        store.save(&sample_info()).unwrap();
        assert_eq!(store.load().unwrap().unwrap().user, "app");
    }
}
