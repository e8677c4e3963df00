//! Keyed JSON document store.

use std::sync::Arc;

use opendal::{ErrorKind, Operator, services};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};
use tokio::sync::Mutex;

use crate::TRACING_TARGET;
use crate::config::{StoreBackend, StoreConfig};
use crate::error::{StoreError, StoreResult};

/// Stored document body.
pub type Record = Map<String, Value>;

/// Field stamped with the last write time.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Result of [`DocumentStore::upsert_by_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpsertStatus {
    Inserted,
    Updated,
}

/// JSON document store over an OpenDAL operator.
#[derive(Clone)]
pub struct DocumentStore {
    operator: Operator,
    config: StoreConfig,
    // Serializes read-modify-write cycles within this process.
    write_lock: Arc<Mutex<()>>,
}

impl DocumentStore {
    /// Creates a store from configuration.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = %config.store_backend,
            root = ?config.store_root,
            "Document store initialized"
        );

        Ok(Self {
            operator,
            config,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Returns the configuration for this store.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Reads the record stored under `key`, if any.
    pub async fn get_by_key(&self, collection: &str, key: &str) -> StoreResult<Option<Record>> {
        let path = record_path(collection, key)?;

        let bytes = match self.operator.read(&path).await {
            Ok(buffer) => buffer.to_vec(),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(target: TRACING_TARGET, path = %path, "Record not found");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(record)) => Ok(Some(record)),
            Ok(_) => Err(StoreError::corrupt(path, "not a JSON object")),
            Err(err) => Err(StoreError::corrupt(path, err)),
        }
    }

    /// Merges `fields` into the record stored under `key`.
    ///
    /// Top-level keys in `fields` replace the stored ones; other stored keys
    /// are kept. Missing records are created.
    pub async fn upsert_by_key(
        &self,
        collection: &str,
        key: &str,
        fields: Record,
    ) -> StoreResult<UpsertStatus> {
        let path = record_path(collection, key)?;
        let _guard = self.write_lock.lock().await;

        let (mut record, status) = match self.get_by_key(collection, key).await? {
            Some(existing) => (existing, UpsertStatus::Updated),
            None => (Record::new(), UpsertStatus::Inserted),
        };

        record.extend(fields);
        record.insert(
            UPDATED_AT_FIELD.to_owned(),
            Value::String(jiff::Timestamp::now().to_string()),
        );

        let bytes = serde_json::to_vec(&record)?;
        self.operator.write(&path, bytes).await?;

        tracing::info!(
            target: TRACING_TARGET,
            collection,
            key,
            status = %status,
            "Record stored"
        );

        Ok(status)
    }

    fn create_operator(config: &StoreConfig) -> StoreResult<Operator> {
        match config.store_backend {
            StoreBackend::Memory => Operator::new(services::Memory::default())
                .map(|op| op.finish())
                .map_err(|e| StoreError::init(e.to_string())),
            StoreBackend::Fs => {
                let root = config
                    .store_root
                    .as_ref()
                    .ok_or_else(|| StoreError::init("STORE_ROOT is required for the fs backend"))?;
                let builder = services::Fs::default().root(&root.to_string_lossy());

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StoreError::init(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn record_path(collection: &str, key: &str) -> StoreResult<String> {
    for (name, segment) in [("collection", collection), ("key", key)] {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains(['/', '\\'])
        {
            return Err(StoreError::invalid_path(format!(
                "{name} '{segment}' is not a valid path segment"
            )));
        }
    }
    Ok(format!("{collection}/{key}.json"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[tokio::test]
    async fn test_insert_then_update() -> StoreResult<()> {
        let store = DocumentStore::new(StoreConfig::memory())?;

        let status = store
            .upsert_by_key(
                "match_details",
                "91916",
                record(json!({ "match_id": 91916, "home_team": "IND" })),
            )
            .await?;
        assert_eq!(status, UpsertStatus::Inserted);

        let status = store
            .upsert_by_key(
                "match_details",
                "91916",
                record(json!({ "match_details_summary": "India host Pakistan." })),
            )
            .await?;
        assert_eq!(status, UpsertStatus::Updated);

        let stored = store.get_by_key("match_details", "91916").await?.unwrap();
        assert_eq!(stored["home_team"], json!("IND"));
        assert_eq!(stored["match_details_summary"], json!("India host Pakistan."));
        assert!(stored[UPDATED_AT_FIELD].as_str().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_record_is_none() -> StoreResult<()> {
        let store = DocumentStore::new(StoreConfig::memory())?;
        assert!(store.get_by_key("match_stats", "1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_collections_are_separate() -> StoreResult<()> {
        let store = DocumentStore::new(StoreConfig::memory())?;
        store
            .upsert_by_key("match_details", "1", record(json!({ "a": 1 })))
            .await?;

        assert!(store.get_by_key("match_stats", "1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_fs_backend_persists() -> StoreResult<()> {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(StoreConfig::fs(dir.path()))?;
        store
            .upsert_by_key(
                "match_descriptions",
                "match_stats",
                record(json!({ "description_type": "match_stats" })),
            )
            .await?;

        assert!(dir.path().join("match_descriptions/match_stats.json").exists());

        let reopened = DocumentStore::new(StoreConfig::fs(dir.path()))?;
        let stored = reopened
            .get_by_key("match_descriptions", "match_stats")
            .await?
            .unwrap();
        assert_eq!(stored["description_type"], json!("match_stats"));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_record() -> StoreResult<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("match_stats")).unwrap();
        std::fs::write(dir.path().join("match_stats/7.json"), b"[1, 2]").unwrap();

        let store = DocumentStore::new(StoreConfig::fs(dir.path()))?;
        assert!(matches!(
            store.get_by_key("match_stats", "7").await,
            Err(StoreError::Corrupt { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_path_traversal() {
        assert!(record_path("match_stats", "../etc").is_err());
        assert!(record_path("", "1").is_err());
        assert!(record_path("match_stats", "..").is_err());
        assert_eq!(record_path("match_stats", "1").unwrap(), "match_stats/1.json");
    }
}
