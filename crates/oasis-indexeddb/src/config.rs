//! Store configuration types

use oasis_core::{StoreError, StoreResult};
use serde::Deserialize;

/// Selects the IndexedDB database and object store backing an
/// [`crate::IndexedDbAsyncStore`].
///
/// `engine_version` is the version passed to `indexedDB.open()` and drives the
/// engine's own upgrade hook. It is unrelated to the application schema
/// version given to `AsyncStore::init`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// IndexedDB database name
    pub database_name: String,
    /// Object store holding the `{key, value}` records
    pub object_store_name: String,
    /// Engine schema version used to open the database
    pub engine_version: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_name: "oasis".to_string(),
            object_store_name: "kv".to_string(),
            engine_version: 1,
        }
    }
}

impl StoreConfig {
    pub fn new(
        database_name: impl Into<String>,
        object_store_name: impl Into<String>,
        engine_version: u32,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            object_store_name: object_store_name.into(),
            engine_version,
        }
    }

    /// Parse a JSON config. Missing fields take their default.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.database_name.is_empty() {
            return Err(StoreError::Config("database name is empty".to_string()));
        }
        if self.object_store_name.is_empty() {
            return Err(StoreError::Config("object store name is empty".to_string()));
        }
        // indexedDB.open() throws a TypeError for version 0
        if self.engine_version == 0 {
            return Err(StoreError::Config(
                "engine version must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
