//! In-memory storage backend
//!
//! A BTreeMap-based implementation for testing and development.
//! Not suitable for production use due to lack of persistence.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::entry::Entry;
use crate::error::StoreResult;
use crate::keys::{prefix_bounds, validate_key};
use crate::traits::AsyncStore;

/// In-memory key-value store.
///
/// Values are kept as `serde_json::Value`, so every write and read is a deep
/// copy like a structured-clone engine would make. Useful for:
/// - Unit testing code written against [`AsyncStore`]
/// - Short-lived processes that don't need persistence
///
/// Unlike persistent backends it supports [`AsyncStore::snapshot`].
#[derive(Debug, Default)]
pub struct MemoryAsyncStore {
    entries: RefCell<BTreeMap<String, Value>>,
}

impl MemoryAsyncStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn decode<T: DeserializeOwned>(value: &Value) -> StoreResult<T> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

#[async_trait(?Send)]
impl AsyncStore for MemoryAsyncStore {
    async fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> StoreResult<Option<T>> {
        self.entries
            .borrow()
            .get(key)
            .map(Self::decode)
            .transpose()
    }

    async fn get_all<T: DeserializeOwned + 'static>(
        &self,
        keys: &[String],
    ) -> StoreResult<Vec<Option<T>>> {
        let entries = self.entries.borrow();
        keys.iter()
            .map(|key| entries.get(key).map(Self::decode).transpose())
            .collect()
    }

    async fn set<T: Serialize>(&self, key: &str, value: Option<T>) -> StoreResult<()> {
        validate_key(key)?;
        match value {
            Some(value) => {
                let value = serde_json::to_value(value)?;
                self.entries.borrow_mut().insert(key.to_string(), value);
            }
            None => {
                self.entries.borrow_mut().remove(key);
            }
        }
        Ok(())
    }

    async fn set_all<T: Serialize>(&self, entries: HashMap<String, Option<T>>) -> StoreResult<()> {
        // Encode the whole batch before touching the map so a failure applies nothing.
        let mut batch = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            validate_key(&key)?;
            let value = value.map(serde_json::to_value).transpose()?;
            batch.push((key, value));
        }

        let mut map = self.entries.borrow_mut();
        for (key, value) in batch {
            match value {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn list<T: DeserializeOwned + 'static>(
        &self,
        prefix: Option<&str>,
    ) -> StoreResult<Vec<Entry<T>>> {
        let prefix = prefix.unwrap_or_default();
        validate_key(prefix)?;
        let (lower, upper) = prefix_bounds(prefix);

        self.entries
            .borrow()
            .range(lower..=upper)
            .map(|(key, value)| Ok(Entry::new(key.clone(), Self::decode(value)?)))
            .collect()
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn snapshot(&self) -> StoreResult<Vec<Entry<Value>>> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .map(|(key, value)| Entry::new(key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::VERSION_KEY;
    use crate::StoreError;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        theme: String,
        font_size: u8,
    }

    #[tokio::test]
    async fn test_set_and_get_struct() {
        let store = MemoryAsyncStore::new();
        let settings = Settings {
            theme: "dark".to_string(),
            font_size: 14,
        };

        store.set("settings", Some(settings.clone())).await.unwrap();

        let retrieved: Option<Settings> = store.get("settings").await.unwrap();
        assert_eq!(retrieved, Some(settings));
    }

    #[tokio::test]
    async fn test_get_wrong_type_is_serialization_error() {
        let store = MemoryAsyncStore::new();
        store.set("n", Some("not a number")).await.unwrap();

        let result = store.get::<u32>("n").await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_set_all_rejects_whole_batch_on_invalid_key() {
        let store = MemoryAsyncStore::new();
        let mut batch = HashMap::new();
        batch.insert("ok".to_string(), Some(1));
        batch.insert("bad~key".to_string(), Some(2));

        let result = store.set_all(batch).await;

        assert_eq!(result, Err(StoreError::InvalidKey("bad~key".to_string())));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_prefix_with_sentinel_rejected() {
        let store = MemoryAsyncStore::new();
        let result = store.list::<u32>(Some("~")).await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_snapshot_is_sorted_and_detached() {
        let store = MemoryAsyncStore::new();
        store.set("b", Some(2)).await.unwrap();
        store.set("a", Some(1)).await.unwrap();
        store.init(3).await.unwrap();
        store.set("c", Some(3)).await.unwrap();

        let snapshot = store.snapshot().unwrap();
        store.clear().await.unwrap();

        assert_eq!(
            snapshot,
            vec![
                Entry::new("c", serde_json::json!(3)),
                Entry::new(VERSION_KEY, serde_json::json!(3)),
            ]
        );
        assert!(store.snapshot().unwrap().is_empty());
    }
}
