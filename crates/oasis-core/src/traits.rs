//! Storage trait definitions

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::entry::Entry;
use crate::error::StoreResult;
use crate::keys::VERSION_KEY;

/// Async key-value storage contract.
///
/// Keys are strings ordered lexicographically; values are any serde payload.
/// A missing value is `None` everywhere: reading an absent key yields `None`
/// and writing `None` deletes the key. The key [`VERSION_KEY`] is reserved for
/// [`AsyncStore::init`].
///
/// Futures are not `Send`: backends like IndexedDB live on a single-threaded
/// event loop. Independent calls are not ordered with respect to each other.
#[async_trait(?Send)]
pub trait AsyncStore {
    /// Returns the value stored under `key`, or `None` if absent.
    async fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> StoreResult<Option<T>>;

    /// Returns values for `keys`, aligned by index. Missing keys yield `None`.
    ///
    /// An empty `keys` slice resolves to an empty vector without touching storage.
    async fn get_all<T: DeserializeOwned + 'static>(
        &self,
        keys: &[String],
    ) -> StoreResult<Vec<Option<T>>>;

    /// Sets `key` to `value`, overwriting any previous value.
    /// `None` removes the key from the store.
    async fn set<T: Serialize>(&self, key: &str, value: Option<T>) -> StoreResult<()>;

    /// Applies [`AsyncStore::set`] semantics to every entry of `entries`.
    ///
    /// Atomic: either every entry is applied or none is.
    async fn set_all<T: Serialize>(&self, entries: HashMap<String, Option<T>>) -> StoreResult<()>;

    /// Returns all entries whose key starts with `prefix`, in ascending key order.
    /// `None` or an empty prefix lists the whole store.
    async fn list<T: DeserializeOwned + 'static>(
        &self,
        prefix: Option<&str>,
    ) -> StoreResult<Vec<Entry<T>>>;

    /// Removes every key, including [`VERSION_KEY`].
    async fn clear(&self) -> StoreResult<()>;

    /// Stamps the store with `schema_version`.
    ///
    /// When the stored version is absent or differs, the whole store is cleared
    /// before the new version is written. Calling it again with the same
    /// version is a no-op. Not safe to overlap with concurrent writes.
    async fn init(&self, schema_version: u32) -> StoreResult<()> {
        let stored: Option<serde_json::Value> = self.get(VERSION_KEY).await?;
        let current = stored.as_ref().and_then(serde_json::Value::as_u64);

        if current == Some(u64::from(schema_version)) {
            tracing::debug!(schema_version, "store version up to date");
            return Ok(());
        }

        tracing::info!(
            ?stored,
            schema_version,
            "store version mismatch, clearing store"
        );
        self.clear().await?;
        self.set(VERSION_KEY, Some(schema_version)).await
    }

    /// Point-in-time dump of the store, for introspection.
    ///
    /// Backends without a synchronous view of their data return
    /// [`crate::StoreError::Unsupported`].
    fn snapshot(&self) -> StoreResult<Vec<Entry<serde_json::Value>>>;
}
