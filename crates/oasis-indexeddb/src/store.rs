//! IndexedDB adapter implementing the `AsyncStore` contract.
//!
//! Every operation opens the database, runs one transaction against the
//! configured object store and closes the handle again:
//! open -> (upgrade if needed) -> transact -> resolve/reject.

use std::collections::HashMap;

use async_trait::async_trait;
use oasis_core::{
    logging::prefix, prefix_bounds, validate_key, AsyncStore, Entry, IndexedJoin, StoreError,
    StoreResult,
};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;
use web_sys::{IdbKeyRange, IdbTransactionMode};

use crate::config::StoreConfig;
use crate::error::IndexedDbError;
use crate::idb::{self, Connection, RequestHandlers, KEY_PATH};

const VALUE_FIELD: &str = "value";

/// IndexedDB-backed key-value store for browser WASM.
///
/// Records are plain JS objects `{key, value}` keyed by `key`. Values are
/// converted with `serde-wasm-bindgen` in JSON-compatible mode, so the engine
/// stores them through its native structured clone.
///
/// No connection is cached: each call opens its own handle and drops it when
/// the operation settles. [`AsyncStore::snapshot`] is not supported.
#[derive(Debug, Clone)]
pub struct IndexedDbAsyncStore {
    config: StoreConfig,
}

impl IndexedDbAsyncStore {
    /// Create an adapter for the database and object store named by `config`.
    ///
    /// Nothing is opened until the first operation.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_names(
        database_name: &str,
        object_store_name: &str,
        engine_version: u32,
    ) -> StoreResult<Self> {
        Self::new(StoreConfig::new(
            database_name,
            object_store_name,
            engine_version,
        ))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Delete a whole database (for testing/cleanup).
    pub async fn delete_database(database_name: &str) -> StoreResult<()> {
        idb::delete_database(database_name).await.map_err(|e| {
            tracing::error!(db = database_name, error = %e, "{} IndexedDB delete failed", prefix::DB);
            StoreError::from(e)
        })
    }

    async fn connect(&self) -> StoreResult<Connection> {
        tracing::trace!(
            db = %self.config.database_name,
            version = self.config.engine_version,
            "opening IndexedDB"
        );
        Ok(idb::open_database(&self.config).await?)
    }

    /// Log a failed operation before handing the error back to the caller.
    fn failed(&self, op: &'static str, key: &str, err: StoreError) -> StoreError {
        tracing::error!(
            db = %self.config.database_name,
            store = %self.config.object_store_name,
            key,
            error = %err,
            "{} IndexedDB {} failed",
            prefix::DB,
            op
        );
        err
    }

    // ========================================================================
    // Operations, one transaction each
    // ========================================================================

    async fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let conn = self.connect().await?;
        let (_tx, store) = conn.transaction(IdbTransactionMode::Readonly)?;

        let req = store
            .get(&JsValue::from_str(key))
            .map_err(IndexedDbError::from)?;
        let record = idb::await_request(&req).await?;

        Ok(record_value(&record)?)
    }

    async fn read_many<T: DeserializeOwned + 'static>(
        &self,
        keys: &[String],
    ) -> StoreResult<Vec<Option<T>>> {
        let conn = self.connect().await?;
        let (_tx, store) = conn.transaction(IdbTransactionMode::Readonly)?;

        let (join, wait) = IndexedJoin::<Option<T>>::new(keys.len());
        let mut handlers = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            let req = store
                .get(&JsValue::from_str(key))
                .map_err(IndexedDbError::from)?;

            let join = join.clone();
            handlers.push(RequestHandlers::attach(&req, move |outcome| {
                match outcome.and_then(|record| record_value::<T>(&record)) {
                    Ok(value) => join.complete(index, value),
                    Err(e) => join.fail(e.into()),
                }
            }));
        }

        let values = wait.wait().await;
        // Requests still in flight after a failure must not call back into dropped closures
        drop(handlers);
        values
    }

    async fn write(&self, key: &str, record: Option<JsValue>) -> StoreResult<()> {
        let conn = self.connect().await?;
        let (tx, store) = conn.transaction(IdbTransactionMode::Readwrite)?;
        let done = idb::watch_transaction(&tx);

        let req = match record {
            Some(record) => store.put(&record),
            None => store.delete(&JsValue::from_str(key)),
        }
        .map_err(IndexedDbError::from)?;

        idb::await_request(&req).await?;
        done.wait().await?;
        Ok(())
    }

    async fn write_batch(&self, records: Vec<(String, Option<JsValue>)>) -> StoreResult<()> {
        let conn = self.connect().await?;
        let (tx, store) = conn.transaction(IdbTransactionMode::Readwrite)?;
        let done = idb::watch_transaction(&tx);

        for (key, record) in &records {
            let issued = match record {
                Some(record) => store.put(record),
                None => store.delete(&JsValue::from_str(key)),
            };
            if let Err(e) = issued {
                tracing::warn!(
                    db = %self.config.database_name,
                    key = %key,
                    "{} batch request rejected, aborting transaction",
                    prefix::DB
                );
                idb::abort_transaction(&tx, "setAll");
                return Err(IndexedDbError::from(e).into());
            }
        }

        // Success is the transaction's completion, not the individual requests
        done.wait().await?;
        Ok(())
    }

    async fn scan<T: DeserializeOwned>(&self, prefix: &str) -> StoreResult<Vec<Entry<T>>> {
        let (lower, upper) = prefix_bounds(prefix);
        let range = IdbKeyRange::bound(&JsValue::from_str(&lower), &JsValue::from_str(&upper))
            .map_err(IndexedDbError::from)?;

        let conn = self.connect().await?;
        let (_tx, store) = conn.transaction(IdbTransactionMode::Readonly)?;

        let req = store
            .get_all_with_key(&range)
            .map_err(IndexedDbError::from)?;
        let result = idb::await_request(&req).await?;

        let records = js_sys::Array::from(&result);
        let mut entries = Vec::with_capacity(records.length() as usize);
        for record in records.iter() {
            entries.push(record_entry(&record)?);
        }
        Ok(entries)
    }

    async fn wipe(&self) -> StoreResult<()> {
        let conn = self.connect().await?;
        let (tx, store) = conn.transaction(IdbTransactionMode::Readwrite)?;
        let done = idb::watch_transaction(&tx);

        let req = store.clear().map_err(IndexedDbError::from)?;
        idb::await_request(&req).await?;
        done.wait().await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl AsyncStore for IndexedDbAsyncStore {
    async fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> StoreResult<Option<T>> {
        self.read(key).await.map_err(|e| self.failed("get", key, e))
    }

    async fn get_all<T: DeserializeOwned + 'static>(
        &self,
        keys: &[String],
    ) -> StoreResult<Vec<Option<T>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.read_many(keys)
            .await
            .map_err(|e| self.failed("getAll", &keys.join(","), e))
    }

    async fn set<T: Serialize>(&self, key: &str, value: Option<T>) -> StoreResult<()> {
        let op = if value.is_some() { "put" } else { "delete" };
        let result: StoreResult<()> = async {
            validate_key(key)?;
            let record = value.map(|v| to_record(key, &v)).transpose()?;
            self.write(key, record).await
        }
        .await;
        result.map_err(|e| self.failed(op, key, e))
    }

    async fn set_all<T: Serialize>(&self, entries: HashMap<String, Option<T>>) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = entries.keys().cloned().collect();
        let result: StoreResult<()> = async {
            let mut records = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                validate_key(&key)?;
                let record = value.map(|v| to_record(&key, &v)).transpose()?;
                records.push((key, record));
            }
            self.write_batch(records).await
        }
        .await;
        result.map_err(|e| self.failed("setAll", &keys.join(","), e))
    }

    async fn list<T: DeserializeOwned + 'static>(
        &self,
        prefix: Option<&str>,
    ) -> StoreResult<Vec<Entry<T>>> {
        let prefix = prefix.unwrap_or_default();
        let result: StoreResult<Vec<Entry<T>>> = async {
            validate_key(prefix)?;
            self.scan(prefix).await
        }
        .await;
        result.map_err(|e| self.failed("list", prefix, e))
    }

    async fn clear(&self) -> StoreResult<()> {
        self.wipe().await.map_err(|e| self.failed("clear", "", e))
    }

    fn snapshot(&self) -> StoreResult<Vec<Entry<serde_json::Value>>> {
        Err(self.failed(
            "snapshot",
            "",
            StoreError::Unsupported("snapshot".to_string()),
        ))
    }
}

// ============================================================================
// JS <-> record conversion
// ============================================================================

/// Build the `{key, value}` record stored for `key`.
fn to_record<T: Serialize>(key: &str, value: &T) -> Result<JsValue, IndexedDbError> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let value = value.serialize(&serializer)?;

    let record = js_sys::Object::new();
    js_sys::Reflect::set(&record, &KEY_PATH.into(), &JsValue::from_str(key))?;
    js_sys::Reflect::set(&record, &VALUE_FIELD.into(), &value)?;
    Ok(record.into())
}

/// Value of a record returned by a `get` request; absent records yield `None`.
fn record_value<T: DeserializeOwned>(record: &JsValue) -> Result<Option<T>, IndexedDbError> {
    if record.is_undefined() || record.is_null() {
        return Ok(None);
    }
    let value = js_sys::Reflect::get(record, &VALUE_FIELD.into())?;
    if value.is_undefined() {
        return Ok(None);
    }
    Ok(Some(serde_wasm_bindgen::from_value(value)?))
}

/// Convert a record from a range query into an [`Entry`].
fn record_entry<T: DeserializeOwned>(record: &JsValue) -> Result<Entry<T>, IndexedDbError> {
    let key = js_sys::Reflect::get(record, &KEY_PATH.into())?
        .as_string()
        .ok_or_else(|| IndexedDbError::Record("record key is not a string".into()))?;
    let value = js_sys::Reflect::get(record, &VALUE_FIELD.into())?;
    let value = serde_wasm_bindgen::from_value(value)?;
    Ok(Entry { key, value })
}
