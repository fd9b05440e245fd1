//! Browser WASM bindings for the IndexedDB store
//!
//! Exposes [`IndexedDbAsyncStore`] to JavaScript as `OasisStore`. Values cross
//! the boundary as plain JS values (converted through `serde_json::Value`);
//! a missing value is `undefined` in both directions.

use std::collections::HashMap;

use oasis_core::{AsyncStore, StoreError};
use oasis_indexeddb::{IndexedDbAsyncStore, StoreConfig};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

/// Default engine version when the caller does not pass one
const DEFAULT_ENGINE_VERSION: u32 = 1;

fn to_js_error(err: StoreError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| to_js_error(StoreError::Serialization(e.to_string())))
}

/// `undefined` maps to `None`; anything else must convert to a JSON value.
fn from_js(value: JsValue) -> Result<Option<Value>, JsValue> {
    if value.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(Some)
        .map_err(|e| to_js_error(StoreError::Serialization(e.to_string())))
}

fn optional_to_js(value: Option<Value>) -> Result<JsValue, JsValue> {
    match value {
        Some(value) => to_js(&value),
        None => Ok(JsValue::UNDEFINED),
    }
}

/// Async key-value store backed by IndexedDB.
#[wasm_bindgen(js_name = OasisStore)]
pub struct WasmAsyncStore {
    inner: IndexedDbAsyncStore,
}

#[wasm_bindgen(js_class = OasisStore)]
impl WasmAsyncStore {
    /// Create a store over `databaseName`/`objectStoreName`. Nothing is opened yet.
    #[wasm_bindgen(constructor)]
    pub fn new(
        database_name: &str,
        object_store_name: &str,
        engine_version: Option<u32>,
    ) -> Result<WasmAsyncStore, JsValue> {
        let inner = IndexedDbAsyncStore::with_names(
            database_name,
            object_store_name,
            engine_version.unwrap_or(DEFAULT_ENGINE_VERSION),
        )
        .map_err(to_js_error)?;
        Ok(Self { inner })
    }

    /// Create a store from `{databaseName, objectStoreName, engineVersion}`.
    /// Missing fields take their defaults.
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config: JsValue) -> Result<WasmAsyncStore, JsValue> {
        let config: StoreConfig = if config.is_undefined() || config.is_null() {
            StoreConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| to_js_error(StoreError::Config(e.to_string())))?
        };
        let inner = IndexedDbAsyncStore::new(config).map_err(to_js_error)?;
        Ok(Self { inner })
    }

    /// Resolves to the value stored under `key`, or `undefined`.
    pub async fn get(&self, key: String) -> Result<JsValue, JsValue> {
        let value = self.inner.get::<Value>(&key).await.map_err(to_js_error)?;
        optional_to_js(value)
    }

    /// Resolves to an array aligned with `keys`; missing keys are `undefined`.
    #[wasm_bindgen(js_name = getAll)]
    pub async fn get_all(&self, keys: Vec<String>) -> Result<js_sys::Array, JsValue> {
        let values = self
            .inner
            .get_all::<Value>(&keys)
            .await
            .map_err(to_js_error)?;

        let array = js_sys::Array::new_with_length(values.len() as u32);
        for (i, value) in values.into_iter().enumerate() {
            array.set(i as u32, optional_to_js(value)?);
        }
        Ok(array)
    }

    /// Upsert `value` under `key`; `undefined` deletes the key.
    pub async fn set(&self, key: String, value: JsValue) -> Result<(), JsValue> {
        let value = from_js(value)?;
        self.inner.set(&key, value).await.map_err(to_js_error)
    }

    /// Apply `set` to every own property of `entries` in one transaction.
    #[wasm_bindgen(js_name = setAll)]
    pub async fn set_all(&self, entries: js_sys::Object) -> Result<(), JsValue> {
        let mut batch: HashMap<String, Option<Value>> = HashMap::new();
        for pair in js_sys::Object::entries(&entries).iter() {
            let pair = js_sys::Array::from(&pair);
            let key = pair
                .get(0)
                .as_string()
                .ok_or_else(|| to_js_error(StoreError::InvalidKey("non-string key".into())))?;
            batch.insert(key, from_js(pair.get(1))?);
        }
        self.inner.set_all(batch).await.map_err(to_js_error)
    }

    /// Resolves to `[{key, value}]` for keys starting with `prefix`, in key order.
    pub async fn list(&self, prefix: Option<String>) -> Result<JsValue, JsValue> {
        let entries = self
            .inner
            .list::<Value>(prefix.as_deref())
            .await
            .map_err(to_js_error)?;
        to_js(&entries)
    }

    /// Remove every key, including the version marker.
    pub async fn clear(&self) -> Result<(), JsValue> {
        self.inner.clear().await.map_err(to_js_error)
    }

    /// Clear the store unless it is already stamped with `schemaVersion`.
    pub async fn init(&self, schema_version: u32) -> Result<(), JsValue> {
        self.inner.init(schema_version).await.map_err(to_js_error)
    }

    /// Always throws: IndexedDB has no synchronous view of its data.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let entries = self.inner.snapshot().map_err(to_js_error)?;
        to_js(&entries)
    }

    /// Delete a whole database by name.
    #[wasm_bindgen(js_name = deleteDatabase)]
    pub async fn delete_database(database_name: String) -> Result<(), JsValue> {
        IndexedDbAsyncStore::delete_database(&database_name)
            .await
            .map_err(to_js_error)
    }
}
