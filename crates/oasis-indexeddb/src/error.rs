//! Error types for the IndexedDB adapter

use oasis_core::StoreError;
use thiserror::Error;

/// Result type for IndexedDB operations
pub type Result<T> = std::result::Result<T, IndexedDbError>;

/// Errors that can occur while talking to IndexedDB
#[derive(Debug, Error)]
pub enum IndexedDbError {
    /// IndexedDB is not available in this environment
    #[error("IndexedDB not available: {0}")]
    NotAvailable(String),

    /// Database open/upgrade error
    #[error("IndexedDB open error: {0}")]
    Open(String),

    /// Transaction error or abort
    #[error("IndexedDB transaction error: {0}")]
    Transaction(String),

    /// Request error from IDB operation
    #[error("IndexedDB request error: {0}")]
    Request(String),

    /// Value could not be converted to or from a JS value
    #[error("value conversion error: {0}")]
    Serialization(#[from] serde_wasm_bindgen::Error),

    /// Stored record does not have the `{key, value}` shape
    #[error("malformed record: {0}")]
    Record(String),
}

impl From<wasm_bindgen::JsValue> for IndexedDbError {
    fn from(val: wasm_bindgen::JsValue) -> Self {
        IndexedDbError::Request(js_error_message(&val))
    }
}

/// Best-effort readable message for a thrown JS value.
pub(crate) fn js_error_message(val: &wasm_bindgen::JsValue) -> String {
    if let Some(s) = val.as_string() {
        return s;
    }
    js_sys::JSON::stringify(val)
        .map(String::from)
        .unwrap_or_else(|_| format!("{:?}", val))
}

/// Convert IndexedDbError to StoreError for the AsyncStore contract
impl From<IndexedDbError> for StoreError {
    fn from(err: IndexedDbError) -> Self {
        match err {
            IndexedDbError::NotAvailable(msg) => StoreError::NotAvailable(msg),
            IndexedDbError::Open(msg) => StoreError::Open(msg),
            IndexedDbError::Transaction(msg) => StoreError::Transaction(msg),
            IndexedDbError::Request(msg) => StoreError::Request(msg),
            IndexedDbError::Serialization(e) => StoreError::Serialization(e.to_string()),
            IndexedDbError::Record(msg) => StoreError::Serialization(msg),
        }
    }
}
