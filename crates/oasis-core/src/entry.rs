//! Persisted record shape

use serde::{Deserialize, Serialize};

/// Key & value pair.
///
/// This is the only record shape a store persists. Backends that keep native
/// records (IndexedDB) use `key` as the primary key path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub key: String,
    pub value: T,
}

impl<T> Entry<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
