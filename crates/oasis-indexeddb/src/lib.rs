//! IndexedDB adapter for the Oasis `AsyncStore` contract (browser WASM)
//!
//! Maps the small CRUD-plus-prefix-scan interface of `oasis-core` onto
//! IndexedDB transactions against a single object store.
//!
//! # Schema
//!
//! One object store (name from [`StoreConfig`]) holds records `{key, value}`
//! with `key` as keyPath. The store is created by the engine's upgrade hook on
//! first open. Prefix scans are closed key ranges `[prefix, prefix + "~"]`.
//!
//! # Example
//!
//! ```rust,ignore
//! use oasis_core::AsyncStore;
//! use oasis_indexeddb::IndexedDbAsyncStore;
//!
//! let store = IndexedDbAsyncStore::with_names("app", "settings", 1)?;
//! store.init(2).await?;
//!
//! store.set("theme", Some("dark")).await?;
//! let theme: Option<String> = store.get("theme").await?;
//! assert_eq!(theme.as_deref(), Some("dark"));
//! ```

pub mod config;
pub mod error;
pub mod idb;
pub mod store;

pub use config::StoreConfig;
pub use error::{IndexedDbError, Result};
pub use store::IndexedDbAsyncStore;
