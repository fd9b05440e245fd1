//! Oasis Core
//!
//! Defines the `AsyncStore` contract: a small async key-value interface with
//! point reads, batched reads, upserts, prefix scans and a schema version stamp.
//! Everything here is platform independent and builds for WASM; concrete
//! persistent backends live in their own crates (`oasis-indexeddb`).
//!
//! # Example
//!
//! ```rust
//! use oasis_core::{AsyncStore, MemoryAsyncStore};
//!
//! # futures::executor::block_on(async {
//! let store = MemoryAsyncStore::new();
//! store.init(1).await.unwrap();
//!
//! store.set("user/alice", Some(42)).await.unwrap();
//! store.set("user/bob", Some(7)).await.unwrap();
//!
//! let users = store.list::<u32>(Some("user/")).await.unwrap();
//! assert_eq!(users.len(), 2);
//!
//! // Writing `None` deletes
//! store.set::<u32>("user/bob", None).await.unwrap();
//! assert_eq!(store.get::<u32>("user/bob").await.unwrap(), None);
//! # });
//! ```

pub mod entry;
pub mod error;
pub mod join;
pub mod keys;
pub mod logging;
pub mod memory;
pub mod traits;

pub use entry::Entry;
pub use error::{StoreError, StoreResult};
pub use join::{IndexedJoin, JoinWait};
pub use keys::{prefix_bounds, validate_key, MAX_KEY_CHAR, VERSION_KEY};
pub use memory::MemoryAsyncStore;
pub use traits::AsyncStore;
