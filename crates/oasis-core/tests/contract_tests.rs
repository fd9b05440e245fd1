//! AsyncStore contract tests against MemoryAsyncStore

use std::collections::HashMap;

use oasis_core::{logging, AsyncStore, Entry, MemoryAsyncStore, StoreError, VERSION_KEY};
use pretty_assertions::assert_eq;

fn new_store() -> MemoryAsyncStore {
    logging::init_with_filter("debug");
    MemoryAsyncStore::new()
}

fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn test_get_missing_key() {
    let store = new_store();
    assert_eq!(store.get::<String>("nope").await.unwrap(), None);
}

#[tokio::test]
async fn test_set_get_roundtrip() {
    let store = new_store();
    store.set("greeting", Some("hello")).await.unwrap();
    store.set("count", Some(3u32)).await.unwrap();

    assert_eq!(
        store.get::<String>("greeting").await.unwrap(),
        Some("hello".to_string())
    );
    assert_eq!(store.get::<u32>("count").await.unwrap(), Some(3));
}

#[tokio::test]
async fn test_set_overwrites() {
    let store = new_store();
    store.set("k", Some(1)).await.unwrap();
    store.set("k", Some(2)).await.unwrap();
    assert_eq!(store.get::<i32>("k").await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_set_none_deletes() {
    let store = new_store();
    store.set("k", Some("v")).await.unwrap();
    store.set::<String>("k", None).await.unwrap();

    assert_eq!(store.get::<String>("k").await.unwrap(), None);
    assert!(store.list::<String>(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_rejects_sentinel_keys() {
    let store = new_store();
    let result = store.set("a~", Some(1)).await;
    assert_eq!(result, Err(StoreError::InvalidKey("a~".to_string())));
}

#[tokio::test]
async fn test_get_all_aligned_with_keys() {
    let store = new_store();
    store.set("a", Some(1)).await.unwrap();
    store.set("c", Some(3)).await.unwrap();

    let values = store
        .get_all::<i32>(&keys(&["c", "b", "a", "c"]))
        .await
        .unwrap();
    assert_eq!(values, vec![Some(3), None, Some(1), Some(3)]);
}

#[tokio::test]
async fn test_get_all_empty() {
    let store = new_store();
    assert!(store.get_all::<i32>(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_all_and_list() {
    let store = new_store();
    let mut batch = HashMap::new();
    batch.insert("a".to_string(), Some(1));
    batch.insert("b".to_string(), Some(2));
    store.set_all(batch).await.unwrap();

    let entries = store.list::<i32>(Some("")).await.unwrap();
    assert_eq!(entries, vec![Entry::new("a", 1), Entry::new("b", 2)]);
}

#[tokio::test]
async fn test_set_all_none_deletes() {
    let store = new_store();
    store.set("a", Some(1)).await.unwrap();
    store.set("b", Some(2)).await.unwrap();

    let mut batch = HashMap::new();
    batch.insert("a".to_string(), None);
    batch.insert("c".to_string(), Some(3));
    store.set_all(batch).await.unwrap();

    let entries = store.list::<i32>(None).await.unwrap();
    assert_eq!(entries, vec![Entry::new("b", 2), Entry::new("c", 3)]);
}

#[tokio::test]
async fn test_list_prefix() {
    let store = new_store();
    for key in ["a", "ab", "abc", "b", "ba"] {
        store.set(key, Some(key)).await.unwrap();
    }

    let listed: Vec<String> = store
        .list::<String>(Some("a"))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(listed, keys(&["a", "ab", "abc"]));

    let listed = store.list::<String>(Some("ab")).await.unwrap();
    assert_eq!(
        listed,
        vec![
            Entry::new("ab", "ab".to_string()),
            Entry::new("abc", "abc".to_string())
        ]
    );

    assert_eq!(store.list::<String>(None).await.unwrap().len(), 5);
    assert_eq!(store.list::<String>(Some("")).await.unwrap().len(), 5);
    assert!(store.list::<String>(Some("z")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_removes_version() {
    let store = new_store();
    store.init(1).await.unwrap();
    store.set("a", Some(1)).await.unwrap();

    store.clear().await.unwrap();

    assert!(store.list::<serde_json::Value>(None).await.unwrap().is_empty());
    assert_eq!(store.get::<u32>(VERSION_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_init_same_version_is_idempotent() {
    let store = new_store();
    store.init(1).await.unwrap();
    store.set("a", Some(1)).await.unwrap();

    store.init(1).await.unwrap();

    assert_eq!(store.get::<i32>("a").await.unwrap(), Some(1));
    assert_eq!(store.get::<u32>(VERSION_KEY).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_init_new_version_clears() {
    let store = new_store();
    store.init(1).await.unwrap();
    store.set("a", Some(1)).await.unwrap();

    store.init(2).await.unwrap();

    assert_eq!(store.get::<i32>("a").await.unwrap(), None);
    assert_eq!(store.get::<u32>(VERSION_KEY).await.unwrap(), Some(2));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_init_replaces_foreign_version_value() {
    let store = new_store();
    store.set(VERSION_KEY, Some("one")).await.unwrap();
    store.set("a", Some(1)).await.unwrap();

    store.init(1).await.unwrap();

    assert_eq!(store.get::<i32>("a").await.unwrap(), None);
    assert_eq!(store.get::<u32>(VERSION_KEY).await.unwrap(), Some(1));
}
