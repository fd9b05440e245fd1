//! Browser tests for the OasisStore JS bindings

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Object, Reflect};
use oasis_wasm::{init_logging, WasmAsyncStore};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn object(pairs: &[(&str, JsValue)]) -> Object {
    let obj = Object::new();
    for (key, value) in pairs {
        Reflect::set(&obj, &JsValue::from_str(key), value).unwrap();
    }
    obj
}

async fn fresh_store(db_name: &str) -> WasmAsyncStore {
    init_logging(Some("debug".to_string()));
    WasmAsyncStore::delete_database(db_name.to_string())
        .await
        .unwrap();
    WasmAsyncStore::new(db_name, "kv", None).unwrap()
}

#[wasm_bindgen_test]
async fn test_set_object_and_read_back() {
    let store = fresh_store("oasis-wasm-test-roundtrip").await;
    let value = object(&[("dark", JsValue::TRUE), ("size", JsValue::from_f64(14.0))]);

    store
        .set("theme".to_string(), value.into())
        .await
        .unwrap();

    let back = store.get("theme".to_string()).await.unwrap();
    assert_eq!(Reflect::get(&back, &"dark".into()).unwrap(), JsValue::TRUE);
    assert_eq!(
        Reflect::get(&back, &"size".into()).unwrap().as_f64(),
        Some(14.0)
    );

    assert!(store.get("missing".to_string()).await.unwrap().is_undefined());
}

#[wasm_bindgen_test]
async fn test_set_undefined_deletes() {
    let store = fresh_store("oasis-wasm-test-delete").await;
    store
        .set("k".to_string(), JsValue::from_str("v"))
        .await
        .unwrap();
    store
        .set("k".to_string(), JsValue::UNDEFINED)
        .await
        .unwrap();

    assert!(store.get("k".to_string()).await.unwrap().is_undefined());
}

#[wasm_bindgen_test]
async fn test_set_all_get_all_and_list() {
    let store = fresh_store("oasis-wasm-test-batch").await;
    let batch = object(&[
        ("a", JsValue::from_f64(1.0)),
        ("b", JsValue::from_f64(2.0)),
    ]);
    store.set_all(batch).await.unwrap();

    let values = store
        .get_all(vec!["b".to_string(), "x".to_string(), "a".to_string()])
        .await
        .unwrap();
    assert_eq!(values.length(), 3);
    assert_eq!(values.get(0).as_f64(), Some(2.0));
    assert!(values.get(1).is_undefined());
    assert_eq!(values.get(2).as_f64(), Some(1.0));

    let listed = Array::from(&store.list(Some(String::new())).await.unwrap());
    assert_eq!(listed.length(), 2);
    let first = listed.get(0);
    assert_eq!(
        Reflect::get(&first, &"key".into()).unwrap().as_string(),
        Some("a".to_string())
    );
}

#[wasm_bindgen_test]
async fn test_init_stamps_version() {
    let store = fresh_store("oasis-wasm-test-init").await;
    store
        .set("a".to_string(), JsValue::from_f64(1.0))
        .await
        .unwrap();

    store.init(4).await.unwrap();

    assert!(store.get("a".to_string()).await.unwrap().is_undefined());
    assert_eq!(
        store.get("version".to_string()).await.unwrap().as_f64(),
        Some(4.0)
    );
}

#[wasm_bindgen_test]
fn test_snapshot_throws() {
    let store = WasmAsyncStore::new("oasis-wasm-test-snapshot", "kv", None).unwrap();
    assert!(store.snapshot().is_err());
}

#[wasm_bindgen_test]
fn test_from_config_validates() {
    let config = object(&[("databaseName", JsValue::from_str(""))]);
    assert!(WasmAsyncStore::from_config(config.into()).is_err());
    assert!(WasmAsyncStore::from_config(JsValue::UNDEFINED).is_ok());
}
