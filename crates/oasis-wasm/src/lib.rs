//! Oasis WASM bridge
//!
//! Browser bindings (wasm-bindgen) for the IndexedDB-backed `AsyncStore`.
//! Every async method returns a Promise that rejects with an `Error` carrying
//! the store error message.
//!
//! ```js
//! import init, { OasisStore, initLogging } from "oasis_wasm";
//!
//! await init();
//! initLogging("debug");
//! const store = new OasisStore("app", "settings");
//! await store.init(2);
//! await store.set("theme", { dark: true });
//! const entries = await store.list("th");
//! ```

pub mod browser;
pub mod console;

use wasm_bindgen::prelude::*;

pub use browser::WasmAsyncStore;

/// Route tracing output and Rust panics to the browser console.
///
/// `filter` uses tracing `EnvFilter` syntax (`"info"`, `"oasis_indexeddb=debug"`)
/// and defaults to `"info"`. Returns `false` when logging was already set up.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) -> bool {
    console_error_panic_hook::set_once();
    console::init(filter.as_deref().unwrap_or("info"))
}
