//! Low-level IndexedDB helpers using web-sys
//!
//! Wraps the callback-based IndexedDB API into Rust futures using
//! `wasm_bindgen_futures::JsFuture` and `js_sys::Promise`, and scopes each
//! opened database in a [`Connection`] that closes it on drop.

use js_sys::Promise;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    IdbDatabase, IdbFactory, IdbObjectStore, IdbObjectStoreParameters, IdbOpenDbRequest,
    IdbRequest, IdbTransaction, IdbTransactionMode,
};

use crate::config::StoreConfig;
use crate::error::{js_error_message, IndexedDbError, Result};

/// Key path of the `{key, value}` records.
pub const KEY_PATH: &str = "key";

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// Get the global IndexedDB factory.
pub fn idb_factory() -> Result<IdbFactory> {
    let global = js_sys::global();

    let idb: JsValue = js_sys::Reflect::get(&global, &"indexedDB".into())
        .map_err(|_| IndexedDbError::NotAvailable("no indexedDB on global".into()))?;

    if idb.is_undefined() || idb.is_null() {
        return Err(IndexedDbError::NotAvailable(
            "indexedDB is null/undefined".into(),
        ));
    }

    idb.dyn_into::<IdbFactory>()
        .map_err(|_| IndexedDbError::NotAvailable("indexedDB is not IdbFactory".into()))
}

/// Message carried by a failed request.
fn request_error_message(req: &IdbRequest) -> String {
    match req.error() {
        Ok(Some(e)) => e.message(),
        _ => "unknown IDB error".to_string(),
    }
}

/// Convert an IdbRequest into a JS Promise that resolves with the request's result.
fn request_to_promise(req: &IdbRequest) -> Promise {
    let req = req.clone();

    Promise::new(&mut move |resolve, reject| {
        // Both closures live here until one of them fires
        let closures: Rc<RefCell<Option<(EventClosure, EventClosure)>>> =
            Rc::new(RefCell::new(None));

        let req_s = req.clone();
        let closures_for_success = closures.clone();
        let on_success = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let result = req_s.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::UNDEFINED, &result);
            *closures_for_success.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        let req_e = req.clone();
        let closures_for_error = closures.clone();
        let on_error = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let msg = JsValue::from_str(&request_error_message(&req_e));
            let _ = reject.call1(&JsValue::UNDEFINED, &msg);
            *closures_for_error.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        req.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        req.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        *closures.borrow_mut() = Some((on_success, on_error));
    })
}

/// Convert an IdbTransaction's completion into a JS Promise.
///
/// `complete` resolves; `error` and `abort` reject.
fn transaction_to_promise(tx: &IdbTransaction) -> Promise {
    let tx = tx.clone();

    Promise::new(&mut move |resolve, reject| {
        let closures: Rc<RefCell<Option<[EventClosure; 3]>>> = Rc::new(RefCell::new(None));

        let closures_for_complete = closures.clone();
        let on_complete = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = resolve.call0(&JsValue::UNDEFINED);
            *closures_for_complete.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        let reject_with = |what: &'static str| {
            let tx_e = tx.clone();
            let reject = reject.clone();
            let closures = closures.clone();
            Closure::wrap(Box::new(move |_event: web_sys::Event| {
                let msg = tx_e
                    .error()
                    .map(|e| format!("{}: {}", what, e.message()))
                    .unwrap_or_else(|| what.to_string());
                let _ = reject.call1(&JsValue::UNDEFINED, &JsValue::from_str(&msg));
                *closures.borrow_mut() = None;
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        let on_error = reject_with("transaction error");
        let on_abort = reject_with("transaction aborted");

        tx.set_oncomplete(Some(on_complete.as_ref().unchecked_ref()));
        tx.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        tx.set_onabort(Some(on_abort.as_ref().unchecked_ref()));

        *closures.borrow_mut() = Some([on_complete, on_error, on_abort]);
    })
}

/// Create the records object store during `upgradeneeded` if it is missing.
///
/// An existing store under the same name must use the `key` keyPath, or the
/// `{key, value}` records could never be written to it.
fn create_store_if_missing(open_req: &IdbOpenDbRequest, store_name: &str) -> Result<bool> {
    let db: IdbDatabase = open_req.result()?.unchecked_into();

    if db.object_store_names().contains(store_name) {
        let upgrade = open_req
            .transaction()
            .ok_or_else(|| IndexedDbError::Open("no versionchange transaction".into()))?;
        let key_path = upgrade.object_store(store_name)?.key_path()?;
        if key_path.as_string().as_deref() != Some(KEY_PATH) {
            return Err(IndexedDbError::Open(format!(
                "object store {} has keyPath {}, expected {}",
                store_name,
                js_error_message(&key_path),
                KEY_PATH
            )));
        }
        return Ok(false);
    }

    let params = IdbObjectStoreParameters::new();
    js_sys::Reflect::set(&params, &"keyPath".into(), &KEY_PATH.into())?;
    db.create_object_store_with_optional_parameters(store_name, &params)
        .map_err(|e| IndexedDbError::Open(js_error_message(&e)))?;
    Ok(true)
}

/// An open database handle, closed when dropped.
///
/// Opened per logical operation; nothing is cached between calls.
pub struct Connection {
    db: IdbDatabase,
    store_name: String,
}

impl Connection {
    /// Start a transaction on the configured object store.
    pub fn transaction(&self, mode: IdbTransactionMode) -> Result<(IdbTransaction, IdbObjectStore)> {
        let tx = self
            .db
            .transaction_with_str_and_mode(&self.store_name, mode)
            .map_err(|e| IndexedDbError::Transaction(js_error_message(&e)))?;
        let store = tx
            .object_store(&self.store_name)
            .map_err(|e| IndexedDbError::Request(js_error_message(&e)))?;
        Ok((tx, store))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Pending transactions still finish; the engine defers the close.
        self.db.close();
    }
}

/// Open (or create) the database and object store named by `config`.
pub async fn open_database(config: &StoreConfig) -> Result<Connection> {
    let factory = idb_factory()?;

    let open_req: IdbOpenDbRequest = factory
        .open_with_u32(&config.database_name, config.engine_version)
        .map_err(|e| IndexedDbError::Open(js_error_message(&e)))?;

    let upgrade_req = open_req.clone();
    let store_name = config.object_store_name.clone();
    let on_upgrade = Closure::wrap(Box::new(move |event: web_sys::IdbVersionChangeEvent| {
        match create_store_if_missing(&upgrade_req, &store_name) {
            Ok(true) => tracing::info!(
                store = %store_name,
                old_version = event.old_version(),
                "created IndexedDB object store"
            ),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(store = %store_name, error = %e, "IndexedDB upgrade failed");
                // Returning normally would commit the new engine version without the store
                if let Some(upgrade) = upgrade_req.transaction() {
                    abort_transaction(&upgrade, "upgrade");
                }
            }
        }
    }) as Box<dyn FnMut(web_sys::IdbVersionChangeEvent)>);

    open_req.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));

    let opened = JsFuture::from(request_to_promise(open_req.unchecked_ref())).await;

    // Keep the upgrade closure alive until the open request settles
    open_req.set_onupgradeneeded(None);
    drop(on_upgrade);

    let db = opened
        .map_err(|e| IndexedDbError::Open(js_error_message(&e)))?
        .dyn_into::<IdbDatabase>()
        .map_err(|_| IndexedDbError::Open("result is not IdbDatabase".into()))?;

    Ok(Connection {
        db,
        store_name: config.object_store_name.clone(),
    })
}

/// Await an IdbRequest, resolving to its result JsValue.
pub async fn await_request(req: &IdbRequest) -> Result<JsValue> {
    JsFuture::from(request_to_promise(req))
        .await
        .map_err(|e| IndexedDbError::Request(js_error_message(&e)))
}

/// Completion of a transaction, watched from the moment it was created.
pub struct TransactionDone(JsFuture);

impl TransactionDone {
    /// Wait for the `complete` event.
    pub async fn wait(self) -> Result<()> {
        self.0
            .await
            .map_err(|e| IndexedDbError::Transaction(js_error_message(&e)))?;
        Ok(())
    }
}

/// Start watching `tx` for completion.
///
/// Call this right after the transaction is created, before any request is
/// awaited, so the `complete` event cannot fire unobserved.
pub fn watch_transaction(tx: &IdbTransaction) -> TransactionDone {
    TransactionDone(JsFuture::from(transaction_to_promise(tx)))
}

/// Abort `tx` so none of its requests take effect.
///
/// Returns `false` (and logs) when the engine refuses, e.g. because the
/// transaction already finished.
pub fn abort_transaction(tx: &IdbTransaction, context: &str) -> bool {
    match tx.abort() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                context,
                error = %js_error_message(&e),
                "could not abort IndexedDB transaction"
            );
            false
        }
    }
}

/// Success and error callbacks attached to one request; detached on drop.
///
/// Used to fan a batch out into many requests whose callbacks settle a
/// shared join instead of one promise per request.
pub struct RequestHandlers {
    request: IdbRequest,
    _on_success: EventClosure,
    _on_error: EventClosure,
}

impl RequestHandlers {
    /// Route the request's outcome to `on_settle`.
    pub fn attach<F>(request: &IdbRequest, on_settle: F) -> Self
    where
        F: FnMut(Result<JsValue>) + 'static,
    {
        let on_settle = Rc::new(RefCell::new(on_settle));

        let req_s = request.clone();
        let settle_s = on_settle.clone();
        let on_success = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let outcome = req_s.result().map_err(IndexedDbError::from);
            (&mut *settle_s.borrow_mut())(outcome);
        }) as Box<dyn FnMut(web_sys::Event)>);

        let req_e = request.clone();
        let on_error = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let err = IndexedDbError::Request(request_error_message(&req_e));
            (&mut *on_settle.borrow_mut())(Err(err));
        }) as Box<dyn FnMut(web_sys::Event)>);

        request.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        request.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Self {
            request: request.clone(),
            _on_success: on_success,
            _on_error: on_error,
        }
    }
}

impl Drop for RequestHandlers {
    fn drop(&mut self) {
        self.request.set_onsuccess(None);
        self.request.set_onerror(None);
    }
}

/// Delete an IndexedDB database by name.
pub async fn delete_database(db_name: &str) -> Result<()> {
    let factory = idb_factory()?;
    let req = factory
        .delete_database(db_name)
        .map_err(|e| IndexedDbError::Open(format!("delete db: {}", js_error_message(&e))))?;
    JsFuture::from(request_to_promise(req.unchecked_ref()))
        .await
        .map_err(|e| IndexedDbError::Open(format!("delete db: {}", js_error_message(&e))))?;
    Ok(())
}
