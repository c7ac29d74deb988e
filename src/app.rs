// ============================================================================
// APP - shared services for every view on the page
// ============================================================================
// One storage handle, one API client, one session resolver. Views borrow
// clones of them through `with_app`.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::services::{ApiClient, AuthEventListener, MarketApi};
use crate::utils::{BrowserStore, KeyValueStore, MemoryStore};
use crate::viewmodels::SessionResolver;

pub struct App {
    resolver: SessionResolver,
    api: Rc<dyn MarketApi>,
    _auth_events: Option<AuthEventListener>,
}

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

impl App {
    pub fn new() -> Self {
        let store: Rc<dyn KeyValueStore> = match BrowserStore::open() {
            Some(store) => Rc::new(store),
            None => {
                log::warn!("⚠️ localStorage unavailable, session will not survive a reload");
                Rc::new(MemoryStore::new())
            }
        };
        let api: Rc<dyn MarketApi> = Rc::new(ApiClient::new());
        let resolver = SessionResolver::new(store, api.clone());

        let auth_events = match AuthEventListener::start(resolver.clone()) {
            Ok(listener) => Some(listener),
            Err(e) => {
                log::error!("❌ Could not register auth listeners: {:?}", e);
                None
            }
        };

        Self {
            resolver,
            api,
            _auth_events: auth_events,
        }
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    pub fn api(&self) -> Rc<dyn MarketApi> {
        self.api.clone()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs `app` as the page-wide instance
pub fn install(app: App) {
    APP.with(|cell| *cell.borrow_mut() = Some(app));
}

/// Runs `f` against the page-wide instance
pub fn with_app<R>(f: impl FnOnce(&App) -> R) -> Result<R, JsValue> {
    APP.with(|cell| match cell.borrow().as_ref() {
        Some(app) => Ok(f(app)),
        None => Err(JsValue::from_str("App is not initialised")),
    })
}
