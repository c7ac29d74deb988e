// ============================================================================
// MARKETPLACE VIEW - JS handle over one ListingViewModel
// ============================================================================
// Results cross the boundary as JSON strings; errors as their user message.
// Call `teardown()` when the page section unmounts.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::app::with_app;
use crate::models::{ListingDraft, ListingPatch, ListingScope, MarketError};
use crate::state::Subscription;
use crate::viewmodels::ListingViewModel;
use crate::views::SearchDebouncer;

fn to_js(error: MarketError) -> JsValue {
    JsValue::from_str(&error.user_message())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct MarketplaceView {
    view_model: Rc<ListingViewModel>,
    debouncer: SearchDebouncer,
    subscriptions: RefCell<Vec<Subscription>>,
}

#[wasm_bindgen]
impl MarketplaceView {
    /// `mine = true` shows only the caller's own listings
    #[wasm_bindgen(constructor)]
    pub fn new(mine: bool) -> Result<MarketplaceView, JsValue> {
        let scope = if mine {
            ListingScope::Mine
        } else {
            ListingScope::Public
        };
        let view_model =
            with_app(|app| ListingViewModel::new(app.api(), app.resolver().clone(), scope))?;
        Ok(Self {
            view_model: Rc::new(view_model),
            debouncer: SearchDebouncer::new(),
            subscriptions: RefCell::new(Vec::new()),
        })
    }

    /// Resolves with the number of listings loaded, or `undefined` when a newer
    /// load replaced this one
    pub fn load(&self) -> Promise {
        let view_model = self.view_model.clone();
        future_to_promise(async move {
            match view_model.load().await {
                Ok(count) => Ok(JsValue::from(count as u32)),
                Err(MarketError::Superseded) => Ok(JsValue::UNDEFINED),
                Err(e) => Err(to_js(e)),
            }
        })
    }

    pub fn listings(&self) -> Result<String, JsValue> {
        to_json(&self.view_model.listings())
    }

    /// Debounced search; `callback` receives the matching listings as JSON
    pub fn search_input(&self, query: String, callback: Function) {
        let view_model = Rc::downgrade(&self.view_model);
        self.debouncer.schedule(move || {
            let Some(view_model) = view_model.upgrade() else {
                return;
            };
            if !view_model.state().is_mounted() {
                return;
            }
            let result = to_json(&view_model.search(&query))
                .and_then(|json| callback.call1(&JsValue::NULL, &JsValue::from_str(&json)));
            if let Err(e) = result {
                log::error!("❌ Search callback failed: {:?}", e);
            }
        });
    }

    pub fn filter(&self, tag: &str) -> Result<String, JsValue> {
        to_json(&self.view_model.filter_by_category(tag))
    }

    /// `draft_json` is a serialized `ListingDraft`; resolves with the created listing as JSON
    pub fn create_listing(&self, draft_json: String) -> Promise {
        let view_model = self.view_model.clone();
        future_to_promise(async move {
            let mut draft: ListingDraft = serde_json::from_str(&draft_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid listing form: {}", e)))?;
            let listing = view_model.create(&mut draft).await.map_err(to_js)?;
            Ok(JsValue::from_str(&to_json(&listing)?))
        })
    }

    /// `patch_json` holds only the edited fields; resolves with the merged listing
    /// as JSON (`null` when this view does not hold it)
    pub fn update_listing(&self, id: String, patch_json: String) -> Promise {
        let view_model = self.view_model.clone();
        future_to_promise(async move {
            let patch: ListingPatch = serde_json::from_str(&patch_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid listing edit: {}", e)))?;
            let updated = view_model.update(&id, &patch).await.map_err(to_js)?;
            Ok(JsValue::from_str(&to_json(&updated)?))
        })
    }

    pub fn delete_listing(&self, id: String) -> Promise {
        let view_model = self.view_model.clone();
        future_to_promise(async move {
            view_model.delete(&id).await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn set_verified(&self, id: String, verified: bool) -> Promise {
        let view_model = self.view_model.clone();
        future_to_promise(async move {
            let updated = view_model
                .set_verified(&id, verified)
                .await
                .map_err(to_js)?;
            Ok(JsValue::from_str(&to_json(&updated)?))
        })
    }

    pub fn error(&self) -> Option<String> {
        self.view_model.state().get_error()
    }

    pub fn is_loading(&self) -> bool {
        self.view_model.state().get_loading()
    }

    pub fn reauth_required(&self) -> bool {
        self.view_model.state().get_reauth_required()
    }

    /// `callback` runs after every change to the collection or its flags
    pub fn on_change(&self, callback: Function) {
        let subscription = self.view_model.state().on_change(move || {
            if let Err(e) = callback.call0(&JsValue::NULL) {
                log::error!("❌ Change callback failed: {:?}", e);
            }
        });
        self.subscriptions.borrow_mut().push(subscription);
    }

    pub fn teardown(&self) {
        self.debouncer.cancel();
        self.view_model.teardown();
        self.subscriptions.borrow_mut().clear();
        log::info!("🧹 Marketplace view torn down");
    }
}
