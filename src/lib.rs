// ============================================================================
// BARTER MARKET - browser core of the advertiser / media-owner marketplace
// ============================================================================
// Layers:
// - Models: wire records and validated domain types
// - Services: HTTP only (MarketApi) and browser auth events
// - State: Rc<RefCell> state + change notifications
// - ViewModels: session resolution, listing sync, search/filter
// - Views: JS-facing handles (wasm32 only)
// ============================================================================

pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
pub mod views;

#[cfg(test)]
mod test_utils;

#[cfg(target_arch = "wasm32")]
pub use entry::*;

#[cfg(target_arch = "wasm32")]
mod entry {
    use js_sys::Promise;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::future_to_promise;

    use crate::app::{install, with_app, App};
    use crate::config::CONFIG;
    use crate::models::{Credentials, Role};

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        if CONFIG.is_logging_enabled() {
            wasm_logger::init(wasm_logger::Config::default());
        }
        log::info!("🚀 Barter Market core starting ({})", CONFIG.environment);

        let app = App::new();
        app.resolver().spawn_refresh();
        install(app);
        Ok(())
    }

    /// Current role as `advertiser`, `media_owner` or `admin`
    #[wasm_bindgen]
    pub fn current_role() -> Option<String> {
        with_app(|app| app.resolver().current_role())
            .ok()
            .flatten()
            .map(|role| role.as_str().to_string())
    }

    #[wasm_bindgen]
    pub fn logout() -> Result<(), JsValue> {
        with_app(|app| app.resolver().logout())
    }

    /// Resolves with the role of the new session
    #[wasm_bindgen]
    pub fn login(email: String, password: String) -> Result<Promise, JsValue> {
        let resolver = with_app(|app| app.resolver().clone())?;
        Ok(future_to_promise(async move {
            let session = resolver
                .sign_in(&Credentials { email, password })
                .await
                .map_err(|e| JsValue::from_str(&e.user_message()))?;
            Ok(session
                .role
                .map(|role: Role| JsValue::from_str(role.as_str()))
                .unwrap_or(JsValue::NULL))
        }))
    }
}
