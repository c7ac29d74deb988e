// ============================================================================
// AUTH EVENTS - cross-tab `storage` events and the in-app `authChanged` signal
// ============================================================================
// Both trigger role re-resolution in this tab. Listeners are removed on drop.
// ============================================================================

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, StorageEvent, Window};

use crate::utils::{AUTH_CHANGED_EVENT, SESSION_KEYS};
use crate::viewmodels::SessionResolver;

pub struct AuthEventListener {
    window: Window,
    on_storage: Closure<dyn FnMut(StorageEvent)>,
    on_auth_changed: Closure<dyn FnMut(Event)>,
}

impl AuthEventListener {
    pub fn start(resolver: SessionResolver) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;

        let on_storage = Closure::<dyn FnMut(StorageEvent)>::new({
            let resolver = resolver.clone();
            move |event: StorageEvent| {
                // `key` is None when another tab called localStorage.clear()
                let relevant = match event.key() {
                    Some(key) => SESSION_KEYS.contains(&key.as_str()),
                    None => true,
                };
                if relevant {
                    log::info!("🔄 Session changed in another tab");
                    resolver.notify_changed();
                }
            }
        });

        let on_auth_changed = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            log::info!("🔄 {} received", AUTH_CHANGED_EVENT);
            resolver.notify_changed();
            resolver.spawn_refresh();
        });

        window.add_event_listener_with_callback("storage", on_storage.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback(
            AUTH_CHANGED_EVENT,
            on_auth_changed.as_ref().unchecked_ref(),
        )?;
        log::info!("✅ Auth listeners registered");

        Ok(Self {
            window,
            on_storage,
            on_auth_changed,
        })
    }
}

impl Drop for AuthEventListener {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "storage",
            self.on_storage.as_ref().unchecked_ref(),
        );
        let _ = self.window.remove_event_listener_with_callback(
            AUTH_CHANGED_EVENT,
            self.on_auth_changed.as_ref().unchecked_ref(),
        );
        log::info!("🔌 Auth listeners removed");
    }
}
