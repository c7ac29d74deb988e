use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{de::DeserializeOwned, Serialize};

use crate::models::MarketError;

/// Per-origin persistent key-value store holding the session keys
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), MarketError>;
    fn remove(&self, key: &str);
}

/// In-memory store, used when `localStorage` is unavailable and in tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MarketError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// `window.localStorage`
#[cfg(target_arch = "wasm32")]
pub struct BrowserStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl BrowserStore {
    /// `None` when the page has no window or storage is blocked (private mode)
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MarketError> {
        self.storage
            .set_item(key, value)
            .map_err(|_| MarketError::Storage(format!("could not write '{}' to localStorage", key)))
    }

    fn remove(&self, key: &str) {
        if self.storage.remove_item(key).is_err() {
            log::warn!("⚠️ Could not remove '{}' from localStorage", key);
        }
    }
}

pub fn store_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), MarketError> {
    let json = serde_json::to_string(value)
        .map_err(|e| MarketError::Storage(format!("serializing '{}': {}", key, e)))?;
    store.set(key, &json)
}

/// Corrupt or missing JSON reads as `None`
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let json = store.get(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("⚠️ Ignoring corrupt '{}' in storage: {}", key, e);
            None
        }
    }
}
