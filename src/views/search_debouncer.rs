use std::cell::RefCell;

use gloo_timers::callback::Timeout;

use crate::config::CONFIG;

/// Runs only the last of a burst of calls, once input has been quiet for the
/// configured delay. Dropping the debouncer cancels the pending call.
pub struct SearchDebouncer {
    delay_ms: u32,
    pending: RefCell<Option<Timeout>>,
}

impl SearchDebouncer {
    pub fn new() -> Self {
        Self::with_delay(CONFIG.search_debounce_ms)
    }

    pub fn with_delay(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            pending: RefCell::new(None),
        }
    }

    pub fn schedule<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        // replacing the Timeout drops, and so cancels, the previous one
        *self.pending.borrow_mut() = Some(Timeout::new(self.delay_ms, callback));
    }

    pub fn cancel(&self) {
        if let Some(timeout) = self.pending.borrow_mut().take() {
            timeout.cancel();
        }
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
