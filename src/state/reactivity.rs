// ============================================================================
// REACTIVITY - publish/subscribe used to keep independent views in agreement
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(T)>;
type Listeners<T> = RefCell<Vec<(u64, Listener<T>)>>;

/// Fan-out of one event type to every current subscriber.
/// Clones share the same subscriber list.
pub struct Broadcast<T> {
    next_id: Rc<Cell<u64>>,
    listeners: Rc<Listeners<T>>,
}

impl<T: Clone + 'static> Broadcast<T> {
    pub fn new() -> Self {
        Self {
            next_id: Rc::new(Cell::new(0)),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Registers `callback` until the returned [`Subscription`] is dropped
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(T) + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let listener: Listener<T> = Rc::new(callback);
        self.listeners.borrow_mut().push((id, listener));

        let listeners: Weak<Listeners<T>> = Rc::downgrade(&self.listeners);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(listeners) = listeners.upgrade() {
                    listeners.borrow_mut().retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    /// Calls every subscriber once with `value`. Callbacks may subscribe or
    /// unsubscribe while being notified.
    pub fn emit(&self, value: T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(value.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<T: Clone + 'static> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            next_id: self.next_id.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

/// Unsubscribes on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}
