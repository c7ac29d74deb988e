// ============================================================================
// LISTING STATE - collection owned by one mounted view
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::models::Listing;
use crate::state::{Broadcast, Subscription};

#[derive(Clone)]
pub struct ListingState {
    pub listings: Rc<RefCell<Vec<Listing>>>,
    pub loading: Rc<Cell<bool>>,
    pub error: Rc<RefCell<Option<String>>>,
    pub reauth_required: Rc<Cell<bool>>,
    mounted: Rc<Cell<bool>>,
    load_generation: Rc<Cell<u64>>,
    pending_mutations: Rc<Cell<usize>>,
    changed: Broadcast<()>,
}

impl ListingState {
    pub fn new() -> Self {
        Self {
            listings: Rc::new(RefCell::new(Vec::new())),
            loading: Rc::new(Cell::new(false)),
            error: Rc::new(RefCell::new(None)),
            reauth_required: Rc::new(Cell::new(false)),
            mounted: Rc::new(Cell::new(true)),
            load_generation: Rc::new(Cell::new(0)),
            pending_mutations: Rc::new(Cell::new(0)),
            changed: Broadcast::new(),
        }
    }

    pub fn get_listings(&self) -> Vec<Listing> {
        self.listings.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.listings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.borrow().is_empty()
    }

    pub fn find(&self, id: &str) -> Option<Listing> {
        self.listings.borrow().iter().find(|l| l.id == id).cloned()
    }

    /// Replaces the whole collection
    pub fn replace(&self, listings: Vec<Listing>) {
        *self.listings.borrow_mut() = listings;
        self.notify();
    }

    pub fn prepend(&self, listing: Listing) {
        self.listings.borrow_mut().insert(0, listing);
        self.notify();
    }

    /// Runs `apply` on the record with `id` and returns the updated copy
    pub fn modify<F>(&self, id: &str, apply: F) -> Option<Listing>
    where
        F: FnOnce(&mut Listing),
    {
        let updated = {
            let mut listings = self.listings.borrow_mut();
            let listing = listings.iter_mut().find(|l| l.id == id)?;
            apply(listing);
            listing.clone()
        };
        self.notify();
        Some(updated)
    }

    /// Removes the record with `id`; `false` if it was not there
    pub fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut listings = self.listings.borrow_mut();
            let before = listings.len();
            listings.retain(|l| l.id != id);
            listings.len() != before
        };
        if removed {
            self.notify();
        }
        removed
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
        self.notify();
    }

    pub fn get_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn set_error(&self, error: Option<String>) {
        *self.error.borrow_mut() = error;
        self.notify();
    }

    pub fn get_error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn set_reauth_required(&self, required: bool) {
        self.reauth_required.set(required);
        self.notify();
    }

    pub fn get_reauth_required(&self) -> bool {
        self.reauth_required.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Marks the owning view as gone; late results are dropped from now on
    pub fn detach(&self) {
        self.mounted.set(false);
    }

    /// Starts a new load and returns its generation
    pub fn begin_load(&self) -> u64 {
        let generation = self.load_generation.get() + 1;
        self.load_generation.set(generation);
        generation
    }

    /// Whether a load started as `generation` may still apply its result
    pub fn is_current_load(&self, generation: u64) -> bool {
        self.is_mounted() && self.load_generation.get() == generation
    }

    pub fn begin_mutation(&self) {
        self.pending_mutations.set(self.pending_mutations.get() + 1);
    }

    pub fn end_mutation(&self) {
        self.pending_mutations
            .set(self.pending_mutations.get().saturating_sub(1));
    }

    pub fn pending_mutations(&self) -> usize {
        self.pending_mutations.get()
    }

    /// Subscribes a re-render callback
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.changed.subscribe(move |_| callback())
    }

    fn notify(&self) {
        if self.is_mounted() {
            self.changed.emit(());
        }
    }
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new()
    }
}
