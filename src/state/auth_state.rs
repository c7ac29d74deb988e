// ============================================================================
// AUTH STATE - in-memory side of the session (persisted side lives in storage)
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::Role;
use crate::state::Broadcast;

/// Resolved role plus the change broadcast views subscribe to
#[derive(Clone)]
pub struct AuthState {
    pub role: Rc<RefCell<Option<Role>>>,
    pub role_changed: Broadcast<Option<Role>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self {
            role: Rc::new(RefCell::new(None)),
            role_changed: Broadcast::new(),
        }
    }

    pub fn set_role(&self, role: Option<Role>) {
        *self.role.borrow_mut() = role;
    }

    pub fn get_role(&self) -> Option<Role> {
        *self.role.borrow()
    }

    /// Stores `role` and tells every subscriber
    pub fn publish(&self, role: Option<Role>) {
        self.set_role(role);
        self.role_changed.emit(role);
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}
