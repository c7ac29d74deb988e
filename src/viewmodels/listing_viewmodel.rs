// ============================================================================
// LISTING VIEWMODEL - keeps one view's collection in step with the backend
// ============================================================================
// Nothing is applied before the server confirms it: a rejected call leaves the
// collection exactly as it was. A 401 clears the shared session.
// ============================================================================

use std::rc::Rc;

use crate::models::{
    ingest, Listing, ListingDraft, ListingOwner, ListingPatch, ListingScope, MarketError,
    NewListing,
};
use crate::services::MarketApi;
use crate::state::ListingState;
use crate::viewmodels::listing_filters;
use crate::viewmodels::SessionResolver;

pub struct ListingViewModel {
    api: Rc<dyn MarketApi>,
    session: SessionResolver,
    state: ListingState,
    scope: ListingScope,
}

impl ListingViewModel {
    pub fn new(api: Rc<dyn MarketApi>, session: SessionResolver, scope: ListingScope) -> Self {
        Self {
            api,
            session,
            state: ListingState::new(),
            scope,
        }
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.state.get_listings()
    }

    /// Replaces the collection with the server's valid records. Returns how many were kept.
    pub async fn load(&self) -> Result<usize, MarketError> {
        let token = self.session.token();
        if self.scope == ListingScope::Mine && token.is_none() {
            return Err(self.reject(MarketError::AuthRequired));
        }

        let generation = self.state.begin_load();
        self.state.set_loading(true);
        let result = self.api.list_listings(self.scope, token.as_deref()).await;

        if !self.state.is_current_load(generation) {
            let mounted = self.state.is_mounted();
            // the session is shared, so a 401 still clears it
            if matches!(result, Err(MarketError::SessionExpired)) {
                self.session.expire_session();
                if mounted {
                    self.state.set_reauth_required(true);
                }
            }
            if mounted {
                log::info!("⏭️ Discarding listing response, a newer load replaced it");
                return Err(MarketError::Superseded);
            }
            log::info!("⏭️ Discarding listing response for a detached view");
            return Err(MarketError::Detached);
        }
        self.state.set_loading(false);

        match result {
            Ok(values) => {
                let listings = ingest(values);
                let count = listings.len();
                self.state.replace(listings);
                self.state.set_error(None);
                log::info!("✅ {} listings loaded", count);
                Ok(count)
            }
            Err(e) => {
                log::error!("❌ Error loading listings: {}", e);
                Err(self.reject(e))
            }
        }
    }

    /// Creates a listing from `draft` and puts the server copy at the front.
    /// The draft is reset on success.
    pub async fn create(&self, draft: &mut ListingDraft) -> Result<Listing, MarketError> {
        draft.validate().map_err(|e| self.reject(e))?;

        let session = self.session.session();
        let Some(token) = session.token.clone() else {
            return Err(self.reject(MarketError::AuthRequired));
        };
        let owner = ListingOwner::for_role(session.role);
        let body = NewListing::from_draft(draft, owner, session.contact_hint());
        if body.contact.is_empty() {
            return Err(self.reject(MarketError::validation(
                "Please add a contact email or phone",
            )));
        }

        self.state.begin_mutation();
        let result = self.api.create_listing(&token, &body).await;
        self.state.end_mutation();

        let created = result.map_err(|e| self.reject(e))?;
        let listing = Listing::from_json(created).ok_or_else(|| {
            self.reject(MarketError::Decode(
                "the server returned an incomplete listing".to_string(),
            ))
        })?;

        draft.reset();
        if self.state.is_mounted() {
            self.state.prepend(listing.clone());
            self.state.set_error(None);
        }
        log::info!("✅ Listing {} created", listing.id);
        Ok(listing)
    }

    /// Sends only the fields in `patch`. Returns the merged record, or `None`
    /// when this view does not hold the listing.
    pub async fn update(
        &self,
        id: &str,
        patch: &ListingPatch,
    ) -> Result<Option<Listing>, MarketError> {
        patch.validate().map_err(|e| self.reject(e))?;
        let Some(token) = self.session.token() else {
            return Err(self.reject(MarketError::AuthRequired));
        };

        self.state.begin_mutation();
        let result = self.api.update_listing(&token, id, patch).await;
        self.state.end_mutation();

        let returned = result.map_err(|e| self.reject(e))?;
        let server = Listing::from_json(returned);

        if !self.state.is_mounted() || self.state.find(id).is_none() {
            return Ok(server);
        }
        let updated = self.state.modify(id, |listing| match server {
            Some(server) => listing.merge_from(server),
            None => patch.apply_to(listing),
        });
        log::info!("✅ Listing {} updated", id);
        Ok(updated)
    }

    /// Admin moderation: toggles the verified badge
    pub async fn set_verified(
        &self,
        id: &str,
        verified: bool,
    ) -> Result<Option<Listing>, MarketError> {
        self.update(id, &ListingPatch::verified(verified)).await
    }

    /// Deletes on the server, then locally. A 404 means it is already gone.
    pub async fn delete(&self, id: &str) -> Result<(), MarketError> {
        let Some(token) = self.session.token() else {
            return Err(self.reject(MarketError::AuthRequired));
        };

        self.state.begin_mutation();
        let result = self.api.delete_listing(&token, id).await;
        self.state.end_mutation();

        match result {
            Ok(()) => log::info!("🗑️ Listing {} deleted", id),
            Err(MarketError::Remote { status: 404, .. }) => {
                log::info!("ℹ️ Listing {} was already deleted", id)
            }
            Err(e) => return Err(self.reject(e)),
        }

        if self.state.is_mounted() {
            self.state.remove(id);
        }
        Ok(())
    }

    pub fn search(&self, query: &str) -> Vec<Listing> {
        let listings = self.state.listings.borrow();
        listing_filters::search(&listings, query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn filter_by_category(&self, tag: &str) -> Vec<Listing> {
        let listings = self.state.listings.borrow();
        listing_filters::filter_by_category(&listings, tag)
            .into_iter()
            .cloned()
            .collect()
    }

    /// The owning view is going away; late responses are ignored from now on
    pub fn teardown(&self) {
        self.state.detach();
    }

    /// Surfaces `error` to the view. A 401 also clears the session and asks
    /// for a new login.
    fn reject(&self, error: MarketError) -> MarketError {
        if error.is_session_expired() {
            self.session.expire_session();
            if self.state.is_mounted() {
                self.state.set_reauth_required(true);
            }
        }
        if self.state.is_mounted() {
            self.state.set_error(Some(error.user_message()));
        }
        error
    }
}
