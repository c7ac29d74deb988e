#[cfg(test)]
pub mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use async_trait::async_trait;
    use futures::channel::oneshot;
    use serde_json::{json, Value};

    use crate::models::{
        AuthResponse, Credentials, ListingPatch, ListingScope, MarketError, NewListing,
        SignupRequest,
    };
    use crate::services::MarketApi;
    use crate::utils::{KeyValueStore, MemoryStore, STORAGE_KEY_ROLE, STORAGE_KEY_TOKEN};
    use crate::viewmodels::SessionResolver;

    type Gate<T> = oneshot::Receiver<Result<T, MarketError>>;

    /// In-memory backend. Listings live in `records`; create/update/identity/auth
    /// answers can be scripted; list and identity calls can be held open with a gate.
    #[derive(Default)]
    pub struct MockMarketApi {
        records: RefCell<Vec<Value>>,
        list_error: RefCell<Option<MarketError>>,
        list_gates: RefCell<VecDeque<Gate<Vec<Value>>>>,
        create_response: RefCell<Option<Result<Value, MarketError>>>,
        update_response: RefCell<Option<Result<Value, MarketError>>>,
        delete_error: RefCell<Option<MarketError>>,
        identity_response: RefCell<Option<Result<Value, MarketError>>>,
        identity_gate: RefCell<Option<Gate<Value>>>,
        mutation_gate: RefCell<Option<oneshot::Receiver<()>>>,
        auth_response: RefCell<Option<Result<AuthResponse, MarketError>>>,
        calls: RefCell<Vec<String>>,
        last_token: RefCell<Option<String>>,
        last_new_listing: RefCell<Option<NewListing>>,
        last_patch: RefCell<Option<ListingPatch>>,
        next_id: RefCell<u32>,
    }

    impl MockMarketApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_records(records: Vec<Value>) -> Self {
            let api = Self::new();
            *api.records.borrow_mut() = records;
            api
        }

        pub fn set_list_error(&self, error: Option<MarketError>) {
            *self.list_error.borrow_mut() = error;
        }

        /// Holds the next list call open until the sender fires
        pub fn gate_list(&self) -> oneshot::Sender<Result<Vec<Value>, MarketError>> {
            let (tx, rx) = oneshot::channel();
            self.list_gates.borrow_mut().push_back(rx);
            tx
        }

        pub fn set_create(&self, response: Result<Value, MarketError>) {
            *self.create_response.borrow_mut() = Some(response);
        }

        pub fn set_update(&self, response: Result<Value, MarketError>) {
            *self.update_response.borrow_mut() = Some(response);
        }

        pub fn set_delete_error(&self, error: Option<MarketError>) {
            *self.delete_error.borrow_mut() = error;
        }

        pub fn set_identity(&self, response: Result<Value, MarketError>) {
            *self.identity_response.borrow_mut() = Some(response);
        }

        /// Holds the next identity call open until the sender fires
        pub fn gate_identity(&self) -> oneshot::Sender<Result<Value, MarketError>> {
            let (tx, rx) = oneshot::channel();
            *self.identity_gate.borrow_mut() = Some(rx);
            tx
        }

        /// Holds the next create/update/delete open until the sender fires
        pub fn gate_mutation(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            *self.mutation_gate.borrow_mut() = Some(rx);
            tx
        }

        pub fn set_auth(&self, response: Result<AuthResponse, MarketError>) {
            *self.auth_response.borrow_mut() = Some(response);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn last_token(&self) -> Option<String> {
            self.last_token.borrow().clone()
        }

        pub fn last_new_listing(&self) -> Option<NewListing> {
            self.last_new_listing.borrow().clone()
        }

        pub fn last_patch(&self) -> Option<ListingPatch> {
            self.last_patch.borrow().clone()
        }

        pub fn record_count(&self) -> usize {
            self.records.borrow().len()
        }

        fn record(&self, call: String, token: Option<&str>) {
            self.calls.borrow_mut().push(call);
            *self.last_token.borrow_mut() = token.map(str::to_string);
        }

        async fn hold_mutation(&self) {
            let gate = self.mutation_gate.borrow_mut().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
        }
    }

    async fn wait_gate<T>(gate: Gate<T>) -> Result<T, MarketError> {
        gate.await
            .unwrap_or_else(|_| Err(MarketError::Network("gate dropped".to_string())))
    }

    #[async_trait(?Send)]
    impl MarketApi for MockMarketApi {
        async fn list_listings(
            &self,
            scope: ListingScope,
            token: Option<&str>,
        ) -> Result<Vec<Value>, MarketError> {
            let call = match scope {
                ListingScope::Public => "list",
                ListingScope::Mine => "list_mine",
            };
            self.record(call.to_string(), token);

            let gate = self.list_gates.borrow_mut().pop_front();
            if let Some(gate) = gate {
                return wait_gate(gate).await;
            }
            if let Some(error) = self.list_error.borrow().clone() {
                return Err(error);
            }
            Ok(self.records.borrow().clone())
        }

        async fn create_listing(
            &self,
            token: &str,
            listing: &NewListing,
        ) -> Result<Value, MarketError> {
            self.record("create".to_string(), Some(token));
            *self.last_new_listing.borrow_mut() = Some(listing.clone());
            self.hold_mutation().await;

            let scripted = self.create_response.borrow_mut().take();
            let created = match scripted {
                Some(response) => response?,
                None => {
                    let mut next_id = self.next_id.borrow_mut();
                    *next_id += 1;
                    let mut body = serde_json::to_value(listing)
                        .map_err(|e| MarketError::Decode(e.to_string()))?;
                    body["id"] = json!(format!("L{}", *next_id));
                    body
                }
            };
            self.records.borrow_mut().insert(0, created.clone());
            Ok(created)
        }

        async fn update_listing(
            &self,
            token: &str,
            id: &str,
            patch: &ListingPatch,
        ) -> Result<Value, MarketError> {
            self.record(format!("update:{}", id), Some(token));
            *self.last_patch.borrow_mut() = Some(patch.clone());
            self.hold_mutation().await;
            self.update_response
                .borrow()
                .clone()
                .unwrap_or(Ok(Value::Null))
        }

        async fn delete_listing(&self, token: &str, id: &str) -> Result<(), MarketError> {
            self.record(format!("delete:{}", id), Some(token));
            self.hold_mutation().await;
            if let Some(error) = self.delete_error.borrow().clone() {
                return Err(error);
            }
            let mut records = self.records.borrow_mut();
            let before = records.len();
            records.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
            if records.len() == before {
                return Err(MarketError::Remote {
                    status: 404,
                    message: "Listing not found".to_string(),
                });
            }
            Ok(())
        }

        async fn identity(&self, token: &str) -> Result<Value, MarketError> {
            self.record("identity".to_string(), Some(token));
            let gate = self.identity_gate.borrow_mut().take();
            if let Some(gate) = gate {
                return wait_gate(gate).await;
            }
            self.identity_response
                .borrow()
                .clone()
                .unwrap_or_else(|| Err(MarketError::Network("no identity scripted".to_string())))
        }

        async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, MarketError> {
            self.record("login".to_string(), None);
            self.auth_response
                .borrow()
                .clone()
                .unwrap_or_else(|| Err(MarketError::Network("no auth scripted".to_string())))
        }

        async fn signup(&self, _request: &SignupRequest) -> Result<AuthResponse, MarketError> {
            self.record("signup".to_string(), None);
            self.auth_response
                .borrow()
                .clone()
                .unwrap_or_else(|| Err(MarketError::Network("no auth scripted".to_string())))
        }
    }

    /// Resolver over `store`, returning the mock so tests can script and inspect it
    pub fn resolver_with(
        store: MemoryStore,
        api: MockMarketApi,
    ) -> (SessionResolver, Rc<MockMarketApi>) {
        let api = Rc::new(api);
        let resolver = SessionResolver::new(Rc::new(store), api.clone());
        (resolver, api)
    }

    pub fn logged_in_store(role: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store.set(STORAGE_KEY_TOKEN, "valid-token").unwrap();
        store.set(STORAGE_KEY_ROLE, role).unwrap();
        store
    }

    pub fn listing_json(id: &str, title: &str, location: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "location": location,
            "description": format!("{} in {}", title, location),
            "seeking": "",
            "contact": "owner@barter.in",
            "verified": false,
            "ownerRole": "media_owner",
            "type": "Available Barters"
        })
    }
}
