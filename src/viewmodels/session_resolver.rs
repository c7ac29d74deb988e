// ============================================================================
// SESSION RESOLVER - single owner of token / role / profile
// ============================================================================
// Local sources answer immediately; the backend identity call corrects them in
// the background. Views read snapshots, subscribe to role changes and may ask
// for a logout, nothing else.
// ============================================================================

use std::rc::Rc;

use serde_json::Value;

use crate::models::{AuthResponse, Credentials, MarketError, Role, Session, SignupRequest};
use crate::services::MarketApi;
use crate::state::{AuthState, Subscription};
use crate::utils::jwt;
use crate::utils::{
    load_json, store_json, KeyValueStore, SESSION_KEYS, STORAGE_KEY_ROLE, STORAGE_KEY_TOKEN,
    STORAGE_KEY_USER,
};

/// Cheap to clone; clones share storage, API client and subscribers
#[derive(Clone)]
pub struct SessionResolver {
    store: Rc<dyn KeyValueStore>,
    api: Rc<dyn MarketApi>,
    state: AuthState,
}

impl SessionResolver {
    pub fn new(store: Rc<dyn KeyValueStore>, api: Rc<dyn MarketApi>) -> Self {
        let resolver = Self {
            store,
            api,
            state: AuthState::new(),
        };
        resolver.state.set_role(resolver.resolve_role_once());
        resolver
    }

    /// Persisted bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.store
            .get(STORAGE_KEY_TOKEN)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    fn profile(&self) -> Option<Value> {
        load_json::<Value>(&*self.store, STORAGE_KEY_USER).filter(Value::is_object)
    }

    /// Role from local sources only, in priority order: the `role` key, the
    /// profile blob, the token's own claim. No token means no role.
    pub fn resolve_role_once(&self) -> Option<Role> {
        let token = self.token()?;

        if let Some(role) = self.store.get(STORAGE_KEY_ROLE).as_deref().and_then(Role::parse) {
            return Some(role);
        }
        if let Some(role) = self.profile().and_then(|p| Role::from_json(p.get("role"))) {
            return Some(role);
        }
        jwt::role_claim(&token)
    }

    /// Best role known right now; never waits on the network
    pub fn current_role(&self) -> Option<Role> {
        self.resolve_role_once()
    }

    pub fn session(&self) -> Session {
        match self.token() {
            Some(token) => Session {
                token: Some(token),
                role: self.resolve_role_once(),
                profile: self.profile(),
            },
            None => Session::default(),
        }
    }

    /// Subscribes to role changes until the subscription is dropped
    pub fn on_role_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<Role>) + 'static,
    {
        self.state.role_changed.subscribe(callback)
    }

    /// Re-resolves from storage and tells every subscriber. Called when another
    /// tab or another part of the page changed the session.
    pub fn notify_changed(&self) {
        let role = self.resolve_role_once();
        self.state.publish(role);
    }

    /// Asks the backend who we are and adopts its role. A 401 expires the
    /// session; any other failure keeps the local state as it is.
    pub async fn refresh_from_server(&self) {
        let Some(token) = self.token() else {
            return;
        };

        let body = match self.api.identity(&token).await {
            Ok(body) => body,
            Err(e) if e.is_session_expired() => {
                // a 401 for a token already replaced says nothing about the new one
                if self.token().as_deref() == Some(token.as_str()) {
                    self.expire_session();
                }
                return;
            }
            Err(e) => {
                log::warn!("⚠️ Role refresh failed, keeping local role: {}", e);
                return;
            }
        };

        if self.token().as_deref() != Some(token.as_str()) {
            log::info!("⏭️ Session changed during role refresh, discarding response");
            return;
        }

        let user = body.get("user").filter(|u| u.is_object()).cloned();
        let role = Role::from_json(body.get("role"))
            .or_else(|| Role::from_json(user.as_ref().and_then(|u| u.get("role"))));
        let Some(role) = role else {
            log::warn!("⚠️ Identity response carried no usable role");
            return;
        };

        if let Err(e) = self.store.set(STORAGE_KEY_ROLE, role.as_str()) {
            log::warn!("⚠️ Could not persist refreshed role: {}", e);
        }
        if let Some(user) = &user {
            if let Err(e) = store_json(&*self.store, STORAGE_KEY_USER, user) {
                log::warn!("⚠️ Could not persist refreshed profile: {}", e);
            }
        }

        if self.state.get_role() != Some(role) {
            log::info!("✅ Role updated from server: {}", role);
            self.state.publish(Some(role));
        }
    }

    /// Fire-and-forget [`refresh_from_server`](Self::refresh_from_server)
    #[cfg(target_arch = "wasm32")]
    pub fn spawn_refresh(&self) {
        let resolver = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            resolver.refresh_from_server().await;
        });
    }

    /// Persists a login/signup result and broadcasts the new role
    pub fn establish(&self, response: AuthResponse) -> Result<Session, MarketError> {
        let token = response
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                MarketError::validation(
                    response
                        .message
                        .clone()
                        .unwrap_or_else(|| "Login response did not include a token".to_string()),
                )
            })?;

        self.clear();
        let persisted = self.persist(token, response.resolved_role(), response.user.as_ref());
        if let Err(e) = persisted {
            log::error!("❌ Could not persist session: {}", e);
            self.clear();
            self.state.publish(None);
            return Err(e);
        }

        let role = self.resolve_role_once();
        log::info!("✅ Session established ({})", role.map(|r| r.as_str()).unwrap_or("no role"));
        self.state.publish(role);
        Ok(self.session())
    }

    fn persist(&self, token: &str, role: Option<Role>, user: Option<&Value>) -> Result<(), MarketError> {
        self.store.set(STORAGE_KEY_TOKEN, token)?;
        if let Some(role) = role {
            self.store.set(STORAGE_KEY_ROLE, role.as_str())?;
        }
        if let Some(user) = user {
            store_json(&*self.store, STORAGE_KEY_USER, user)?;
        }
        Ok(())
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, MarketError> {
        let response = self.api.login(credentials).await?;
        self.establish(response)
    }

    pub async fn sign_up(&self, request: &SignupRequest) -> Result<Session, MarketError> {
        let response = self.api.signup(request).await?;
        self.establish(response)
    }

    /// Clears token, role and profile, then broadcasts `None`
    pub fn logout(&self) {
        self.clear();
        log::info!("👋 Logged out");
        self.state.publish(None);
    }

    /// The 401 path: same as logout, the view then asks the user to log in again
    pub fn expire_session(&self) {
        log::warn!("⏰ Session expired, clearing local session");
        self.clear();
        self.state.publish(None);
    }

    // Token goes first: without it the other keys already read as absent.
    fn clear(&self) {
        for key in SESSION_KEYS {
            self.store.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{resolver_with, MockMarketApi};
    use crate::utils::jwt::token_with_claims;
    use crate::utils::MemoryStore;
    use futures::channel::oneshot;
    use serde_json::json;
    use std::cell::RefCell;

    fn store_with(entries: &[(&str, &str)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (key, value) in entries {
            store.set(key, value).unwrap();
        }
        store
    }

    fn recorder(resolver: &SessionResolver) -> (Rc<RefCell<Vec<Option<Role>>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let subscription = resolver.on_role_changed({
            let seen = seen.clone();
            move |role| seen.borrow_mut().push(role)
        });
        (seen, subscription)
    }

    #[test]
    fn test_no_token_means_no_role_whatever_is_cached() {
        let claims_token = token_with_claims(&json!({ "role": "admin" }));
        let store = store_with(&[
            (STORAGE_KEY_ROLE, "admin"),
            (STORAGE_KEY_USER, r#"{"role":"media_owner","email":"x@y.in"}"#),
        ]);
        let (resolver, _) = resolver_with(store.clone(), MockMarketApi::new());
        assert_eq!(resolver.resolve_role_once(), None);
        assert_eq!(resolver.session(), Session::default());

        // a blank token counts as absent too
        store.set(STORAGE_KEY_TOKEN, "  ").unwrap();
        assert_eq!(resolver.resolve_role_once(), None);

        store.set(STORAGE_KEY_TOKEN, &claims_token).unwrap();
        assert_eq!(resolver.resolve_role_once(), Some(Role::Admin));
    }

    #[test]
    fn test_each_source_alone_resolves() {
        let direct = store_with(&[(STORAGE_KEY_TOKEN, "opaque"), (STORAGE_KEY_ROLE, "advertiser")]);
        let (resolver, _) = resolver_with(direct, MockMarketApi::new());
        assert_eq!(resolver.resolve_role_once(), Some(Role::Advertiser));

        let profile = store_with(&[
            (STORAGE_KEY_TOKEN, "opaque"),
            (STORAGE_KEY_USER, r#"{"role":"media_owner"}"#),
        ]);
        let (resolver, _) = resolver_with(profile, MockMarketApi::new());
        assert_eq!(resolver.resolve_role_once(), Some(Role::MediaOwner));

        let token = token_with_claims(&json!({ "role": "admin" }));
        let claim = store_with(&[(STORAGE_KEY_TOKEN, token.as_str())]);
        let (resolver, _) = resolver_with(claim, MockMarketApi::new());
        assert_eq!(resolver.resolve_role_once(), Some(Role::Admin));
    }

    #[test]
    fn test_malformed_sources_fall_through() {
        let token = token_with_claims(&json!({ "role": "media_owner" }));
        let store = store_with(&[
            (STORAGE_KEY_TOKEN, token.as_str()),
            (STORAGE_KEY_ROLE, "superuser"),
            (STORAGE_KEY_USER, "{corrupt"),
        ]);
        let (resolver, _) = resolver_with(store, MockMarketApi::new());
        assert_eq!(resolver.resolve_role_once(), Some(Role::MediaOwner));

        let nothing = store_with(&[
            (STORAGE_KEY_TOKEN, "not.a-jwt"),
            (STORAGE_KEY_USER, r#"["role","admin"]"#),
        ]);
        let (resolver, _) = resolver_with(nothing, MockMarketApi::new());
        assert_eq!(resolver.resolve_role_once(), None);
    }

    #[test]
    fn test_direct_role_beats_profile_and_claim() {
        let token = token_with_claims(&json!({ "role": "admin" }));
        let store = store_with(&[
            (STORAGE_KEY_TOKEN, token.as_str()),
            (STORAGE_KEY_ROLE, "advertiser"),
            (STORAGE_KEY_USER, r#"{"role":"media_owner"}"#),
        ]);
        let (resolver, _) = resolver_with(store.clone(), MockMarketApi::new());
        assert_eq!(resolver.resolve_role_once(), Some(Role::Advertiser));

        store.remove(STORAGE_KEY_ROLE);
        assert_eq!(resolver.resolve_role_once(), Some(Role::MediaOwner));
    }

    #[tokio::test]
    async fn test_refresh_adopts_server_role_and_notifies_once() {
        let store = store_with(&[(STORAGE_KEY_TOKEN, "t1"), (STORAGE_KEY_ROLE, "advertiser")]);
        let api = MockMarketApi::new();
        api.set_identity(Ok(json!({ "user": { "role": "media_owner", "email": "m@o.in" } })));
        let (resolver, api) = resolver_with(store.clone(), api);
        let (seen_a, _a) = recorder(&resolver);
        let (seen_b, _b) = recorder(&resolver);

        resolver.refresh_from_server().await;

        assert_eq!(store.get(STORAGE_KEY_ROLE).as_deref(), Some("media_owner"));
        assert_eq!(resolver.current_role(), Some(Role::MediaOwner));
        assert_eq!(resolver.session().contact_hint().as_deref(), Some("m@o.in"));
        assert_eq!(*seen_a.borrow(), vec![Some(Role::MediaOwner)]);
        assert_eq!(*seen_b.borrow(), vec![Some(Role::MediaOwner)]);
        assert_eq!(api.last_token().as_deref(), Some("t1"));

        // same answer again: nothing changed, nothing broadcast
        resolver.refresh_from_server().await;
        assert_eq!(seen_a.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_local_state() {
        let store = store_with(&[(STORAGE_KEY_TOKEN, "t1"), (STORAGE_KEY_ROLE, "advertiser")]);
        let api = MockMarketApi::new();
        api.set_identity(Err(MarketError::Network("offline".into())));
        let (resolver, _api) = resolver_with(store.clone(), api);
        let (seen, _sub) = recorder(&resolver);

        resolver.refresh_from_server().await;
        assert_eq!(resolver.current_role(), Some(Role::Advertiser));
        assert_eq!(store.get(STORAGE_KEY_TOKEN).as_deref(), Some("t1"));
        assert!(seen.borrow().is_empty());

        let api = MockMarketApi::new();
        api.set_identity(Ok(json!({ "role": "wizard" })));
        let (resolver, _api) = resolver_with(store.clone(), api);
        resolver.refresh_from_server().await;
        assert_eq!(store.get(STORAGE_KEY_ROLE).as_deref(), Some("advertiser"));
    }

    #[tokio::test]
    async fn test_refresh_401_expires_the_session() {
        let store = store_with(&[
            (STORAGE_KEY_TOKEN, "t1"),
            (STORAGE_KEY_ROLE, "admin"),
            (STORAGE_KEY_USER, r#"{"email":"a@b.com"}"#),
        ]);
        let api = MockMarketApi::new();
        api.set_identity(Err(MarketError::SessionExpired));
        let (resolver, _api) = resolver_with(store.clone(), api);
        let (seen, _sub) = recorder(&resolver);

        resolver.refresh_from_server().await;

        assert!(store.is_empty());
        assert_eq!(resolver.current_role(), None);
        assert_eq!(*seen.borrow(), vec![None]);
    }

    #[tokio::test]
    async fn test_refresh_401_for_a_replaced_token_keeps_new_session() {
        let store = store_with(&[(STORAGE_KEY_TOKEN, "t1"), (STORAGE_KEY_ROLE, "advertiser")]);
        let api = MockMarketApi::new();
        let gate = api.gate_identity();
        let (resolver, _api) = resolver_with(store.clone(), api);

        futures::future::join(resolver.refresh_from_server(), async {
            store.set(STORAGE_KEY_TOKEN, "t2").unwrap();
            store.set(STORAGE_KEY_ROLE, "media_owner").unwrap();
            gate.send(Err(MarketError::SessionExpired)).unwrap();
        })
        .await;

        assert_eq!(store.get(STORAGE_KEY_TOKEN).as_deref(), Some("t2"));
        assert_eq!(resolver.current_role(), Some(Role::MediaOwner));
    }

    #[tokio::test]
    async fn test_refresh_without_token_makes_no_call() {
        let (resolver, api) = resolver_with(MemoryStore::new(), MockMarketApi::new());
        resolver.refresh_from_server().await;
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_local_role_is_available_while_refresh_is_pending() {
        let store = store_with(&[(STORAGE_KEY_TOKEN, "t1"), (STORAGE_KEY_ROLE, "advertiser")]);
        let api = MockMarketApi::new();
        let gate: oneshot::Sender<Result<Value, MarketError>> = api.gate_identity();
        let (resolver, _api) = resolver_with(store, api);

        let observed = futures::future::join(resolver.refresh_from_server(), async {
            let during = resolver.current_role();
            gate.send(Ok(json!({ "role": "admin" }))).unwrap();
            during
        })
        .await
        .1;

        assert_eq!(observed, Some(Role::Advertiser));
        assert_eq!(resolver.current_role(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_refresh_discarded_when_session_changes_mid_flight() {
        let store = store_with(&[(STORAGE_KEY_TOKEN, "t1"), (STORAGE_KEY_ROLE, "advertiser")]);
        let api = MockMarketApi::new();
        let gate = api.gate_identity();
        let (resolver, _api) = resolver_with(store.clone(), api);

        futures::future::join(resolver.refresh_from_server(), async {
            resolver.logout();
            gate.send(Ok(json!({ "role": "admin" }))).unwrap();
        })
        .await;

        assert_eq!(store.get(STORAGE_KEY_ROLE), None);
        assert_eq!(resolver.current_role(), None);
    }

    #[test]
    fn test_logout_clears_everything_and_broadcasts() {
        let store = store_with(&[
            (STORAGE_KEY_TOKEN, "t1"),
            (STORAGE_KEY_ROLE, "admin"),
            (STORAGE_KEY_USER, r#"{"name":"Ravi"}"#),
        ]);
        let (resolver, _) = resolver_with(store.clone(), MockMarketApi::new());
        let (seen, _sub) = recorder(&resolver);

        resolver.logout();
        assert!(store.is_empty());
        assert_eq!(*seen.borrow(), vec![None]);
        assert!(!resolver.session().is_logged_in());
    }

    #[test]
    fn test_dropped_subscription_stops_notifications() {
        let store = store_with(&[(STORAGE_KEY_TOKEN, "t1")]);
        let (resolver, _) = resolver_with(store, MockMarketApi::new());
        let (seen, subscription) = recorder(&resolver);
        drop(subscription);
        resolver.logout();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_notify_changed_picks_up_writes_from_another_tab() {
        let store = MemoryStore::new();
        let (resolver, _) = resolver_with(store.clone(), MockMarketApi::new());
        let (seen, _sub) = recorder(&resolver);

        store.set(STORAGE_KEY_TOKEN, "from-other-tab").unwrap();
        store.set(STORAGE_KEY_ROLE, "media_owner").unwrap();
        resolver.notify_changed();

        assert_eq!(*seen.borrow(), vec![Some(Role::MediaOwner)]);
    }

    #[test]
    fn test_establish_persists_login_response() {
        let store = store_with(&[(STORAGE_KEY_ROLE, "admin")]);
        let (resolver, _) = resolver_with(store.clone(), MockMarketApi::new());
        let (seen, _sub) = recorder(&resolver);

        let session = resolver
            .establish(AuthResponse {
                token: Some("fresh".into()),
                role: None,
                user: Some(json!({ "role": "advertiser", "email": "a@b.com" })),
                message: None,
            })
            .unwrap();

        assert_eq!(session.token.as_deref(), Some("fresh"));
        assert_eq!(session.role, Some(Role::Advertiser));
        assert_eq!(store.get(STORAGE_KEY_ROLE).as_deref(), Some("advertiser"));
        assert_eq!(*seen.borrow(), vec![Some(Role::Advertiser)]);
    }

    #[test]
    fn test_establish_without_token_changes_nothing() {
        let store = store_with(&[(STORAGE_KEY_TOKEN, "old"), (STORAGE_KEY_ROLE, "admin")]);
        let (resolver, _) = resolver_with(store.clone(), MockMarketApi::new());

        let err = resolver
            .establish(AuthResponse {
                message: Some("Invalid OTP".into()),
                ..AuthResponse::default()
            })
            .unwrap_err();

        assert_eq!(err, MarketError::Validation("Invalid OTP".into()));
        assert_eq!(store.get(STORAGE_KEY_TOKEN).as_deref(), Some("old"));
        assert_eq!(resolver.current_role(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_sign_in_and_sign_up_go_through_the_backend() {
        let api = MockMarketApi::new();
        api.set_auth(Ok(AuthResponse {
            token: Some("tok".into()),
            role: Some("media_owner".into()),
            ..AuthResponse::default()
        }));
        let (resolver, api) = resolver_with(MemoryStore::new(), api);

        let session = resolver
            .sign_in(&Credentials {
                email: "m@o.in".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.role, Some(Role::MediaOwner));

        api.set_auth(Err(MarketError::Remote {
            status: 409,
            message: "Email already registered".into(),
        }));
        let err = resolver
            .sign_up(&SignupRequest {
                name: "Meera".into(),
                email: "m@o.in".into(),
                password: "secret".into(),
                role: Role::MediaOwner,
                phone: None,
                company: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Email already registered");
        assert_eq!(resolver.token().as_deref(), Some("tok"));
        assert_eq!(api.calls(), vec!["login".to_string(), "signup".to_string()]);
    }
}
