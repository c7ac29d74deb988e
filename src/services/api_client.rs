// ============================================================================
// API CLIENT - HTTP only (stateless)
// ============================================================================
// No business rules here: build requests, normalise failures into MarketError
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{
    AuthResponse, Credentials, ListingPatch, ListingScope, MarketError, NewListing, SignupRequest,
};

/// Logical operations of the marketplace backend
#[async_trait(?Send)]
pub trait MarketApi {
    /// `GET /listings` or `GET /listings/mine`; raw records, envelope already removed
    async fn list_listings(
        &self,
        scope: ListingScope,
        token: Option<&str>,
    ) -> Result<Vec<Value>, MarketError>;

    /// `POST /listings`; the created record, envelope already removed
    async fn create_listing(&self, token: &str, listing: &NewListing)
        -> Result<Value, MarketError>;

    /// `PUT /listings/{id}`; the updated record (may be `Value::Null`)
    async fn update_listing(
        &self,
        token: &str,
        id: &str,
        patch: &ListingPatch,
    ) -> Result<Value, MarketError>;

    /// `DELETE /listings/{id}`
    async fn delete_listing(&self, token: &str, id: &str) -> Result<(), MarketError>;

    /// `GET /identity`
    async fn identity(&self, token: &str) -> Result<Value, MarketError>;

    /// `POST /auth/login`
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, MarketError>;

    /// `POST /auth/signup`
    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, MarketError>;
}

const MAX_PLAIN_MESSAGE_LEN: usize = 200;

/// Best human-readable message for a failed response
pub fn server_message(status: u16, status_text: &str, body: &str) -> String {
    let body = body.trim();
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let found = ["message", "error", "msg"]
            .iter()
            .filter_map(|key| json.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|message| !message.is_empty());
        if let Some(message) = found {
            return message.to_string();
        }
    } else if !body.is_empty() && body.len() <= MAX_PLAIN_MESSAGE_LEN && !body.starts_with('<') {
        return body.to_string();
    }
    format!("HTTP {}: {}", status, status_text)
}

/// 401 means the bearer token is no longer accepted; everything else is a remote error
pub fn status_error(status: u16, status_text: &str, body: &str) -> MarketError {
    if status == 401 {
        MarketError::SessionExpired
    } else {
        MarketError::Remote {
            status,
            message: server_message(status, status_text, body),
        }
    }
}

/// Parses a success body; an empty body is `Value::Null`
pub fn parse_body(body: &str) -> Result<Value, MarketError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| MarketError::Decode(e.to_string()))
}

/// Accepts a bare array or `{listings|data|items: [...]}`
pub fn listing_array(body: Value) -> Result<Vec<Value>, MarketError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => ["listings", "data", "items"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| MarketError::Decode("expected a list of listings".to_string())),
        _ => Err(MarketError::Decode("expected a list of listings".to_string())),
    }
}

/// Unwraps `{listing: {...}}` / `{data: {...}}`, otherwise returns the body as is
pub fn listing_object(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            for key in ["listing", "data"] {
                if matches!(map.get(key), Some(Value::Object(_))) {
                    if let Some(inner) = map.remove(key) {
                        return inner;
                    }
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(target_arch = "wasm32")]
pub use browser::ApiClient;

#[cfg(target_arch = "wasm32")]
mod browser {
    use async_trait::async_trait;
    use gloo_net::http::{Request, RequestBuilder, Response};
    use serde_json::Value;

    use super::{endpoint, listing_array, listing_object, parse_body, status_error, MarketApi};
    use crate::config::CONFIG;
    use crate::models::{
        AuthResponse, Credentials, ListingPatch, ListingScope, MarketError, NewListing,
        SignupRequest,
    };
    use crate::utils::{IDENTITY_PATH, LISTINGS_PATH, LOGIN_PATH, MY_LISTINGS_PATH, SIGNUP_PATH};

    /// `gloo-net` client for the marketplace backend
    #[derive(Clone)]
    pub struct ApiClient {
        base_url: String,
    }

    impl ApiClient {
        pub fn new() -> Self {
            Self::with_base_url(CONFIG.backend_url())
        }

        pub fn with_base_url(base_url: &str) -> Self {
            Self {
                base_url: base_url.to_string(),
            }
        }

        fn url(&self, path: &str) -> String {
            endpoint(&self.base_url, path)
        }

        fn listing_url(&self, id: &str) -> String {
            self.url(&format!("{}/{}", LISTINGS_PATH, id))
        }

        fn authorized(builder: RequestBuilder, token: &str) -> RequestBuilder {
            builder.header("Authorization", &format!("Bearer {}", token))
        }

        async fn read(response: Response) -> Result<Value, MarketError> {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if response.ok() {
                parse_body(&body)
            } else {
                Err(status_error(status, &response.status_text(), &body))
            }
        }

        async fn send(builder: RequestBuilder) -> Result<Value, MarketError> {
            let response = builder
                .send()
                .await
                .map_err(|e| MarketError::Network(e.to_string()))?;
            Self::read(response).await
        }

        async fn send_json<T: serde::Serialize>(
            builder: RequestBuilder,
            body: &T,
        ) -> Result<Value, MarketError> {
            let request = builder
                .json(body)
                .map_err(|e| MarketError::Decode(format!("serializing request: {}", e)))?;
            let response = request
                .send()
                .await
                .map_err(|e| MarketError::Network(e.to_string()))?;
            Self::read(response).await
        }

        fn auth_response(body: Value) -> Result<AuthResponse, MarketError> {
            serde_json::from_value(body).map_err(|e| MarketError::Decode(e.to_string()))
        }
    }

    impl Default for ApiClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait(?Send)]
    impl MarketApi for ApiClient {
        async fn list_listings(
            &self,
            scope: ListingScope,
            token: Option<&str>,
        ) -> Result<Vec<Value>, MarketError> {
            let builder = match scope {
                ListingScope::Public => Request::get(&self.url(LISTINGS_PATH)),
                ListingScope::Mine => Request::get(&self.url(MY_LISTINGS_PATH)),
            };
            let builder = match token {
                Some(token) => Self::authorized(builder, token),
                None => builder,
            };
            log::info!("📋 Fetching listings ({:?})", scope);
            listing_array(Self::send(builder).await?)
        }

        async fn create_listing(
            &self,
            token: &str,
            listing: &NewListing,
        ) -> Result<Value, MarketError> {
            log::info!("📝 Creating listing '{}'", listing.title);
            let builder = Self::authorized(Request::post(&self.url(LISTINGS_PATH)), token);
            Ok(listing_object(Self::send_json(builder, listing).await?))
        }

        async fn update_listing(
            &self,
            token: &str,
            id: &str,
            patch: &ListingPatch,
        ) -> Result<Value, MarketError> {
            log::info!("📝 Updating listing {}", id);
            let builder = Self::authorized(Request::put(&self.listing_url(id)), token);
            Ok(listing_object(Self::send_json(builder, patch).await?))
        }

        async fn delete_listing(&self, token: &str, id: &str) -> Result<(), MarketError> {
            log::info!("🗑️ Deleting listing {}", id);
            let builder = Self::authorized(Request::delete(&self.listing_url(id)), token);
            Self::send(builder).await.map(|_| ())
        }

        async fn identity(&self, token: &str) -> Result<Value, MarketError> {
            let builder = Self::authorized(Request::get(&self.url(IDENTITY_PATH)), token);
            Self::send(builder).await
        }

        async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, MarketError> {
            log::info!("🔐 Logging in {}", credentials.email);
            let body = Self::send_json(Request::post(&self.url(LOGIN_PATH)), credentials).await?;
            Self::auth_response(body)
        }

        async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, MarketError> {
            log::info!("🔐 Signing up {} as {}", request.email, request.role);
            let body = Self::send_json(Request::post(&self.url(SIGNUP_PATH)), request).await?;
            Self::auth_response(body)
        }
    }
}
