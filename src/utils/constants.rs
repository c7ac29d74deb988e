/// Persisted bearer token
pub const STORAGE_KEY_TOKEN: &str = "token";
/// Persisted role string (`advertiser` | `media_owner` | `admin`)
pub const STORAGE_KEY_ROLE: &str = "role";
/// Persisted JSON profile blob
pub const STORAGE_KEY_USER: &str = "user";

pub const SESSION_KEYS: [&str; 3] = [STORAGE_KEY_TOKEN, STORAGE_KEY_ROLE, STORAGE_KEY_USER];

/// Window event other parts of the page dispatch after login/logout
pub const AUTH_CHANGED_EVENT: &str = "authChanged";

pub const LISTINGS_PATH: &str = "/listings";
pub const MY_LISTINGS_PATH: &str = "/listings/mine";
pub const IDENTITY_PATH: &str = "/identity";
pub const LOGIN_PATH: &str = "/auth/login";
pub const SIGNUP_PATH: &str = "/auth/signup";
