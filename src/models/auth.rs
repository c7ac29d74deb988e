use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Role;

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Login/signup response. The role may sit at the top level or inside `user`.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    pub fn resolved_role(&self) -> Option<Role> {
        self.role
            .as_deref()
            .and_then(Role::parse)
            .or_else(|| Role::from_json(self.user.as_ref().and_then(|u| u.get("role"))))
    }
}

/// Read-only snapshot of the caller's authentication state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<Role>,
    pub profile: Option<Value>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Contact to use when a draft leaves it empty: profile email, then phone
    pub fn contact_hint(&self) -> Option<String> {
        let profile = self.profile.as_ref()?;
        ["email", "phone"]
            .iter()
            .filter_map(|key| profile.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }
}
