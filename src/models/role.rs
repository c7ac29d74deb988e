use std::fmt;

use serde::{Deserialize, Serialize};

/// Business capacity a user acts under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Advertiser,
    MediaOwner,
    Admin,
}

impl Role {
    /// Parses a persisted or server-provided role. Anything outside the allowed set is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "advertiser" => Some(Self::Advertiser),
            "media_owner" => Some(Self::MediaOwner),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Reads a role out of an optional JSON string value
    pub fn from_json(value: Option<&serde_json::Value>) -> Option<Self> {
        value.and_then(|v| v.as_str()).and_then(Self::parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advertiser => "advertiser",
            Self::MediaOwner => "media_owner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
