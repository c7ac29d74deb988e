use thiserror::Error;

/// Every failure the marketplace core can surface to a view.
///
/// `Display` is the user-facing message. `Remote` shows the server message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Required fields missing, caught before any network call
    #[error("{0}")]
    Validation(String),

    /// A mutation was attempted without a session token
    #[error("Please log in to continue")]
    AuthRequired,

    /// The backend answered 401 to an authenticated call
    #[error("Your session has expired, please log in again")]
    SessionExpired,

    /// Any other non-2xx response
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The request never completed
    #[error("Network error: {0}")]
    Network(String),

    /// The response arrived but could not be understood
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The owning view was torn down before the result arrived
    #[error("View is no longer mounted")]
    Detached,

    /// A newer load on the same view replaced this one
    #[error("A newer load replaced this one")]
    Superseded,
}

impl MarketError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
